use crate::engine::context::SeatingContext;
use tracing::debug;

// ==========================================
// DirectInsertion - 直接补位
// ==========================================
// 首轮落座后仍有完全相容空位的客人，直接放入表格中最靠前的该房屋
pub struct DirectInsertion {}

impl DirectInsertion {
    pub fn new() -> Self {
        Self {}
    }

    /// # 返回
    /// 本策略落座的人数
    pub fn run(&self, ctx: &mut SeatingContext) -> usize {
        let mut seated = 0;

        for code in ctx.unseated_guests() {
            if let Some(&house) = ctx.compatible_houses(&code).first() {
                debug!(code = %code, house_id = ctx.houses[house].id, "直接补位");
                ctx.seat(house, &code);
                seated += 1;
            }
        }

        seated
    }
}

impl Default for DirectInsertion {
    fn default() -> Self {
        Self::new()
    }
}
