// ==========================================
// 晚宴分桌系统 - 约束放宽
// ==========================================
// 职责: 最后手段。对原阈值下没有任何相容房屋的客人，逐级降低间隔阈值
// 红线: 永不同桌集合永不放宽
// 红线: 原阈值下仍有相容房屋的客人跳过（留给人工或重跑）
// ==========================================

use crate::domain::assignment::RelaxedPlacement;
use crate::engine::context::SeatingContext;
use tracing::{debug, instrument, warn};

// ==========================================
// ConstraintRelaxationPass - 约束放宽
// ==========================================
pub struct ConstraintRelaxationPass {
    /// 降序放宽阶梯（均严格低于原阈值）
    steps: Vec<i64>,
}

impl ConstraintRelaxationPass {
    /// # 参数
    /// - `steps`: 已过滤的放宽阶梯（见 ControlVariables::effective_relaxation_steps）
    pub fn new(steps: Vec<i64>) -> Self {
        Self { steps }
    }

    /// 执行放宽
    ///
    /// # 返回
    /// 放宽后落座的记录（含使用的阈值）
    #[instrument(skip_all, fields(unseated = ctx.unseated_count(), steps = ?self.steps))]
    pub fn run(&self, ctx: &mut SeatingContext) -> Vec<RelaxedPlacement> {
        let mut placements = Vec::new();

        for code in ctx.unseated_guests() {
            if !ctx.compatible_houses(&code).is_empty() {
                debug!(code = %code, "原阈值下仍有相容房屋，跳过放宽");
                continue;
            }

            for &threshold in &self.steps {
                let house = ctx.compatible_houses_at(&code, threshold).into_iter().next();
                if let Some(house) = house {
                    ctx.seat(house, &code);
                    let house_id = ctx.houses[house].id;
                    warn!(
                        code = %code,
                        house_id,
                        threshold,
                        original = ctx.threshold,
                        "放宽间隔阈值后落座"
                    );
                    placements.push(RelaxedPlacement {
                        code: code.clone(),
                        house_id,
                        threshold_months: threshold,
                    });
                    break;
                }
            }
        }

        placements
    }
}
