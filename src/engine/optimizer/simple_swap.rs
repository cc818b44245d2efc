use crate::engine::context::SeatingContext;
use tracing::debug;

// ==========================================
// SimpleSwap - 简单置换
// ==========================================
// 未落座客人替换某房屋的非主人成员，被替换者移到另一房屋
pub struct SimpleSwap {}

/// 一次三方移动: guest 进入 house，evicted 移到 destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SwapMove {
    pub house: usize,
    pub evicted: String,
    pub destination: usize,
}

impl SimpleSwap {
    pub fn new() -> Self {
        Self {}
    }

    /// # 返回
    /// 本策略落座的人数
    pub fn run(&self, ctx: &mut SeatingContext) -> usize {
        let mut seated = 0;

        for code in ctx.unseated_guests() {
            if let Some(mv) = find_swap(ctx, &code) {
                debug!(
                    code = %code,
                    house_id = ctx.houses[mv.house].id,
                    evicted = %mv.evicted,
                    destination = ctx.houses[mv.destination].id,
                    "简单置换"
                );
                apply_swap(ctx, &code, &mv);
                seated += 1;
            }
        }

        seated
    }
}

impl Default for SimpleSwap {
    fn default() -> Self {
        Self::new()
    }
}

/// 查找 code 的简单置换（或容量合并时限定被替换者条件）
pub(crate) fn find_swap(ctx: &SeatingContext, code: &str) -> Option<SwapMove> {
    find_swap_where(ctx, code, |_, _| true)
}

pub(crate) fn find_swap_where<F>(ctx: &SeatingContext, code: &str, accept: F) -> Option<SwapMove>
where
    F: Fn(usize, &str) -> bool,
{
    let threshold = ctx.threshold;
    let houses: Vec<usize> = ctx.active_houses().collect();

    for &house in &houses {
        for evicted in ctx.movable_members(house) {
            if !accept(house, &evicted) || !ctx.fits_in_place_of(house, &evicted, code, threshold) {
                continue;
            }
            let destination = houses
                .iter()
                .copied()
                .find(|k| *k != house && ctx.fits(*k, &evicted, threshold));
            if let Some(destination) = destination {
                return Some(SwapMove {
                    house,
                    evicted,
                    destination,
                });
            }
        }
    }

    None
}

pub(crate) fn apply_swap(ctx: &mut SeatingContext, code: &str, mv: &SwapMove) {
    ctx.unseat(mv.house, &mv.evicted);
    ctx.seat(mv.house, code);
    ctx.seat(mv.destination, &mv.evicted);
}
