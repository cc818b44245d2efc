use crate::engine::context::SeatingContext;
use tracing::debug;

// ==========================================
// ChainSwap - 链式置换
// ==========================================
// 未落座客人进入目标房屋，挤出阻碍成员；阻碍成员转入第三个房屋。
// 第三个房屋没有空间时，再挤出其中一位成员转入第四个房屋（深度 2）。
pub struct ChainSwap {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChainMove {
    target: usize,
    blocker: String,
    second: usize,
    /// 深度 2: (被挤出的成员, 去向房屋)
    displaced: Option<(String, usize)>,
}

impl ChainSwap {
    pub fn new() -> Self {
        Self {}
    }

    /// # 返回
    /// 本策略落座的人数
    pub fn run(&self, ctx: &mut SeatingContext) -> usize {
        let mut seated = 0;

        for code in ctx.unseated_guests() {
            let Some(mv) = self.find_chain(ctx, &code) else {
                continue;
            };

            debug!(
                code = %code,
                house_id = ctx.houses[mv.target].id,
                blocker = %mv.blocker,
                second_house = ctx.houses[mv.second].id,
                depth = if mv.displaced.is_some() { 2 } else { 1 },
                "链式置换"
            );

            ctx.unseat(mv.target, &mv.blocker);
            ctx.seat(mv.target, &code);
            if let Some((displaced, last)) = &mv.displaced {
                ctx.unseat(mv.second, displaced);
                ctx.seat(mv.second, &mv.blocker);
                ctx.seat(*last, displaced);
            } else {
                ctx.seat(mv.second, &mv.blocker);
            }
            seated += 1;
        }

        seated
    }

    fn find_chain(&self, ctx: &SeatingContext, code: &str) -> Option<ChainMove> {
        let threshold = ctx.threshold;
        let houses: Vec<usize> = ctx.active_houses().collect();

        // 深度 1
        for &target in &houses {
            for blocker in ctx.movable_members(target) {
                if !ctx.fits_in_place_of(target, &blocker, code, threshold) {
                    continue;
                }
                if let Some(second) = houses
                    .iter()
                    .copied()
                    .find(|k| *k != target && ctx.fits(*k, &blocker, threshold))
                {
                    return Some(ChainMove {
                        target,
                        blocker,
                        second,
                        displaced: None,
                    });
                }
            }
        }

        // 深度 2
        for &target in &houses {
            for blocker in ctx.movable_members(target) {
                if !ctx.fits_in_place_of(target, &blocker, code, threshold) {
                    continue;
                }
                for &second in houses.iter().filter(|k| **k != target) {
                    for displaced in ctx.movable_members(second) {
                        if !ctx.fits_in_place_of(second, &displaced, &blocker, threshold) {
                            continue;
                        }
                        let last = houses.iter().copied().find(|l| {
                            *l != target && *l != second && ctx.fits(*l, &displaced, threshold)
                        });
                        if let Some(last) = last {
                            return Some(ChainMove {
                                target,
                                blocker,
                                second,
                                displaced: Some((displaced, last)),
                            });
                        }
                    }
                }
            }
        }

        None
    }
}

impl Default for ChainSwap {
    fn default() -> Self {
        Self::new()
    }
}
