use crate::engine::context::SeatingContext;
use tracing::debug;

// ==========================================
// TwoWaySwap - 双屋互换
// ==========================================
// 两个房屋各出一位非主人成员直接互换；
// 仅当互换后能立即放入某位未落座客人时才执行
pub struct TwoWaySwap {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExchangeMove {
    first: usize,
    first_member: String,
    second: usize,
    second_member: String,
    guest: String,
    target: usize,
}

impl TwoWaySwap {
    pub fn new() -> Self {
        Self {}
    }

    /// 反复扫描直到一轮内没有新的落座
    ///
    /// # 返回
    /// 本策略落座的人数
    pub fn run(&self, ctx: &mut SeatingContext) -> usize {
        let mut seated = 0;

        while let Some(mv) = self.find_exchange(ctx) {
            debug!(
                first_house = ctx.houses[mv.first].id,
                first_member = %mv.first_member,
                second_house = ctx.houses[mv.second].id,
                second_member = %mv.second_member,
                guest = %mv.guest,
                "双屋互换"
            );
            ctx.unseat(mv.first, &mv.first_member);
            ctx.unseat(mv.second, &mv.second_member);
            ctx.seat(mv.first, &mv.second_member);
            ctx.seat(mv.second, &mv.first_member);
            ctx.seat(mv.target, &mv.guest);
            seated += 1;
        }

        seated
    }

    fn find_exchange(&self, ctx: &SeatingContext) -> Option<ExchangeMove> {
        let unseated = ctx.unseated_guests();
        if unseated.is_empty() {
            return None;
        }

        let threshold = ctx.threshold;
        let houses: Vec<usize> = ctx.active_houses().collect();

        for (i, &first) in houses.iter().enumerate() {
            for &second in &houses[i + 1..] {
                for a in ctx.movable_members(first) {
                    for b in ctx.movable_members(second) {
                        if !ctx.fits_in_place_of(first, &a, &b, threshold)
                            || !ctx.fits_in_place_of(second, &b, &a, threshold)
                        {
                            continue;
                        }

                        let first_after = ctx.exchanged(first, &a, &b);
                        let second_after = ctx.exchanged(second, &b, &a);

                        for guest in &unseated {
                            let target = if ctx.fits_house(&first_after, guest, threshold) {
                                first
                            } else if ctx.fits_house(&second_after, guest, threshold) {
                                second
                            } else {
                                continue;
                            };
                            return Some(ExchangeMove {
                                first,
                                first_member: a,
                                second,
                                second_member: b,
                                guest: guest.clone(),
                                target,
                            });
                        }
                    }
                }
            }
        }

        None
    }
}

impl Default for TwoWaySwap {
    fn default() -> Self {
        Self::new()
    }
}
