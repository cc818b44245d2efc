use super::simple_swap::{apply_swap, find_swap_where};
use crate::domain::house::SeatCapacity;
use crate::engine::context::SeatingContext;
use tracing::debug;

// ==========================================
// CapacityConsolidation - 容量合并
// ==========================================
// 仅针对多人同行的未落座客人：
// 1) 只剩 1 个空位的房屋，移走一位单人成员
// 2) 移走同一房屋的两位单人成员（分别转入其他房屋），腾出两个座位与两个成员位
pub struct CapacityConsolidation {}

/// 两位单人成员同时迁出
#[derive(Debug, Clone, PartialEq, Eq)]
struct PairMove {
    house: usize,
    first: (String, usize),
    second: (String, usize),
}

impl CapacityConsolidation {
    pub fn new() -> Self {
        Self {}
    }

    /// # 返回
    /// 本策略落座的人数
    pub fn run(&self, ctx: &mut SeatingContext) -> usize {
        let mut seated = 0;

        for code in ctx.unseated_guests() {
            if ctx.party_size(&code) < 2 {
                continue;
            }

            let view: &SeatingContext = ctx;
            let single = find_swap_where(view, &code, |house, member| {
                view.houses[house].remaining_seats() == 1 && view.party_size(member) == 1
            });
            if let Some(mv) = single {
                debug!(
                    code = %code,
                    house_id = ctx.houses[mv.house].id,
                    moved = %mv.evicted,
                    destination = ctx.houses[mv.destination].id,
                    "容量合并（单人迁出）"
                );
                apply_swap(ctx, &code, &mv);
                seated += 1;
                continue;
            }

            if let Some(mv) = find_pair_move(ctx, &code) {
                debug!(
                    code = %code,
                    house_id = ctx.houses[mv.house].id,
                    first = %mv.first.0,
                    second = %mv.second.0,
                    "容量合并（两位单人迁出）"
                );
                ctx.unseat(mv.house, &mv.first.0);
                ctx.unseat(mv.house, &mv.second.0);
                ctx.seat(mv.house, &code);
                ctx.seat(mv.first.1, &mv.first.0);
                ctx.seat(mv.second.1, &mv.second.0);
                seated += 1;
            }
        }

        seated
    }
}

impl Default for CapacityConsolidation {
    fn default() -> Self {
        Self::new()
    }
}

/// 查找两位单人成员的迁出方案
///
/// 第二位成员的去向按第一位成员迁入后的房屋状态判定。
fn find_pair_move(ctx: &SeatingContext, code: &str) -> Option<PairMove> {
    let threshold = ctx.threshold;
    let houses: Vec<usize> = ctx.active_houses().collect();

    for &house in &houses {
        let singles: Vec<String> = ctx
            .movable_members(house)
            .into_iter()
            .filter(|m| ctx.party_size(m) == 1)
            .collect();

        for (i, first) in singles.iter().enumerate() {
            for second in &singles[i + 1..] {
                let mut emptied = ctx.houses[house].clone();
                emptied.remove_guest(first, 1);
                emptied.remove_guest(second, 1);
                if !ctx.fits_house(&emptied, code, threshold) {
                    continue;
                }

                for &landing in houses.iter().filter(|k| **k != house) {
                    if !ctx.fits(landing, first, threshold) {
                        continue;
                    }
                    let mut landed = ctx.houses[landing].clone();
                    landed.seat_guest(first, 1);

                    let next = houses.iter().copied().filter(|k| *k != house).find(|k| {
                        if *k == landing {
                            ctx.fits_house(&landed, second, threshold)
                        } else {
                            ctx.fits(*k, second, threshold)
                        }
                    });
                    if let Some(next) = next {
                        return Some(PairMove {
                            house,
                            first: (first.clone(), landing),
                            second: (second.clone(), next),
                        });
                    }
                }
            }
        }
    }

    None
}
