use super::{ordered_guests, ordered_houses, PlacementSummary};
use crate::config::control::ControlVariables;
use crate::domain::house::SeatCapacity;
use crate::engine::context::SeatingContext;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

// ==========================================
// GreedyRestartPlacer - 随机重启贪心装箱
// ==========================================
// 每次尝试按主人顺序逐屋填充：扫描客人列表，取第一个
// 未落座、座位足够、与全员相容的客人；保留未落座最少的尝试
pub struct GreedyRestartPlacer {
    max_attempts: usize,
    seed: u64,
    throttle_singles: bool,
    sort_hosts: bool,
    sort_guests: bool,
}

impl GreedyRestartPlacer {
    pub fn new(
        max_attempts: usize,
        seed: u64,
        throttle_singles: bool,
        sort_hosts: bool,
        sort_guests: bool,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            seed,
            throttle_singles,
            sort_hosts,
            sort_guests,
        }
    }

    pub fn from_control(control: &ControlVariables) -> Self {
        Self::new(
            control.max_attempts,
            control.seed(),
            control.throttle_singles,
            control.sort_hosts,
            control.sort_guests,
        )
    }

    /// 执行随机重启贪心装箱
    ///
    /// 第一次尝试使用排序后的原始顺序；之后每次打乱两个列表的后 30%。
    /// 未落座数为 0 时提前结束。
    #[instrument(skip_all, fields(max_attempts = self.max_attempts, seed = self.seed))]
    pub fn place(&self, ctx: &mut SeatingContext) -> PlacementSummary {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let base_guests = ordered_guests(ctx, self.sort_guests);
        let base_houses = ordered_houses(ctx, self.sort_hosts);

        let mut best: Option<SeatingContext> = None;
        let mut attempts_run = 0;

        for attempt in 0..self.max_attempts {
            let mut guests = base_guests.clone();
            let mut houses = base_houses.clone();
            if attempt > 0 {
                shuffle_tail(&mut guests, &mut rng);
                shuffle_tail(&mut houses, &mut rng);
            }

            let mut trial = ctx.clone();
            self.fill(&mut trial, &houses, &guests);
            let unseated = trial.unseated_count();
            attempts_run = attempt + 1;
            debug!(attempt = attempts_run, unseated, "贪心装箱尝试完成");

            let improved = best
                .as_ref()
                .map_or(true, |b| unseated < b.unseated_count());
            if improved {
                best = Some(trial);
            }
            if unseated == 0 {
                break;
            }
        }

        if let Some(best) = best {
            *ctx = best;
        }

        PlacementSummary {
            attempts_run,
            unseated: ctx.unseated_count(),
        }
    }

    /// 按房屋顺序逐屋填充
    fn fill(&self, ctx: &mut SeatingContext, houses: &[usize], guests: &[String]) {
        let threshold = ctx.threshold;

        for &h in houses {
            while ctx.houses[h].has_member_slot() {
                let member_count = ctx.houses[h].member_count();
                let next = guests.iter().find(|g| {
                    if ctx.is_seated(g) {
                        return false;
                    }
                    // 主人单独在屋时跳过单人客人
                    if self.throttle_singles
                        && member_count < 2
                        && ctx.attendee(g).is_some_and(|a| a.is_single())
                    {
                        return false;
                    }
                    ctx.fits(h, g, threshold)
                });

                match next {
                    Some(code) => {
                        let code = code.clone();
                        ctx.seat(h, &code);
                    }
                    None => break,
                }
            }
        }
    }
}

/// 打乱列表后 30%（起点 = floor(len × 0.7)）
fn shuffle_tail<T>(list: &mut [T], rng: &mut ChaCha8Rng) {
    let start = list.len() * 7 / 10;
    list[start..].shuffle(rng);
}
