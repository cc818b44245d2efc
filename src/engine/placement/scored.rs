use super::{ordered_guests, PlacementSummary};
use crate::config::control::{ControlVariables, ScoringWeights};
use crate::domain::house::SeatCapacity;
use crate::engine::context::SeatingContext;
use crate::engine::critical::CriticalGuestAnalyzer;
use tracing::{debug, instrument};

// ==========================================
// ScoredPlacer - 逐客评分落座
// ==========================================
// 每位客人只做一次不可撤销的决定；
// 评分 = 余座 + 均衡 + 新鲜度，同分保留表格中靠前的房屋
pub struct ScoredPlacer {
    weights: ScoringWeights,
    analyzer: CriticalGuestAnalyzer,
    ceiling: usize,
    prioritize_critical: bool,
    sort_guests: bool,
}

impl ScoredPlacer {
    pub fn new(
        weights: ScoringWeights,
        critical_ceiling: usize,
        prioritize_critical: bool,
        sort_guests: bool,
    ) -> Self {
        Self {
            weights,
            analyzer: CriticalGuestAnalyzer::new(critical_ceiling),
            ceiling: critical_ceiling,
            prioritize_critical,
            sort_guests,
        }
    }

    pub fn from_control(control: &ControlVariables) -> Self {
        Self::new(
            control.weights,
            control.critical_ceiling,
            control.prioritize_critical,
            control.sort_guests,
        )
    }

    /// 执行评分落座
    ///
    /// # 返回
    /// PlacementSummary（attempts_run 固定为 1）
    #[instrument(skip_all, fields(unseated = ctx.unseated_count()))]
    pub fn place(&self, ctx: &mut SeatingContext) -> PlacementSummary {
        let mut queue = ordered_guests(ctx, self.sort_guests);

        while !queue.is_empty() {
            let pos = self.next_guest(ctx, &queue);
            let code = queue.remove(pos);

            let candidates = ctx.compatible_houses(&code);
            if candidates.is_empty() {
                debug!(code = %code, "无相容房屋，留待修复阶段");
                continue;
            }

            let guarded: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|h| !self.analyzer.would_strand(ctx, *h, &code, &queue))
                .collect();
            // 守卫只做偏好：全部候选都被拦下时仍按评分落座
            let guarded = if guarded.is_empty() {
                debug!(code = %code, "全部候选房屋都会夺走关键客人的唯一选择，按评分落座");
                candidates
            } else {
                guarded
            };

            let mut best = guarded[0];
            let mut best_score = self.score(ctx, best, &code);
            for h in guarded.into_iter().skip(1) {
                let score = self.score(ctx, h, &code);
                if score > best_score {
                    best = h;
                    best_score = score;
                }
            }

            debug!(code = %code, house_id = ctx.houses[best].id, score = best_score, "评分落座");
            ctx.seat(best, &code);
        }

        PlacementSummary {
            attempts_run: 1,
            unseated: ctx.unseated_count(),
        }
    }

    /// 房屋评分
    ///
    /// - slack = W_slack × 放入后余座
    /// - balance = W_balance / 当前成员数
    /// - freshness = W_fresh × Σ min(月数或上限, 上限) / 上限
    pub fn score(&self, ctx: &SeatingContext, house_idx: usize, code: &str) -> f64 {
        let house = &ctx.houses[house_idx];
        let w = &self.weights;

        let seats_left = house.remaining_seats().saturating_sub(ctx.party_size(code));
        let slack = w.slack * f64::from(seats_left);

        let member_count = house.member_count().max(1);
        let balance = w.balance / member_count as f64;

        let cap = w.months_cap;
        let fresh_sum: f64 = house
            .members()
            .iter()
            .map(|m| {
                let months = ctx
                    .oracle
                    .history()
                    .months_apart(code, m)
                    .unwrap_or(cap)
                    .clamp(0, cap);
                months as f64 / cap as f64
            })
            .sum();
        let freshness = w.freshness * fresh_sum;

        slack + balance + freshness
    }

    /// 选出下一位客人：开启关键优先时，候选数最少且 <= 上限者提前
    fn next_guest(&self, ctx: &SeatingContext, queue: &[String]) -> usize {
        if !self.prioritize_critical {
            return 0;
        }

        let mut best: Option<(usize, usize)> = None;
        for (pos, code) in queue.iter().enumerate() {
            let options = self.analyzer.option_count(ctx, code);
            if options > self.ceiling {
                continue;
            }
            if best.map_or(true, |(_, n)| options < n) {
                best = Some((pos, options));
            }
        }

        best.map(|(pos, _)| pos).unwrap_or(0)
    }
}
