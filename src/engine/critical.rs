// ==========================================
// 晚宴分桌系统 - 关键客人分析
// ==========================================
// 职责: 统计未落座客人的候选房屋数，识别关键客人
// 用途: (a) 评分落座的排序信号 (b) 落座守卫：不得夺走关键客人最后的候选房屋
// ==========================================

use crate::domain::assignment::HouseOption;
use crate::domain::house::{SeatCapacity, MAX_MEMBERS};
use crate::engine::context::SeatingContext;

/// 关键客人及其候选房屋数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalGuest {
    pub code: String,
    pub options: usize,
}

// ==========================================
// CriticalGuestAnalyzer - 关键客人分析器
// ==========================================
pub struct CriticalGuestAnalyzer {
    ceiling: usize,
}

impl CriticalGuestAnalyzer {
    /// # 参数
    /// - `ceiling`: 候选房屋数 <= ceiling 即为关键客人
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    /// 候选房屋数：座位足够、有空成员位、与主人相容的启用房屋
    pub fn option_count(&self, ctx: &SeatingContext, code: &str) -> usize {
        let party_size = ctx.party_size(code);
        ctx.active_houses()
            .filter(|h| {
                let house = &ctx.houses[*h];
                house.can_seat(party_size)
                    && house
                        .host
                        .as_deref()
                        .map(|host| ctx.oracle.is_compatible(code, host, ctx.threshold))
                        .unwrap_or(false)
            })
            .count()
    }

    pub fn is_critical(&self, ctx: &SeatingContext, code: &str) -> bool {
        self.option_count(ctx, code) <= self.ceiling
    }

    /// 全部关键客人（候选房屋数升序，同数保持成员顺序）
    pub fn analyze(&self, ctx: &SeatingContext) -> Vec<CriticalGuest> {
        let mut critical: Vec<CriticalGuest> = ctx
            .unseated_guests()
            .into_iter()
            .map(|code| {
                let options = self.option_count(ctx, &code);
                CriticalGuest { code, options }
            })
            .filter(|c| c.options <= self.ceiling)
            .collect();
        critical.sort_by_key(|c| c.options);
        critical
    }

    /// 落座守卫：将 code 放入 house_idx 是否会夺走某关键客人唯一的完全相容房屋
    ///
    /// 只考虑仍在 `waiting` 中排队的客人；已被跳过的客人不再占用守卫。
    /// 通过模拟该房屋放入前后的成员列表与座位判定。
    pub fn would_strand(
        &self,
        ctx: &SeatingContext,
        house_idx: usize,
        code: &str,
        waiting: &[String],
    ) -> bool {
        let house = &ctx.houses[house_idx];
        let incoming = ctx.party_size(code);

        waiting
            .iter()
            .filter(|other| other.as_str() != code)
            .filter(|other| self.is_critical(ctx, other))
            .any(|other| {
                let compatible = ctx.compatible_houses(other);
                if compatible.len() != 1 || compatible[0] != house_idx {
                    return false;
                }

                // 放入后仍可容纳 other 则不算夺走
                let still_fits = incoming
                    .checked_add(ctx.party_size(other))
                    .is_some_and(|need| need <= house.remaining_seats())
                    && house.member_count() + 2 <= MAX_MEMBERS
                    && ctx.oracle.is_compatible(other, code, ctx.threshold);
                !still_fits
            })
    }

    /// 未落座客人的可选房屋：座位与成员位足够，附带阻碍成员，阻碍少者在前
    pub fn house_options(&self, ctx: &SeatingContext, code: &str) -> Vec<HouseOption> {
        let party_size = ctx.party_size(code);
        let mut options: Vec<HouseOption> = ctx
            .active_houses()
            .filter(|h| ctx.houses[*h].can_seat(party_size))
            .map(|h| {
                let house = &ctx.houses[h];
                HouseOption {
                    house_id: house.id,
                    free_seats: house.remaining_seats(),
                    blockers: ctx.oracle.blockers(code, &house.members(), ctx.threshold),
                }
            })
            .collect();
        options.sort_by_key(|o| o.blockers.len());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::fixtures::context;

    #[test]
    fn test_option_count_uses_host_only() {
        // G1 与 H1 不相容；与 G2 的冲突不计入候选数
        let mut ctx = context(
            &[("H1", 1, 4), ("H2", 1, 4), ("H3", 1, 1)],
            &[("G1", 1), ("G2", 1)],
            &[("G1", "H1", 2), ("G1", "G2", 2)],
            &[],
            12,
        );
        ctx.seat(1, "G2");
        let analyzer = CriticalGuestAnalyzer::new(2);
        assert_eq!(analyzer.option_count(&ctx, "G1"), 1);
        assert!(analyzer.is_critical(&ctx, "G1"));
        assert_eq!(
            analyzer.analyze(&ctx),
            vec![CriticalGuest { code: "G1".to_string(), options: 1 }]
        );
    }

    #[test]
    fn test_would_strand_protects_last_house() {
        // G2 只能去 H2；G1 两个房屋都可去；H2 只剩一个座位
        let ctx = context(
            &[("H1", 1, 4), ("H2", 1, 2)],
            &[("G1", 1), ("G2", 1)],
            &[("G2", "H1", 1)],
            &[],
            12,
        );
        let analyzer = CriticalGuestAnalyzer::new(2);
        let waiting = vec!["G2".to_string()];
        assert!(analyzer.would_strand(&ctx, 1, "G1", &waiting));
        assert!(!analyzer.would_strand(&ctx, 0, "G1", &waiting));
    }

    #[test]
    fn test_would_strand_ignores_guests_no_longer_waiting() {
        let ctx = context(
            &[("H1", 1, 4), ("H2", 1, 2)],
            &[("G1", 1), ("G2", 1)],
            &[("G2", "H1", 1)],
            &[],
            12,
        );
        let analyzer = CriticalGuestAnalyzer::new(2);
        assert!(!analyzer.would_strand(&ctx, 1, "G1", &[]));
    }

    #[test]
    fn test_would_strand_ignores_room_left() {
        let ctx = context(
            &[("H1", 1, 4), ("H2", 1, 4)],
            &[("G1", 1), ("G2", 1)],
            &[("G2", "H1", 1)],
            &[],
            12,
        );
        let analyzer = CriticalGuestAnalyzer::new(2);
        assert!(!analyzer.would_strand(&ctx, 1, "G1", &["G2".to_string()]));
    }

    #[test]
    fn test_house_options_sorted_by_blockers() {
        let mut ctx = context(
            &[("H1", 1, 4), ("H2", 1, 4), ("H3", 1, 1)],
            &[("G1", 1), ("G2", 1), ("G3", 1)],
            &[("G1", "H1", 2), ("G1", "G2", 2)],
            &[],
            12,
        );
        ctx.seat(0, "G2");
        let options = CriticalGuestAnalyzer::new(2).house_options(&ctx, "G1");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].house_id, 2);
        assert!(options[0].blockers.is_empty());
        assert_eq!(options[1].blockers, vec!["H1".to_string(), "G2".to_string()]);
    }
}
