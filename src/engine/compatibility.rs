// ==========================================
// 晚宴分桌系统 - 相容性判定
// ==========================================
// 红线: 永不同桌检查优先且具有决定性，任何放宽都不能绕过
// 规则: 存在历史记录且 threshold > months_apart 时不相容；无记录视为相容
// ==========================================

use crate::domain::pair::{NeverMatchSet, PairKey};
use crate::engine::pair_history::PairHistoryIndex;

// ==========================================
// CompatibilityOracle - 相容性判定器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CompatibilityOracle {
    never_match: NeverMatchSet,
    history: PairHistoryIndex,
}

impl CompatibilityOracle {
    pub fn new(never_match: NeverMatchSet, history: PairHistoryIndex) -> Self {
        Self {
            never_match,
            history,
        }
    }

    pub fn never_match(&self) -> &NeverMatchSet {
        &self.never_match
    }

    pub fn history(&self) -> &PairHistoryIndex {
        &self.history
    }

    /// 两名成员能否同桌
    ///
    /// # 参数
    /// - `threshold`: 最小间隔月数（放宽阶段会传入更低的值）
    pub fn is_compatible(&self, a: &str, b: &str, threshold: i64) -> bool {
        if a == b {
            return true;
        }

        let key = PairKey::new(a, b);
        if self.never_match.contains_key(&key) {
            return false;
        }

        if let Some(constrained) = self.history.is_constrained(&key, threshold) {
            return !constrained;
        }

        match self.history.months_apart_by_key(&key) {
            Some(months) => threshold <= months,
            None => true,
        }
    }

    /// 与房屋内全部成员相容
    pub fn is_compatible_with_all(&self, code: &str, members: &[&str], threshold: i64) -> bool {
        members
            .iter()
            .all(|member| self.is_compatible(code, member, threshold))
    }

    /// 与 code 不相容的成员
    pub fn blockers(&self, code: &str, members: &[&str], threshold: i64) -> Vec<String> {
        members
            .iter()
            .filter(|member| !self.is_compatible(code, member, threshold))
            .map(|member| member.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pair::ConnectionEntry;
    use chrono::NaiveDate;

    fn oracle(narrow: bool) -> CompatibilityOracle {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut rows = Vec::new();
        for (a, b, months) in [("A", "B", 6), ("A", "C", 12), ("C", "D", 40)] {
            for mut row in ConnectionEntry::both_orientations(a, b, date, false) {
                row.months_apart = months;
                rows.push(row);
            }
        }
        let mut history = PairHistoryIndex::build(&rows);
        if narrow {
            history = history.narrowed(["A", "B", "C", "D", "E"], 12);
        }
        let mut never_match = NeverMatchSet::new();
        never_match.insert("D", "E");
        CompatibilityOracle::new(never_match, history)
    }

    #[test]
    fn test_threshold_rule() {
        for narrow in [false, true] {
            let oracle = oracle(narrow);
            assert!(!oracle.is_compatible("A", "B", 12));
            assert!(oracle.is_compatible("A", "C", 12));
            assert!(oracle.is_compatible("B", "A", 6));
            assert!(!oracle.is_compatible("B", "A", 7));
            assert!(oracle.is_compatible("A", "E", 100));
        }
    }

    #[test]
    fn test_never_match_is_never_relaxed() {
        let oracle = oracle(true);
        assert!(!oracle.is_compatible("E", "D", 0));
        assert!(!oracle.is_compatible("D", "E", 12));
    }

    #[test]
    fn test_self_is_compatible() {
        assert!(oracle(false).is_compatible("A", "A", 12));
    }

    #[test]
    fn test_compatible_with_all_and_blockers() {
        let oracle = oracle(false);
        assert!(oracle.is_compatible_with_all("C", &["A", "D"], 12));
        assert!(!oracle.is_compatible_with_all("A", &["C", "B"], 12));
        assert_eq!(oracle.blockers("E", &["A", "D"], 12), vec!["D".to_string()]);
    }
}
