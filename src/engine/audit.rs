// ==========================================
// 晚宴分桌系统 - 座位表审计
// ==========================================
// 职责: 对任意座位表逐屋逐对检查，输出告警与统计
// 输出: 纯数据（不含任何格式化）
// ==========================================

use crate::domain::assignment::UnseatedMember;
use crate::domain::house::House;
use crate::domain::pair::NeverMatchSet;
use crate::domain::types::AuditWarning;
use crate::engine::pair_history::PairHistoryIndex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{info, instrument};

/// 一对同屋成员的审计结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairAudit {
    pub house_id: u32,
    pub member_1: String,
    pub member_2: String,
    /// None = 从未同桌
    pub months_apart: Option<i64>,
    pub warning: Option<AuditWarning>,
}

/// 单个房屋的间隔统计（仅计入有历史且非永不同桌的成员对）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseAudit {
    pub house_id: u32,
    pub pairs: Vec<PairAudit>,
    pub min_months: Option<i64>,
    pub max_months: Option<i64>,
    pub average_months: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_connections: usize,
    pub never_met: usize,
    pub average_months: Option<i64>,
    pub min_months: Option<i64>,
    pub max_months: Option<i64>,
    pub threshold_months: i64,
    pub unseated_members: usize,
    pub never_match_violations: usize,
    pub problem_pairs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub summary: AuditSummary,
    pub houses: Vec<HouseAudit>,
    pub never_match_violations: Vec<PairAudit>,
    pub problem_pairs: Vec<PairAudit>,
    pub unseated: Vec<UnseatedMember>,
    /// 全部成员对按间隔升序，从未同桌的排在最后
    pub sorted_pairs: Vec<PairAudit>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.never_match_violations.is_empty() && self.problem_pairs.is_empty()
    }
}

// ==========================================
// GridAuditor - 座位表审计器
// ==========================================
pub struct GridAuditor {
    // 无状态引擎,不需要注入依赖
}

impl GridAuditor {
    pub fn new() -> Self {
        Self {}
    }

    /// 审计座位表
    ///
    /// # 参数
    /// - `houses`: 座位表（未启用房屋跳过）
    /// - `history`: 历史同桌索引
    /// - `never_match`: 永不同桌集合
    /// - `threshold`: 间隔阈值（月）
    /// - `unseated`: 未落座成员
    #[instrument(skip_all, fields(houses = houses.len(), threshold = threshold))]
    pub fn audit(
        &self,
        houses: &[House],
        history: &PairHistoryIndex,
        never_match: &NeverMatchSet,
        threshold: i64,
        unseated: Vec<UnseatedMember>,
    ) -> AuditReport {
        let mut summary = AuditSummary {
            threshold_months: threshold,
            unseated_members: unseated.len(),
            ..AuditSummary::default()
        };
        let mut house_audits = Vec::new();
        let mut violations = Vec::new();
        let mut problems = Vec::new();
        let mut sum_months: i64 = 0;

        for house in houses.iter().filter(|h| h.is_active()) {
            let members = house.members();
            let mut pairs = Vec::new();
            let mut house_months: Vec<i64> = Vec::new();

            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    let months_apart = history.months_apart(a, b);
                    let mut warning = None;

                    if never_match.contains(a, b) {
                        warning = Some(AuditWarning::NeverMatch);
                    } else if let Some(months) = months_apart {
                        summary.total_connections += 1;
                        sum_months += months;
                        summary.min_months = Some(summary.min_months.map_or(months, |m| m.min(months)));
                        summary.max_months = Some(summary.max_months.map_or(months, |m| m.max(months)));
                        house_months.push(months);
                        if months < threshold {
                            warning = Some(AuditWarning::TooSoon);
                        }
                    } else {
                        summary.never_met += 1;
                    }

                    let pair = PairAudit {
                        house_id: house.id,
                        member_1: a.to_string(),
                        member_2: b.to_string(),
                        months_apart,
                        warning,
                    };
                    match warning {
                        Some(AuditWarning::NeverMatch) => violations.push(pair.clone()),
                        Some(AuditWarning::TooSoon) => problems.push(pair.clone()),
                        None => {}
                    }
                    pairs.push(pair);
                }
            }

            let average_months = if house_months.is_empty() {
                None
            } else {
                Some(house_months.iter().sum::<i64>() as f64 / house_months.len() as f64)
            };
            house_audits.push(HouseAudit {
                house_id: house.id,
                pairs,
                min_months: house_months.iter().copied().min(),
                max_months: house_months.iter().copied().max(),
                average_months,
            });
        }

        if summary.total_connections > 0 {
            let avg = sum_months as f64 / summary.total_connections as f64;
            summary.average_months = Some(avg.round() as i64);
        }
        summary.never_match_violations = violations.len();
        summary.problem_pairs = problems.len();

        let mut sorted_pairs: Vec<PairAudit> = house_audits
            .iter()
            .flat_map(|h| h.pairs.iter().cloned())
            .collect();
        sorted_pairs.sort_by(|a, b| match (a.months_apart, b.months_apart) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        info!(
            total_connections = summary.total_connections,
            never_met = summary.never_met,
            violations = summary.never_match_violations,
            problem_pairs = summary.problem_pairs,
            unseated = summary.unseated_members,
            "座位表审计完成"
        );

        AuditReport {
            summary,
            houses: house_audits,
            never_match_violations: violations,
            problem_pairs: problems,
            unseated,
            sorted_pairs,
        }
    }
}

impl Default for GridAuditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pair::ConnectionEntry;
    use chrono::NaiveDate;

    fn history(rows: &[(&str, &str, i64)]) -> PairHistoryIndex {
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let mut entries = Vec::new();
        for (a, b, months) in rows {
            for mut row in ConnectionEntry::both_orientations(a, b, date, false) {
                row.months_apart = *months;
                entries.push(row);
            }
        }
        PairHistoryIndex::build(&entries)
    }

    fn grid() -> Vec<House> {
        let mut first = House::new(1, 6, "H1", 1);
        first.seat_guest("G1", 1);
        first.seat_guest("G2", 1);
        let mut second = House::new(2, 4, "H2", 1);
        second.seat_guest("G3", 2);
        vec![first, second, House::inactive(3)]
    }

    #[test]
    fn test_audit_flags_warnings() {
        let history = history(&[("H1", "G1", 30), ("G1", "G2", 4), ("H2", "G3", 18)]);
        let mut never_match = NeverMatchSet::new();
        never_match.insert("G2", "H1");

        let report = GridAuditor::new().audit(&grid(), &history, &never_match, 12, Vec::new());

        assert_eq!(report.houses.len(), 2);
        assert_eq!(report.summary.total_connections, 3);
        assert_eq!(report.summary.never_met, 0);
        assert_eq!(report.summary.never_match_violations, 1);
        assert_eq!(report.summary.problem_pairs, 1);
        assert_eq!(report.summary.min_months, Some(4));
        assert_eq!(report.summary.max_months, Some(30));
        assert_eq!(report.summary.average_months, Some(17));
        assert_eq!(report.problem_pairs[0].member_1, "G1");
        assert_eq!(report.never_match_violations[0].warning, Some(AuditWarning::NeverMatch));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_audit_sorted_view_puts_never_met_last() {
        let history = history(&[("H1", "G1", 30), ("H2", "G3", 18)]);
        let report = GridAuditor::new().audit(&grid(), &history, &NeverMatchSet::new(), 12, Vec::new());

        let months: Vec<Option<i64>> = report.sorted_pairs.iter().map(|p| p.months_apart).collect();
        assert_eq!(months, vec![Some(18), Some(30), None, None]);
        assert_eq!(report.summary.never_met, 2);
        assert_eq!(report.houses[1].average_months, Some(18.0));
        assert!(report.is_clean());
    }

    #[test]
    fn test_audit_counts_unseated() {
        let unseated = vec![UnseatedMember {
            code: "G9".to_string(),
            party_size: 2,
            options: Vec::new(),
        }];
        let report = GridAuditor::new().audit(&[], &PairHistoryIndex::default(), &NeverMatchSet::new(), 12, unseated);
        assert_eq!(report.summary.unseated_members, 1);
        assert_eq!(report.summary.average_months, None);
    }
}
