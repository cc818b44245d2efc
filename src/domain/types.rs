// ==========================================
// 晚宴分桌系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 成员角色 (Role)
// ==========================================
// 主人携带座位容量；客人只占座
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Host {
        seat_capacity: u32,  // 房屋总座位数
        self_occupancy: u32, // 主人自身占座 (1-2)
    },
    Guest,
}

impl Role {
    pub fn is_host(&self) -> bool {
        matches!(self, Role::Host { .. })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host { .. } => write!(f, "HOST"),
            Role::Guest => write!(f, "GUEST"),
        }
    }
}

// ==========================================
// 首轮落座策略 (Placement Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    Scored,        // 逐客评分落座（默认）
    GreedyRestart, // 随机重启贪心装箱
}

impl PlacementPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementPolicy::Scored => "scored",
            PlacementPolicy::GreedyRestart => "greedy_restart",
        }
    }
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        PlacementPolicy::Scored
    }
}

impl fmt::Display for PlacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scored" | "guest_centric" => Ok(PlacementPolicy::Scored),
            "greedy_restart" | "greedy-restart" | "greedy" => Ok(PlacementPolicy::GreedyRestart),
            other => Err(format!("未知落座策略: {}", other)),
        }
    }
}

// ==========================================
// 审计告警 (Audit Warning)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditWarning {
    NeverMatch, // 永不同桌违规
    TooSoon,    // 间隔月数低于阈值
}

impl fmt::Display for AuditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditWarning::NeverMatch => write!(f, "NEVER MATCH"),
            AuditWarning::TooSoon => write!(f, "TOO SOON"),
        }
    }
}

/// 表格中的 "Yes"/"No" 落座标记
pub fn parse_seated_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        // 原表格以空白表示已落座
        "" => Some(true),
        _ => None,
    }
}

pub fn format_seated_flag(seated: bool) -> &'static str {
    if seated {
        "Yes"
    } else {
        "No"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_policy_from_str() {
        assert_eq!("scored".parse::<PlacementPolicy>().unwrap(), PlacementPolicy::Scored);
        assert_eq!(
            "Greedy-Restart".parse::<PlacementPolicy>().unwrap(),
            PlacementPolicy::GreedyRestart
        );
        assert!("random".parse::<PlacementPolicy>().is_err());
    }

    #[test]
    fn test_seated_flag() {
        assert_eq!(parse_seated_flag("No"), Some(false));
        assert_eq!(parse_seated_flag(" yes "), Some(true));
        assert_eq!(parse_seated_flag(""), Some(true));
        assert_eq!(parse_seated_flag("maybe"), None);
        assert_eq!(format_seated_flag(false), "No");
    }
}
