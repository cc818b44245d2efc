// ==========================================
// 晚宴分桌系统 - 控制参数
// ==========================================

use crate::domain::types::PlacementPolicy;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 默认放宽阶梯（月）
pub const DEFAULT_RELAXATION_STEPS: [i64; 7] = [24, 18, 12, 9, 6, 3, 0];

/// 控制参数（一次运行的全部标量输入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlVariables {
    /// 同桌最小间隔月数
    pub time_lapse_months: i64,

    /// 下次晚宴日期（必填，用于台账月数计算）
    #[serde(default)]
    pub next_dinner_date: Option<NaiveDate>,

    /// 房屋成员少于 2 人时跳过单人客人
    #[serde(default)]
    pub throttle_singles: bool,

    /// 按历史同桌次数降序排列主人/客人
    #[serde(default = "default_true")]
    pub sort_hosts: bool,
    #[serde(default = "default_true")]
    pub sort_guests: bool,

    /// 运行前清空落座标记 / 座位表
    #[serde(default)]
    pub clear_seated: bool,
    #[serde(default)]
    pub clear_grid: bool,

    /// 为未落座成员附带候选房屋
    #[serde(default)]
    pub unseated_options: bool,

    #[serde(default)]
    pub placement_policy: PlacementPolicy,

    /// 随机重启次数上限
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// 洗牌种子（None 时使用固定默认种子）
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// 放宽阶梯（月），实际使用时只取低于 time_lapse_months 的部分
    #[serde(default = "default_relaxation_steps")]
    pub relaxation_steps: Vec<i64>,

    /// 放宽下限（月）
    #[serde(default)]
    pub relaxation_floor: i64,

    /// 候选房屋数 <= 该值即为关键客人
    #[serde(default = "default_critical_ceiling")]
    pub critical_ceiling: usize,

    /// 评分落座时优先处理关键客人
    #[serde(default = "default_true")]
    pub prioritize_critical: bool,

    #[serde(default)]
    pub weights: ScoringWeights,
}

/// 评分落座的权重（经验值）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub slack: f64,
    pub balance: f64,
    pub freshness: f64,
    /// 单个成员对计入的月数上限（从未同桌按上限计）
    pub months_cap: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            slack: 1.0,
            balance: 2.0,
            freshness: 0.5,
            months_cap: 36,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> usize {
    10
}

fn default_relaxation_steps() -> Vec<i64> {
    DEFAULT_RELAXATION_STEPS.to_vec()
}

fn default_critical_ceiling() -> usize {
    2
}

impl Default for ControlVariables {
    fn default() -> Self {
        Self {
            time_lapse_months: 12,
            next_dinner_date: None,
            throttle_singles: false,
            sort_hosts: true,
            sort_guests: true,
            clear_seated: false,
            clear_grid: false,
            unseated_options: false,
            placement_policy: PlacementPolicy::default(),
            max_attempts: default_max_attempts(),
            shuffle_seed: None,
            relaxation_steps: default_relaxation_steps(),
            relaxation_floor: 0,
            critical_ceiling: default_critical_ceiling(),
            prioritize_critical: true,
            weights: ScoringWeights::default(),
        }
    }
}

impl ControlVariables {
    /// 校验控制参数
    ///
    /// # 验证规则
    /// 1. time_lapse_months >= 0
    /// 2. next_dinner_date 必填
    /// 3. max_attempts 在 [1, 100]
    /// 4. 放宽阶梯与下限非负
    /// 5. 权重为有限非负数，months_cap > 0
    pub fn validate(&self) -> EngineResult<()> {
        if self.time_lapse_months < 0 {
            return Err(EngineError::invalid_control(
                "time_lapse_months",
                format!("不能为负数: {}", self.time_lapse_months),
            ));
        }

        if self.next_dinner_date.is_none() {
            return Err(EngineError::MissingControl("next_dinner_date".to_string()));
        }

        if self.max_attempts == 0 || self.max_attempts > 100 {
            return Err(EngineError::invalid_control(
                "max_attempts",
                format!("超出有效范围 [1, 100]: {}", self.max_attempts),
            ));
        }

        if self.relaxation_floor < 0 {
            return Err(EngineError::invalid_control(
                "relaxation_floor",
                format!("不能为负数: {}", self.relaxation_floor),
            ));
        }

        if let Some(step) = self.relaxation_steps.iter().find(|s| **s < 0) {
            return Err(EngineError::invalid_control(
                "relaxation_steps",
                format!("包含负数: {}", step),
            ));
        }

        let w = &self.weights;
        for (field, value) in [
            ("weights.slack", w.slack),
            ("weights.balance", w.balance),
            ("weights.freshness", w.freshness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid_control(
                    field,
                    format!("必须为有限非负数: {}", value),
                ));
            }
        }
        if w.months_cap <= 0 {
            return Err(EngineError::invalid_control(
                "weights.months_cap",
                format!("必须大于 0: {}", w.months_cap),
            ));
        }

        Ok(())
    }

    /// 实际使用的放宽阶梯：严格低于原阈值、不低于下限、降序去重
    pub fn effective_relaxation_steps(&self) -> Vec<i64> {
        let mut steps: Vec<i64> = self
            .relaxation_steps
            .iter()
            .copied()
            .filter(|s| *s < self.time_lapse_months && *s >= self.relaxation_floor)
            .collect();
        steps.sort_unstable_by(|a, b| b.cmp(a));
        steps.dedup();
        steps
    }

    /// 洗牌种子
    pub fn seed(&self) -> u64 {
        self.shuffle_seed.unwrap_or(0x5EA7_0000_D1CE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ControlVariables {
        ControlVariables {
            next_dinner_date: NaiveDate::from_ymd_opt(2026, 11, 7),
            ..ControlVariables::default()
        }
    }

    #[test]
    fn test_default_requires_dinner_date() {
        let err = ControlVariables::default().validate().unwrap_err();
        assert_eq!(err, EngineError::MissingControl("next_dinner_date".to_string()));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let control = ControlVariables {
            time_lapse_months: -1,
            ..valid()
        };
        assert!(matches!(
            control.validate(),
            Err(EngineError::InvalidControl { ref field, .. }) if field == "time_lapse_months"
        ));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let control = ControlVariables {
            max_attempts: 0,
            ..valid()
        };
        assert!(control.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_weight() {
        let mut control = valid();
        control.weights.balance = f64::NAN;
        assert!(control.validate().is_err());
    }

    #[test]
    fn test_effective_steps_are_below_threshold_and_floor() {
        let control = ControlVariables {
            time_lapse_months: 12,
            relaxation_steps: vec![3, 24, 9, 6, 9, 12],
            relaxation_floor: 4,
            ..valid()
        };
        assert_eq!(control.effective_relaxation_steps(), vec![9, 6]);
    }

    #[test]
    fn test_json_defaults() {
        let control: ControlVariables =
            serde_json::from_str(r#"{"time_lapse_months": 18, "next_dinner_date": "2026-11-07"}"#)
                .unwrap();
        assert_eq!(control.time_lapse_months, 18);
        assert!(control.sort_guests);
        assert_eq!(control.max_attempts, 10);
        assert_eq!(control.relaxation_steps, DEFAULT_RELAXATION_STEPS.to_vec());
        assert_eq!(control.placement_policy, PlacementPolicy::Scored);
    }
}
