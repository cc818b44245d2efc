// ==========================================
// 晚宴分桌系统 - 历史同桌索引
// ==========================================
// 职责: 成员对 -> 最近一次同桌间隔月数；成员 -> 历史同桌次数
// 输入: 台账行 (ConnectionEntry)
// 输出: 可序列化的索引（缓存于 index_cache 表）
// ==========================================

use crate::domain::pair::{ConnectionEntry, PairKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// PairHistoryIndex - 历史同桌索引
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairHistoryIndex {
    /// 成员对 -> 最小间隔月数
    months: HashMap<PairKey, i64>,
    /// 成员 -> 台账中以其开头的行数
    prior: HashMap<String, u32>,
    /// 收窄后预计算的受限成员对（仅对 base 阈值有效，不入缓存）
    #[serde(skip)]
    constrained: Option<ConstrainedPairs>,
}

#[derive(Debug, Clone, PartialEq)]
struct ConstrainedPairs {
    threshold: i64,
    pairs: HashSet<PairKey>,
}

impl PairHistoryIndex {
    /// 从台账行构建索引
    ///
    /// 同一成员对出现多次时保留最小月数；
    /// 历史同桌次数按有向键的第一个成员计数。
    pub fn build(entries: &[ConnectionEntry]) -> Self {
        let mut months: HashMap<PairKey, i64> = HashMap::new();
        let mut prior: HashMap<String, u32> = HashMap::new();

        for entry in entries {
            if entry.owner.is_empty() || entry.partner.is_empty() {
                continue;
            }
            months
                .entry(entry.pair_key())
                .and_modify(|m| *m = (*m).min(entry.months_apart))
                .or_insert(entry.months_apart);
            *prior.entry(entry.owner.clone()).or_insert(0) += 1;
        }

        Self {
            months,
            prior,
            constrained: None,
        }
    }

    /// 两成员最近一次同桌的间隔月数（None = 从未同桌）
    pub fn months_apart(&self, a: &str, b: &str) -> Option<i64> {
        self.months.get(&PairKey::new(a, b)).copied()
    }

    pub fn months_apart_by_key(&self, key: &PairKey) -> Option<i64> {
        self.months.get(key).copied()
    }

    /// 成员的历史同桌次数
    pub fn prior_connections(&self, code: &str) -> u32 {
        self.prior.get(code).copied().unwrap_or(0)
    }

    pub fn pair_count(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// 收窄到本次参会成员，并预计算 base 阈值下的受限成员对
    ///
    /// # 参数
    /// - `codes`: 本次参会成员代码
    /// - `threshold`: 原始间隔阈值（月）
    pub fn narrowed<'a, I>(&self, codes: I, threshold: i64) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: HashSet<&str> = codes.into_iter().collect();

        let months: HashMap<PairKey, i64> = self
            .months
            .iter()
            .filter(|(key, _)| {
                let (a, b) = key.members();
                present.contains(a) && present.contains(b)
            })
            .map(|(key, m)| (key.clone(), *m))
            .collect();

        let prior: HashMap<String, u32> = self
            .prior
            .iter()
            .filter(|(code, _)| present.contains(code.as_str()))
            .map(|(code, n)| (code.clone(), *n))
            .collect();

        let pairs: HashSet<PairKey> = months
            .iter()
            .filter(|(_, m)| **m < threshold)
            .map(|(key, _)| key.clone())
            .collect();

        Self {
            months,
            prior,
            constrained: Some(ConstrainedPairs { threshold, pairs }),
        }
    }

    /// 预计算表命中时直接返回是否受限（Some(true) = 间隔不足）
    pub fn is_constrained(&self, key: &PairKey, threshold: i64) -> Option<bool> {
        self.constrained
            .as_ref()
            .filter(|c| c.threshold == threshold)
            .map(|c| c.pairs.contains(key))
    }
}
