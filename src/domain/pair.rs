// ==========================================
// 晚宴分桌系统 - 成员对领域模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ==========================================
// PairKey - 无序成员对
// ==========================================
// 红线: PairKey::new(a, b) == PairKey::new(b, a)
// 序列化格式: "codeA-codeB"（按字典序规范化）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { low: a.to_string(), high: b.to_string() }
        } else {
            Self { low: b.to_string(), high: a.to_string() }
        }
    }

    /// 解析 "codeA-codeB"，以第一个 '-' 分隔
    pub fn parse(raw: &str) -> Option<Self> {
        let (a, b) = raw.trim().split_once('-')?;
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            return None;
        }
        Some(Self::new(a, b))
    }

    pub fn members(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.low == code || self.high == code
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

impl TryFrom<String> for PairKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PairKey::parse(&value).ok_or_else(|| format!("无效的成员对键: {}", value))
    }
}

impl From<PairKey> for String {
    fn from(key: PairKey) -> Self {
        key.to_string()
    }
}

// ==========================================
// NeverMatchSet - 永不同桌集合
// ==========================================
// 红线: 成员对双向检查；任何放宽都不能绕过
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeverMatchSet {
    pairs: HashSet<PairKey>,
}

impl NeverMatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从单向的 "A-B" 列表构建（引擎负责对称化）
    ///
    /// # 返回
    /// (集合, 无法解析的原始条目)
    pub fn from_entries<I, S>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        let mut rejected = Vec::new();
        for entry in entries {
            let raw = entry.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            match PairKey::parse(raw) {
                Some(key) => {
                    set.pairs.insert(key);
                }
                None => rejected.push(raw.to_string()),
            }
        }
        (set, rejected)
    }

    pub fn insert(&mut self, a: &str, b: &str) {
        self.pairs.insert(PairKey::new(a, b));
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.pairs.contains(&PairKey::new(a, b))
    }

    pub fn contains_key(&self, key: &PairKey) -> bool {
        self.pairs.contains(key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairKey> {
        self.pairs.iter()
    }
}

// ==========================================
// ConnectionEntry - 历史同桌台账行
// ==========================================
// 每次同桌写入两行（owner-partner 与 partner-owner 各一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub owner: String,        // 键的第一个成员
    pub partner: String,      // 键的第二个成员
    pub member_1: String,     // 原始记录成员1
    pub member_2: String,     // 原始记录成员2
    pub year: i32,
    pub dinner_date: NaiveDate,
    pub host_role: bool,      // 成员1为主人
    pub months_apart: i64,
}

impl ConnectionEntry {
    /// 有向键 "owner-partner"
    pub fn oriented_key(&self) -> String {
        format!("{}-{}", self.owner, self.partner)
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.owner, &self.partner)
    }

    /// 为一次同桌生成双向两行
    pub fn both_orientations(
        member_1: &str,
        member_2: &str,
        dinner_date: NaiveDate,
        host_role: bool,
    ) -> [ConnectionEntry; 2] {
        use chrono::Datelike;
        let make = |owner: &str, partner: &str| ConnectionEntry {
            owner: owner.to_string(),
            partner: partner.to_string(),
            member_1: member_1.to_string(),
            member_2: member_2.to_string(),
            year: dinner_date.year(),
            dinner_date,
            host_role,
            months_apart: 0,
        };
        [make(member_1, member_2), make(member_2, member_1)]
    }

    /// 到下次晚宴的间隔月数: (y2 - y1) * 12 + (m2 - m1)
    pub fn months_until(&self, next_dinner: NaiveDate) -> i64 {
        months_between(self.dinner_date, next_dinner)
    }
}

/// 两个日期之间的自然月差（忽略日）
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    use chrono::Datelike;
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month() as i32 - from.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_symmetric() {
        assert_eq!(PairKey::new("B07", "A01"), PairKey::new("A01", "B07"));
        assert_eq!(PairKey::new("B07", "A01").to_string(), "A01-B07");
    }

    #[test]
    fn test_pair_key_parse() {
        assert_eq!(PairKey::parse(" X1 - Y2 "), Some(PairKey::new("Y2", "X1")));
        assert_eq!(PairKey::parse("X1"), None);
        assert_eq!(PairKey::parse("-Y2"), None);
    }

    #[test]
    fn test_pair_key_json_roundtrip_as_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(PairKey::new("B", "A"), 7_i64);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"A-B":7}"#);
        let back: std::collections::HashMap<PairKey, i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&PairKey::new("A", "B")), Some(&7));
    }

    #[test]
    fn test_never_match_is_bidirectional() {
        let (set, rejected) = NeverMatchSet::from_entries(vec!["A-B", "", "broken"]);
        assert!(set.contains("A", "B"));
        assert!(set.contains("B", "A"));
        assert!(!set.contains("A", "C"));
        assert_eq!(set.len(), 1);
        assert_eq!(rejected, vec!["broken".to_string()]);
    }

    #[test]
    fn test_connection_entry_both_orientations() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let [forward, backward] = ConnectionEntry::both_orientations("H1", "G1", date, true);
        assert_eq!(forward.oriented_key(), "H1-G1");
        assert_eq!(backward.oriented_key(), "G1-H1");
        assert_eq!(forward.pair_key(), backward.pair_key());
        assert_eq!(backward.member_1, "H1");
        assert_eq!(forward.year, 2025);
    }

    #[test]
    fn test_months_between_ignores_day() {
        let from = NaiveDate::from_ymd_opt(2024, 11, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(months_between(from, to), 3);
        assert_eq!(months_between(to, to), 0);

        let [entry, _] = ConnectionEntry::both_orientations("A", "B", from, false);
        assert_eq!(entry.months_until(NaiveDate::from_ymd_opt(2026, 11, 7).unwrap()), 24);
    }
}
