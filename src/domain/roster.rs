// ==========================================
// 晚宴分桌系统 - 参会名单
// ==========================================
// 职责: 一次运行的全部表格输入（主人、客人、座位表、永不同桌列表）
// ==========================================

use crate::domain::attendee::{GuestRecord, HostRecord};
use crate::domain::house::GridRow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub hosts: Vec<HostRecord>,
    pub guests: Vec<GuestRecord>,
    #[serde(default)]
    pub grid: Vec<GridRow>,
    /// 单向 "A-B" 条目，由引擎对称化
    #[serde(default)]
    pub never_match: Vec<String>,
}

impl Roster {
    /// 全部成员代码（主人在前）
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.hosts
            .iter()
            .map(|h| h.code.as_str())
            .chain(self.guests.iter().map(|g| g.code.as_str()))
    }

    pub fn attendee_count(&self) -> usize {
        self.hosts.len() + self.guests.len()
    }
}
