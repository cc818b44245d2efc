// ==========================================
// 晚宴分桌系统 - 参会成员领域模型
// ==========================================

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};

// ==========================================
// HostRecord - 主人记录（外部表格输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub code: String,        // 成员代码
    pub self_occupancy: u32, // 主人自身占座
    pub seat_capacity: u32,  // 房屋座位数
    #[serde(default)]
    pub order: Option<i64>,  // 外部次序（排序并列时使用）
}

// ==========================================
// GuestRecord - 客人记录（外部表格输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub code: String,     // 成员代码
    pub party_size: u32,  // 同行人数
    pub seated: bool,     // 落座标记 (Yes/No)
    #[serde(default)]
    pub order: Option<i64>,
}

// ==========================================
// Attendee - 引擎内部的参会成员
// ==========================================
// 生命周期: 每次运行从外部表格加载; seated 仅在内存中修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub code: String,
    pub party_size: u32,
    pub role: Role,
    pub seated: bool,
    pub prior_connections: u32, // 历史同桌次数（来自 PairHistoryIndex）
    pub order: Option<i64>,
}

impl Attendee {
    pub fn host(record: &HostRecord, prior_connections: u32) -> Self {
        Self {
            code: record.code.clone(),
            party_size: record.self_occupancy,
            role: Role::Host {
                seat_capacity: record.seat_capacity,
                self_occupancy: record.self_occupancy,
            },
            // 主人锚定房屋，始终视为已落座
            seated: true,
            prior_connections,
            order: record.order,
        }
    }

    pub fn guest(record: &GuestRecord, prior_connections: u32) -> Self {
        Self {
            code: record.code.clone(),
            party_size: record.party_size,
            role: Role::Guest,
            seated: record.seated,
            prior_connections,
            order: record.order,
        }
    }

    pub fn is_host(&self) -> bool {
        self.role.is_host()
    }

    pub fn seat_capacity(&self) -> Option<u32> {
        match self.role {
            Role::Host { seat_capacity, .. } => Some(seat_capacity),
            Role::Guest => None,
        }
    }

    /// 单人（party_size = 1）
    pub fn is_single(&self) -> bool {
        self.party_size == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_is_always_seated() {
        let record = HostRecord {
            code: "H01".to_string(),
            self_occupancy: 2,
            seat_capacity: 8,
            order: None,
        };
        let host = Attendee::host(&record, 4);
        assert!(host.is_host());
        assert!(host.seated);
        assert_eq!(host.party_size, 2);
        assert_eq!(host.seat_capacity(), Some(8));
    }

    #[test]
    fn test_guest_keeps_seated_flag() {
        let record = GuestRecord {
            code: "G01".to_string(),
            party_size: 1,
            seated: false,
            order: Some(3),
        };
        let guest = Attendee::guest(&record, 0);
        assert!(!guest.is_host());
        assert!(!guest.seated);
        assert!(guest.is_single());
        assert_eq!(guest.seat_capacity(), None);
    }
}
