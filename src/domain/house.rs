// ==========================================
// 晚宴分桌系统 - 房屋（座位组）领域模型
// ==========================================
// 红线: occupied_seats == Σ party_size 且 occupied_seats <= capacity
// 红线: 成员数（含主人）不超过 6
// ==========================================

use serde::{Deserialize, Serialize};

/// 每个房屋的成员上限（slot 0 为主人）
pub const MAX_MEMBERS: usize = 6;

/// 表格中客人列数（Guest 1..Guest 5）
pub const GUEST_SLOTS: usize = MAX_MEMBERS - 1;

/// 单个房屋座位数与单组同行人数的上限
pub const MAX_SEAT_CAPACITY: u32 = 1_000;

// ==========================================
// House - 座位组
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: u32,
    pub capacity: u32,
    pub occupied_seats: u32,
    pub host: Option<String>, // None 表示房屋未启用
    pub guests: Vec<String>,
}

// ==========================================
// Trait: SeatCapacity
// ==========================================
// 用途: 所有落座/换位动作的容量检查接口
pub trait SeatCapacity {
    /// 能否再容纳一组 party_size 人（座位 + 成员名额）
    fn can_seat(&self, party_size: u32) -> bool;

    /// 剩余座位数
    fn remaining_seats(&self) -> u32;

    /// 是否还有成员名额
    fn has_member_slot(&self) -> bool;

    /// 座位或成员名额已满
    fn is_full(&self) -> bool;
}

impl House {
    /// 以主人创建房屋，主人自身占座计入 occupied_seats
    pub fn new(id: u32, capacity: u32, host: &str, self_occupancy: u32) -> Self {
        Self {
            id,
            capacity,
            occupied_seats: self_occupancy,
            host: Some(host.to_string()),
            guests: Vec::new(),
        }
    }

    /// 空行（无主人）
    pub fn inactive(id: u32) -> Self {
        Self {
            id,
            capacity: 0,
            occupied_seats: 0,
            host: None,
            guests: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.host.is_some()
    }

    /// 全部成员，主人在前
    pub fn members(&self) -> Vec<&str> {
        self.host
            .iter()
            .map(|h| h.as_str())
            .chain(self.guests.iter().map(|g| g.as_str()))
            .collect()
    }

    /// 去掉某个成员后的成员列表（用于模拟换位）
    pub fn members_without(&self, code: &str) -> Vec<&str> {
        self.members().into_iter().filter(|m| *m != code).collect()
    }

    pub fn member_count(&self) -> usize {
        self.guests.len() + usize::from(self.host.is_some())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.host.as_deref() == Some(code) || self.guests.iter().any(|g| g == code)
    }

    pub fn is_host(&self, code: &str) -> bool {
        self.host.as_deref() == Some(code)
    }

    /// 换入 incoming、换出 outgoing 后是否仍满足座位约束
    pub fn fits_after_exchange(&self, outgoing_party: u32, incoming_party: u32) -> bool {
        self.occupied_seats
            .saturating_sub(outgoing_party)
            .checked_add(incoming_party)
            .is_some_and(|seats| seats <= self.capacity)
    }

    /// 落座客人（调用方已完成相容性检查）
    pub fn seat_guest(&mut self, code: &str, party_size: u32) {
        debug_assert!(self.can_seat(party_size));
        self.guests.push(code.to_string());
        self.occupied_seats += party_size;
    }

    /// 移出客人，返回是否找到
    pub fn remove_guest(&mut self, code: &str, party_size: u32) -> bool {
        match self.guests.iter().position(|g| g == code) {
            Some(pos) => {
                self.guests.remove(pos);
                self.occupied_seats = self.occupied_seats.saturating_sub(party_size);
                true
            }
            None => false,
        }
    }
}

impl SeatCapacity for House {
    fn can_seat(&self, party_size: u32) -> bool {
        self.is_active()
            && self.has_member_slot()
            && party_size <= self.remaining_seats()
    }

    fn remaining_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied_seats)
    }

    fn has_member_slot(&self) -> bool {
        self.member_count() < MAX_MEMBERS
    }

    fn is_full(&self) -> bool {
        !self.has_member_slot() || self.remaining_seats() == 0
    }
}

// ==========================================
// GridRow - 表格中的一行座位数据
// ==========================================
// 列: House | Seats | Seated | Host | Guest 1..Guest 5（均可为空）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub house_id: Option<u32>,
    pub capacity: Option<u32>,
    pub occupied_seats: Option<u32>,
    pub host: Option<String>,
    pub guests: Vec<Option<String>>,
}

impl GridRow {
    pub fn is_blank(&self) -> bool {
        self.host.is_none() && self.guests.iter().all(|g| g.is_none())
    }

    pub fn guest_codes(&self) -> impl Iterator<Item = &str> {
        self.guests.iter().filter_map(|g| g.as_deref())
    }
}

impl From<&House> for GridRow {
    fn from(house: &House) -> Self {
        let mut guests: Vec<Option<String>> = house.guests.iter().cloned().map(Some).collect();
        guests.resize(GUEST_SLOTS, None);
        Self {
            house_id: Some(house.id),
            capacity: house.host.as_ref().map(|_| house.capacity),
            occupied_seats: house.host.as_ref().map(|_| house.occupied_seats),
            host: house.host.clone(),
            guests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_house_counts_host_seats() {
        let house = House::new(1, 6, "H01", 2);
        assert_eq!(house.occupied_seats, 2);
        assert_eq!(house.remaining_seats(), 4);
        assert_eq!(house.members(), vec!["H01"]);
        assert!(house.is_active());
    }

    #[test]
    fn test_can_seat_respects_capacity() {
        let mut house = House::new(1, 4, "H01", 1);
        assert!(house.can_seat(3));
        assert!(!house.can_seat(4));
        house.seat_guest("G01", 2);
        assert_eq!(house.occupied_seats, 3);
        assert!(house.can_seat(1));
        assert!(!house.can_seat(2));
    }

    #[test]
    fn test_member_slot_limit() {
        let mut house = House::new(1, 20, "H01", 1);
        for i in 0..GUEST_SLOTS {
            house.seat_guest(&format!("G{:02}", i), 1);
        }
        assert_eq!(house.member_count(), MAX_MEMBERS);
        assert!(!house.has_member_slot());
        assert!(!house.can_seat(1));
        assert!(house.is_full());
    }

    #[test]
    fn test_inactive_house_never_seats() {
        let house = House::inactive(7);
        assert!(!house.is_active());
        assert!(!house.can_seat(1));
        assert!(house.members().is_empty());
    }

    #[test]
    fn test_remove_guest_restores_seats() {
        let mut house = House::new(1, 6, "H01", 1);
        house.seat_guest("G01", 2);
        assert!(house.remove_guest("G01", 2));
        assert!(!house.remove_guest("G01", 2));
        assert_eq!(house.occupied_seats, 1);
        assert!(!house.contains("G01"));
    }

    #[test]
    fn test_fits_after_exchange() {
        let mut house = House::new(1, 4, "H01", 1);
        house.seat_guest("G01", 1);
        house.seat_guest("G02", 2);
        assert!(!house.fits_after_exchange(1, 2));
        assert!(house.fits_after_exchange(2, 2));
    }

    #[test]
    fn test_oversized_party_never_fits() {
        let mut house = House::new(1, 4, "H01", 1);
        assert!(!house.can_seat(u32::MAX));
        house.seat_guest("G01", 2);
        assert!(!house.fits_after_exchange(2, u32::MAX));
        assert_eq!(house.occupied_seats, 3);
    }

    #[test]
    fn test_grid_row_from_house_pads_slots() {
        let mut house = House::new(3, 6, "H01", 1);
        house.seat_guest("G01", 1);
        let row = GridRow::from(&house);
        assert_eq!(row.house_id, Some(3));
        assert_eq!(row.occupied_seats, Some(2));
        assert_eq!(row.guests.len(), GUEST_SLOTS);
        assert_eq!(row.guest_codes().collect::<Vec<_>>(), vec!["G01"]);
    }
}
