// ==========================================
// 晚宴分桌系统 - 运行上下文
// ==========================================
// 职责: 一次运行的全部内存状态（成员、房屋、相容性判定、阈值）
// 红线: 各阶段只通过本上下文读写状态，不存在全局可变状态
// ==========================================

use crate::domain::attendee::Attendee;
use crate::domain::house::{House, SeatCapacity};
use crate::engine::compatibility::CompatibilityOracle;
use std::collections::HashMap;

// ==========================================
// SeatingContext - 运行上下文
// ==========================================
#[derive(Debug, Clone)]
pub struct SeatingContext {
    attendees: Vec<Attendee>,
    index: HashMap<String, usize>,
    pub houses: Vec<House>,
    pub oracle: CompatibilityOracle,
    /// 原始间隔阈值（月）
    pub threshold: i64,
}

impl SeatingContext {
    /// 创建上下文
    ///
    /// # 参数
    /// - `attendees`: 主人与客人（客人的先后顺序即默认落座顺序）
    /// - `houses`: 房屋列表（表格顺序）
    pub fn new(
        attendees: Vec<Attendee>,
        houses: Vec<House>,
        oracle: CompatibilityOracle,
        threshold: i64,
    ) -> Self {
        let index = attendees
            .iter()
            .enumerate()
            .map(|(i, a)| (a.code.clone(), i))
            .collect();
        Self {
            attendees,
            index,
            houses,
            oracle,
            threshold,
        }
    }

    // ===== 成员查询 =====

    pub fn attendee(&self, code: &str) -> Option<&Attendee> {
        self.index.get(code).map(|i| &self.attendees[*i])
    }

    pub fn party_size(&self, code: &str) -> u32 {
        self.attendee(code).map(|a| a.party_size).unwrap_or(0)
    }

    pub fn is_seated(&self, code: &str) -> bool {
        self.attendee(code).map(|a| a.seated).unwrap_or(false)
    }

    pub fn guests(&self) -> impl Iterator<Item = &Attendee> {
        self.attendees.iter().filter(|a| !a.is_host())
    }

    /// 未落座客人（按成员列表顺序）
    pub fn unseated_guests(&self) -> Vec<String> {
        self.guests()
            .filter(|a| !a.seated)
            .map(|a| a.code.clone())
            .collect()
    }

    pub fn unseated_count(&self) -> usize {
        self.guests().filter(|a| !a.seated).count()
    }

    pub fn guest_count(&self) -> usize {
        self.guests().count()
    }

    // ===== 房屋查询 =====

    pub fn active_houses(&self) -> impl Iterator<Item = usize> + '_ {
        self.houses
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_active())
            .map(|(i, _)| i)
    }

    pub fn house_of(&self, code: &str) -> Option<usize> {
        self.houses.iter().position(|h| h.contains(code))
    }

    /// 客人能否以给定阈值落座该房屋（容量 + 成员位 + 与全部成员相容）
    pub fn fits(&self, house_idx: usize, code: &str, threshold: i64) -> bool {
        self.fits_house(&self.houses[house_idx], code, threshold)
    }

    /// 以 incoming 替换 outgoing 后能否成立（容量 + 与其余成员相容）
    pub fn fits_in_place_of(
        &self,
        house_idx: usize,
        outgoing: &str,
        incoming: &str,
        threshold: i64,
    ) -> bool {
        let house = &self.houses[house_idx];
        house.is_active()
            && !house.is_host(outgoing)
            && house.contains(outgoing)
            && house.fits_after_exchange(self.party_size(outgoing), self.party_size(incoming))
            && self.oracle.is_compatible_with_all(
                incoming,
                &house.members_without(outgoing),
                threshold,
            )
    }

    /// 模拟交换后的房屋副本（不修改上下文）
    pub fn exchanged(&self, house_idx: usize, outgoing: &str, incoming: &str) -> House {
        let mut house = self.houses[house_idx].clone();
        house.remove_guest(outgoing, self.party_size(outgoing));
        house.guests.push(incoming.to_string());
        house.occupied_seats = house.occupied_seats.saturating_add(self.party_size(incoming));
        house
    }

    /// 客人能否落座给定的（模拟）房屋
    pub fn fits_house(&self, house: &House, code: &str, threshold: i64) -> bool {
        house.can_seat(self.party_size(code))
            && self
                .oracle
                .is_compatible_with_all(code, &house.members(), threshold)
    }

    /// 以原始阈值完全相容的房屋
    pub fn compatible_houses(&self, code: &str) -> Vec<usize> {
        self.compatible_houses_at(code, self.threshold)
    }

    pub fn compatible_houses_at(&self, code: &str, threshold: i64) -> Vec<usize> {
        self.active_houses()
            .filter(|h| self.fits(*h, code, threshold))
            .collect()
    }

    /// 房屋内的非主人成员
    pub fn movable_members(&self, house_idx: usize) -> Vec<String> {
        self.houses[house_idx].guests.clone()
    }

    // ===== 状态变更 =====

    /// 落座客人并标记 seated
    pub fn seat(&mut self, house_idx: usize, code: &str) {
        let party_size = self.party_size(code);
        self.houses[house_idx].seat_guest(code, party_size);
        self.set_seated(code, true);
    }

    /// 从房屋移出客人并标记未落座
    pub fn unseat(&mut self, house_idx: usize, code: &str) -> bool {
        let party_size = self.party_size(code);
        let removed = self.houses[house_idx].remove_guest(code, party_size);
        if removed {
            self.set_seated(code, false);
        }
        removed
    }

    /// 将已落座客人从一个房屋移到另一个房屋
    pub fn relocate(&mut self, from: usize, to: usize, code: &str) {
        if self.unseat(from, code) {
            self.seat(to, code);
        }
    }

    pub fn set_seated(&mut self, code: &str, seated: bool) {
        if let Some(i) = self.index.get(code) {
            self.attendees[*i].seated = seated;
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::attendee::{GuestRecord, HostRecord};
    use crate::domain::pair::{ConnectionEntry, NeverMatchSet};
    use crate::engine::pair_history::PairHistoryIndex;
    use chrono::NaiveDate;

    /// 构建测试上下文
    ///
    /// - hosts: (代码, 自身占座, 座位数)
    /// - guests: (代码, 同行人数)
    /// - history: (成员1, 成员2, 间隔月数)
    /// - never: 永不同桌成员对
    pub fn context(
        hosts: &[(&str, u32, u32)],
        guests: &[(&str, u32)],
        history: &[(&str, &str, i64)],
        never: &[(&str, &str)],
        threshold: i64,
    ) -> SeatingContext {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut rows = Vec::new();
        for (a, b, months) in history {
            for mut row in ConnectionEntry::both_orientations(a, b, date, false) {
                row.months_apart = *months;
                rows.push(row);
            }
        }
        let index = PairHistoryIndex::build(&rows);

        let mut never_match = NeverMatchSet::new();
        for (a, b) in never {
            never_match.insert(a, b);
        }

        let mut attendees = Vec::new();
        let mut houses = Vec::new();
        for (i, (code, occupancy, seats)) in hosts.iter().enumerate() {
            let record = HostRecord {
                code: code.to_string(),
                self_occupancy: *occupancy,
                seat_capacity: *seats,
                order: None,
            };
            attendees.push(Attendee::host(&record, index.prior_connections(code)));
            houses.push(House::new(i as u32 + 1, *seats, code, *occupancy));
        }
        for (code, party_size) in guests {
            let record = GuestRecord {
                code: code.to_string(),
                party_size: *party_size,
                seated: false,
                order: None,
            };
            attendees.push(Attendee::guest(&record, index.prior_connections(code)));
        }

        SeatingContext::new(
            attendees,
            houses,
            CompatibilityOracle::new(never_match, index),
            threshold,
        )
    }

    /// 断言：容量、成员数、永不同桌、落座标记一致
    pub fn assert_valid(ctx: &SeatingContext) {
        use crate::domain::house::MAX_MEMBERS;

        for house in ctx.houses.iter().filter(|h| h.is_active()) {
            let seats: u32 = house.members().iter().map(|m| ctx.party_size(m)).sum();
            assert_eq!(seats, house.occupied_seats, "house {} seats", house.id);
            assert!(house.occupied_seats <= house.capacity, "house {} over capacity", house.id);
            assert!(house.member_count() <= MAX_MEMBERS);
            let members = house.members();
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    assert!(
                        !ctx.oracle.never_match().contains(a, b),
                        "never-match pair {}-{} co-seated",
                        a,
                        b
                    );
                }
            }
        }
        for guest in ctx.guests() {
            assert_eq!(guest.seated, ctx.house_of(&guest.code).is_some(), "{}", guest.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::context;

    #[test]
    fn test_fits_checks_capacity_and_members() {
        let mut ctx = context(&[("H1", 1, 3)], &[("G1", 2), ("G2", 1), ("G3", 1)], &[("G2", "G3", 3)], &[], 12);
        assert!(ctx.fits(0, "G1", 12));
        ctx.seat(0, "G1");
        assert!(ctx.is_seated("G1"));
        assert_eq!(ctx.houses[0].occupied_seats, 3);
        assert!(!ctx.fits(0, "G2", 12));
        assert_eq!(ctx.unseated_guests(), vec!["G2".to_string(), "G3".to_string()]);
    }

    #[test]
    fn test_relocate_keeps_seated_flag() {
        let mut ctx = context(&[("H1", 1, 4), ("H2", 1, 4)], &[("G1", 1)], &[], &[], 12);
        ctx.seat(0, "G1");
        ctx.relocate(0, 1, "G1");
        assert_eq!(ctx.house_of("G1"), Some(1));
        assert!(ctx.is_seated("G1"));
        assert!(ctx.unseat(1, "G1"));
        assert!(!ctx.is_seated("G1"));
        assert_eq!(ctx.houses[1].occupied_seats, 1);
    }

    #[test]
    fn test_fits_in_place_of() {
        let mut ctx = context(&[("H1", 1, 3)], &[("G1", 2), ("G2", 2), ("G3", 1)], &[("H1", "G3", 1)], &[], 12);
        ctx.seat(0, "G1");
        assert!(ctx.fits_in_place_of(0, "G1", "G2", 12));
        assert!(!ctx.fits_in_place_of(0, "G1", "G3", 12));
        assert!(!ctx.fits_in_place_of(0, "H1", "G2", 12));
    }
}
