// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、名单构建与不变量检查
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use dinner_grid::config::ControlVariables;
use dinner_grid::db::open_sqlite_connection;
use dinner_grid::domain::{ConnectionEntry, GuestRecord, HostRecord, NeverMatchSet, Roster, SeatingOutcome};
use dinner_grid::engine::PairHistoryIndex;
use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();
    open_sqlite_connection(&db_path)?;
    Ok((temp_file, db_path))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn host(code: &str, self_occupancy: u32, seat_capacity: u32) -> HostRecord {
    HostRecord {
        code: code.to_string(),
        self_occupancy,
        seat_capacity,
        order: None,
    }
}

pub fn guest(code: &str, party_size: u32) -> GuestRecord {
    GuestRecord {
        code: code.to_string(),
        party_size,
        seated: false,
        order: None,
    }
}

/// 名单（不含座位表）
pub fn roster(hosts: Vec<HostRecord>, guests: Vec<GuestRecord>, never_match: &[(&str, &str)]) -> Roster {
    Roster {
        hosts,
        guests,
        grid: Vec::new(),
        never_match: never_match.iter().map(|(a, b)| format!("{}-{}", a, b)).collect(),
    }
}

/// 台账行（双向），months_apart 直接给定
pub fn ledger(rows: &[(&str, &str, i64)]) -> Vec<ConnectionEntry> {
    let mut entries = Vec::new();
    for (a, b, months) in rows {
        for mut row in ConnectionEntry::both_orientations(a, b, date(2025, 6, 14), false) {
            row.months_apart = *months;
            entries.push(row);
        }
    }
    entries
}

pub fn history(rows: &[(&str, &str, i64)]) -> PairHistoryIndex {
    PairHistoryIndex::build(&ledger(rows))
}

pub fn control(threshold: i64) -> ControlVariables {
    ControlVariables {
        time_lapse_months: threshold,
        next_dinner_date: Some(date(2026, 11, 7)),
        ..ControlVariables::default()
    }
}

/// 检查输出的全部不变量
///
/// 1. 座位与成员上限
/// 2. 永不同桌成员对不同屋
/// 3. 每位客人最多出现一次，落座标记与座位表一致
/// 4. 落座 + 未落座 = 全部客人
pub fn assert_invariants(roster: &Roster, outcome: &SeatingOutcome) {
    let (never_match, _) = NeverMatchSet::from_entries(&roster.never_match);

    for house in outcome.houses.iter().filter(|h| h.is_active()) {
        let host = roster
            .hosts
            .iter()
            .find(|h| Some(h.code.as_str()) == house.host.as_deref())
            .expect("house host must be in roster");
        let guest_seats: u32 = house
            .guests
            .iter()
            .map(|code| roster.guests.iter().find(|g| &g.code == code).unwrap().party_size)
            .sum();
        assert_eq!(house.occupied_seats, host.self_occupancy + guest_seats, "house {}", house.id);
        assert!(house.occupied_seats <= house.capacity, "house {} over capacity", house.id);
        assert!(house.member_count() <= 6, "house {} has too many members", house.id);

        let members = house.members();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                assert!(!never_match.contains(a, b), "never-match pair {}-{} co-seated", a, b);
            }
        }
    }

    let mut seen = HashSet::new();
    for house in &outcome.houses {
        for code in &house.guests {
            assert!(seen.insert(code.clone()), "{} seated twice", code);
        }
    }

    let residual: HashSet<&str> = outcome.residual.iter().map(|r| r.code.as_str()).collect();
    for record in &outcome.guests {
        let housed = seen.contains(&record.code);
        assert_eq!(record.seated, housed, "seated flag of {}", record.code);
        assert_ne!(housed, residual.contains(record.code.as_str()), "conservation for {}", record.code);
    }
    assert_eq!(seen.len() + residual.len(), roster.guests.len());
}

/// 写出 CSV 名单目录
pub fn write_roster_dir(dir: &Path, hosts: &str, guests: &str, grid: Option<&str>, never_match: Option<&str>) {
    fs::write(dir.join("hosts.csv"), hosts).unwrap();
    fs::write(dir.join("guests.csv"), guests).unwrap();
    if let Some(grid) = grid {
        fs::write(dir.join("grid.csv"), grid).unwrap();
    }
    if let Some(never_match) = never_match {
        fs::write(dir.join("never_match.csv"), never_match).unwrap();
    }
}
