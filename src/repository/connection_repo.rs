// ==========================================
// 晚宴分桌系统 - 历史同桌台账仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 每次同桌写入两行（两个方向的有向键）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::house::House;
use crate::domain::pair::{months_between, ConnectionEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// ConnectionRepository - 台账仓储
// ==========================================
/// 台账仓储
/// 职责: 管理 connections 表的读写
pub struct ConnectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConnectionRepository {
    /// 创建新的 ConnectionRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取全部台账（按有向键、间隔月数升序）
    pub fn list_entries_sorted(&self) -> RepositoryResult<Vec<ConnectionEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT owner, partner, member_1, member_2, year, dinner_date, host_role, months_apart
            FROM connections
            ORDER BY pair_key, months_apart, id
            "#,
        )?;

        let rows = stmt.query_map([], map_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row??);
        }
        Ok(entries)
    }

    /// 追加台账行
    ///
    /// # 返回
    /// 写入的行数
    pub fn append_entries(&self, entries: &[ConnectionEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        insert_entries(&tx, entries)?;
        tx.commit()?;
        Ok(entries.len())
    }

    /// 以新台账整体替换旧台账（同一事务，失败时旧台账保持不变）
    ///
    /// # 返回
    /// (删除的行数, 写入的行数)
    pub fn replace_entries(&self, entries: &[ConnectionEntry]) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM connections", [])?;
        insert_entries(&tx, entries)?;
        tx.commit()?;
        Ok((removed, entries.len()))
    }

    /// 晚宴结束后记录同桌：每个启用房屋的每对成员写入双向两行
    ///
    /// 第一个成员为主人时标记 host_role。
    pub fn record_dinner(&self, houses: &[House], dinner_date: NaiveDate) -> RepositoryResult<usize> {
        let mut entries = Vec::new();
        for house in houses.iter().filter(|h| h.is_active()) {
            let members = house.members();
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    let host_role = house.is_host(a);
                    entries.extend(ConnectionEntry::both_orientations(a, b, dinner_date, host_role));
                }
            }
        }
        self.append_entries(&entries)
    }

    /// 以下次晚宴日期重算全部 months_apart
    ///
    /// # 返回
    /// 更新的行数
    pub fn refresh_months_apart(&self, next_dinner: NaiveDate) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let dated: Vec<(i64, String)> = {
            let mut stmt = tx.prepare("SELECT id, dinner_date FROM connections")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut updated = 0;
        {
            let mut stmt = tx.prepare("UPDATE connections SET months_apart = ?1 WHERE id = ?2")?;
            for (id, raw_date) in &dated {
                let date = parse_date(raw_date)?;
                let months = months_between(date, next_dinner);
                updated += stmt.execute(params![months, id])?;
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    /// 台账行数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM connections", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn insert_entries(tx: &Transaction<'_>, entries: &[ConnectionEntry]) -> RepositoryResult<()> {
    let mut stmt = tx.prepare(
        r#"
        INSERT INTO connections (
            pair_key, owner, partner, member_1, member_2,
            year, dinner_date, host_role, months_apart
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )?;
    for entry in entries {
        stmt.execute(params![
            entry.oriented_key(),
            entry.owner,
            entry.partner,
            entry.member_1,
            entry.member_2,
            entry.year,
            entry.dinner_date.format(DATE_FORMAT).to_string(),
            entry.host_role,
            entry.months_apart,
        ])?;
    }
    Ok(())
}

fn parse_date(raw: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: "dinner_date".to_string(),
        message: format!("{}: {}", raw, e),
    })
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<ConnectionEntry>> {
    let owner: String = row.get(0)?;
    let partner: String = row.get(1)?;
    let member_1: String = row.get(2)?;
    let member_2: String = row.get(3)?;
    let year: i32 = row.get(4)?;
    let raw_date: String = row.get(5)?;
    let host_role: bool = row.get(6)?;
    let months_apart: i64 = row.get(7)?;

    Ok(parse_date(&raw_date).map(|dinner_date| ConnectionEntry {
        owner,
        partner,
        member_1,
        member_2,
        year,
        dinner_date,
        host_role,
        months_apart,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn repo() -> ConnectionRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConnectionRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_dinner_writes_both_orientations() {
        let repo = repo();
        let mut house = House::new(1, 6, "H1", 1);
        house.seat_guest("G1", 1);
        house.seat_guest("G2", 2);
        let written = repo
            .record_dinner(&[house, House::inactive(2)], date(2025, 3, 8))
            .unwrap();

        // 3 对成员 × 2 个方向
        assert_eq!(written, 6);
        assert_eq!(repo.count().unwrap(), 6);

        let entries = repo.list_entries_sorted().unwrap();
        let host_rows: Vec<_> = entries.iter().filter(|e| e.host_role).collect();
        assert_eq!(host_rows.len(), 4);
        assert!(host_rows.iter().all(|e| e.member_1 == "H1"));
        assert_eq!(entries[0].oriented_key(), "G1-G2");
    }

    #[test]
    fn test_replace_entries_rolls_back_on_failure() {
        let repo = repo();
        repo.append_entries(&ConnectionEntry::both_orientations("A", "B", date(2024, 10, 12), false))
            .unwrap();
        repo.get_conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON connections
                 WHEN NEW.owner = 'BAD'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let incoming: Vec<ConnectionEntry> =
            ConnectionEntry::both_orientations("C", "D", date(2025, 3, 8), false)
                .into_iter()
                .chain(ConnectionEntry::both_orientations("BAD", "E", date(2025, 3, 8), false))
                .collect();
        assert!(repo.replace_entries(&incoming).is_err());
        let kept = repo.list_entries_sorted().unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| e.owner == "A" || e.owner == "B"));

        let (removed, written) = repo
            .replace_entries(&ConnectionEntry::both_orientations("C", "D", date(2025, 3, 8), false))
            .unwrap();
        assert_eq!((removed, written), (2, 2));
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_refresh_months_apart() {
        let repo = repo();
        let entries = ConnectionEntry::both_orientations("A", "B", date(2024, 10, 12), false);
        repo.append_entries(&entries).unwrap();

        assert_eq!(repo.refresh_months_apart(date(2025, 4, 5)).unwrap(), 2);
        let entries = repo.list_entries_sorted().unwrap();
        assert!(entries.iter().all(|e| e.months_apart == 6));
    }

    #[test]
    fn test_list_sorted_by_key_then_months() {
        let repo = repo();
        let mut rows = Vec::new();
        for (d, months) in [(date(2025, 1, 1), 9), (date(2024, 1, 1), 21)] {
            for mut row in ConnectionEntry::both_orientations("B", "A", d, false) {
                row.months_apart = months;
                rows.push(row);
            }
        }
        rows.reverse();
        repo.append_entries(&rows).unwrap();

        let keys: Vec<(String, i64)> = repo
            .list_entries_sorted()
            .unwrap()
            .into_iter()
            .map(|e| (e.oriented_key(), e.months_apart))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A-B".to_string(), 9),
                ("A-B".to_string(), 21),
                ("B-A".to_string(), 9),
                ("B-A".to_string(), 21),
            ]
        );
    }
}
