// ==========================================
// 晚宴分桌系统 - 历史同桌索引缓存仓储
// ==========================================
// 职责: 将 PairHistoryIndex 以单条 JSON 记录缓存在 index_cache 表
// 红线: 缓存缺失或损坏时从台账重建，不向调用方报错
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::pair_history::PairHistoryIndex;
use crate::repository::connection_repo::ConnectionRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// 缓存键
pub const PAIR_HISTORY_CACHE_KEY: &str = "pair_history_index";

pub struct IndexCacheRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IndexCacheRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取缓存
    ///
    /// # 返回
    /// - Ok(None): 缓存不存在
    /// - Err(SerializationError): 缓存内容无法解析
    pub fn load(&self) -> RepositoryResult<Option<PairHistoryIndex>> {
        let conn = self.get_conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM index_cache WHERE cache_key = ?1",
                params![PAIR_HISTORY_CACHE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 写入缓存（覆盖）
    pub fn store(&self, index: &PairHistoryIndex) -> RepositoryResult<()> {
        let payload = serde_json::to_string(index)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO index_cache (cache_key, payload, built_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(cache_key) DO UPDATE SET
                payload = excluded.payload,
                built_at = excluded.built_at
            "#,
            params![PAIR_HISTORY_CACHE_KEY, payload],
        )?;
        Ok(())
    }

    /// 显式失效
    pub fn invalidate(&self) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let removed = conn.execute(
            "DELETE FROM index_cache WHERE cache_key = ?1",
            params![PAIR_HISTORY_CACHE_KEY],
        )?;
        Ok(removed > 0)
    }

    /// 从台账重建并写入缓存
    pub fn rebuild(&self, ledger: &ConnectionRepository) -> RepositoryResult<PairHistoryIndex> {
        let entries = ledger.list_entries_sorted()?;
        let index = PairHistoryIndex::build(&entries);
        self.store(&index)?;
        if index.is_empty() {
            info!("台账为空，索引缓存为空表");
        } else {
            info!(rows = entries.len(), pairs = index.pair_count(), "历史同桌索引已重建");
        }
        Ok(index)
    }

    /// 读取缓存；缺失或损坏时重建
    pub fn load_or_rebuild(&self, ledger: &ConnectionRepository) -> RepositoryResult<PairHistoryIndex> {
        match self.load() {
            Ok(Some(index)) => Ok(index),
            Ok(None) => self.rebuild(ledger),
            Err(RepositoryError::SerializationError(message)) => {
                warn!(error = %message, "索引缓存损坏，从台账重建");
                self.rebuild(ledger)
            }
            Err(e) => Err(e),
        }
    }
}
