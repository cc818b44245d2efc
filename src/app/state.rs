// ==========================================
// 晚宴分桌系统 - 应用状态
// ==========================================
// 职责: 持有共享数据库连接与各仓储，提供命令级操作
// ==========================================

use crate::app::error::{AppError, AppResult};
use crate::config::config_manager::ConfigManager;
use crate::config::control::ControlVariables;
use crate::db::open_sqlite_connection;
use crate::domain::assignment::SeatingOutcome;
use crate::domain::roster::Roster;
use crate::engine::audit::AuditReport;
use crate::engine::orchestrator::SeatingOrchestrator;
use crate::engine::pair_history::PairHistoryIndex;
use crate::importer::exporter::OutcomeExporter;
use crate::importer::roster_importer::RosterImporter;
use crate::repository::connection_repo::ConnectionRepository;
use crate::repository::index_cache_repo::IndexCacheRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 控制参数存储
    pub config: ConfigManager,

    /// 历史同桌台账
    pub ledger: ConnectionRepository,

    /// 历史同桌索引缓存
    pub index_cache: IndexCacheRepository,

    orchestrator: SeatingOrchestrator,
    importer: RosterImporter,
}

impl AppState {
    /// 打开数据库并初始化全部仓储
    pub fn new(db_path: &str) -> AppResult<Self> {
        info!(db_path = %db_path, "初始化应用状态");
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| AppError::Repository(e.into()))?;
        let mut state = Self::from_connection(Arc::new(Mutex::new(conn)))?;
        state.db_path = db_path.to_string();
        Ok(state)
    }

    /// 从已有连接创建（测试使用内存库）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> AppResult<Self> {
        Ok(Self {
            db_path: String::new(),
            config: ConfigManager::from_connection(conn.clone()).map_err(AppError::config)?,
            ledger: ConnectionRepository::from_connection(conn.clone()),
            index_cache: IndexCacheRepository::from_connection(conn),
            orchestrator: SeatingOrchestrator::new(),
            importer: RosterImporter::new(),
        })
    }

    /// 读取已保存的控制参数
    pub fn load_control(&self) -> AppResult<ControlVariables> {
        self.config.load_control_variables().map_err(AppError::config)
    }

    /// 保存单个控制参数（先写入再整体重新解析校验）
    pub fn set_control_value(&self, key: &str, value: &str) -> AppResult<ControlVariables> {
        let previous = self.config.get_config_value(key).map_err(AppError::config)?;
        self.config.set_config_value(key, value).map_err(AppError::config)?;
        match self.load_control() {
            Ok(control) => Ok(control),
            Err(e) => {
                // 解析失败时恢复原值
                match previous {
                    Some(old) => self.config.set_config_value(key, &old),
                    None => self.config.delete_config_value(key),
                }
                .map_err(AppError::config)?;
                Err(e)
            }
        }
    }

    /// 读取索引（缓存缺失或损坏时重建）
    pub fn pair_history(&self) -> AppResult<PairHistoryIndex> {
        Ok(self.index_cache.load_or_rebuild(&self.ledger)?)
    }

    /// 生成座位表
    ///
    /// # 参数
    /// - `roster_path`: CSV 目录或 .xlsx 工作簿
    /// - `out_dir`: 导出目录（None 时不导出）
    /// - `control`: 控制参数
    #[instrument(skip_all, fields(roster = %roster_path.display()))]
    pub fn build(
        &self,
        roster_path: &Path,
        out_dir: Option<&Path>,
        control: &ControlVariables,
    ) -> AppResult<SeatingOutcome> {
        let roster = self.importer.import(roster_path)?;
        let history = self.pair_history()?;
        let outcome = self.orchestrator.run(&roster, &history, control)?;

        if let Some(dir) = out_dir {
            let exporter = OutcomeExporter::new(dir);
            exporter.export_outcome(&outcome)?;
            let audit = self.orchestrator.audit(
                &roster_with_outcome(roster, &outcome),
                &history,
                control,
            )?;
            exporter.export_audit(&audit)?;
        }
        Ok(outcome)
    }

    /// 审计名单中的座位表
    #[instrument(skip_all, fields(roster = %roster_path.display()))]
    pub fn audit(
        &self,
        roster_path: &Path,
        out_dir: Option<&Path>,
        control: &ControlVariables,
    ) -> AppResult<AuditReport> {
        let roster = self.importer.import(roster_path)?;
        let history = self.pair_history()?;
        let report = self.orchestrator.audit(&roster, &history, control)?;
        if let Some(dir) = out_dir {
            OutcomeExporter::new(dir).export_audit(&report)?;
        }
        Ok(report)
    }

    /// 以下次晚宴日期重算台账间隔月数，并重建索引
    #[instrument(skip(self))]
    pub fn prep_connections(&self, next_dinner: NaiveDate) -> AppResult<usize> {
        let updated = self.ledger.refresh_months_apart(next_dinner)?;
        self.refresh_index()?;
        info!(updated, "台账间隔月数已更新");
        Ok(updated)
    }

    /// 晚宴结束后把座位表写入台账
    ///
    /// # 参数
    /// - `roster_path`: 含最终座位表的名单
    /// - `dinner_date`: 本次晚宴日期
    /// - `next_dinner`: 下次晚宴日期（重算间隔月数）
    #[instrument(skip(self, roster_path), fields(roster = %roster_path.display()))]
    pub fn update_connections(
        &self,
        roster_path: &Path,
        dinner_date: NaiveDate,
        next_dinner: NaiveDate,
    ) -> AppResult<usize> {
        if next_dinner < dinner_date {
            return Err(AppError::InvalidInput(format!(
                "下次晚宴日期 {} 早于本次晚宴日期 {}",
                next_dinner, dinner_date
            )));
        }
        let roster = self.importer.import(roster_path)?;
        let control = ControlVariables {
            clear_grid: false,
            clear_seated: false,
            ..self.load_control()?
        };
        let ctx = self
            .orchestrator
            .build_context(&roster, &PairHistoryIndex::default(), &control)?;

        let written = self.ledger.record_dinner(&ctx.houses, dinner_date)?;
        self.ledger.refresh_months_apart(next_dinner)?;
        self.refresh_index()?;
        info!(written, "晚宴同桌记录已写入台账");
        Ok(written)
    }

    /// 批量导入台账 CSV
    ///
    /// # 参数
    /// - `replace`: 导入前清空现有台账
    #[instrument(skip(self, csv_path), fields(path = %csv_path.display()))]
    pub fn import_connections(&self, csv_path: &Path, replace: bool) -> AppResult<usize> {
        let entries = self.importer.import_connections(csv_path)?;
        let written = if replace {
            let (removed, written) = self.ledger.replace_entries(&entries)?;
            info!(removed, written, "已替换原台账");
            written
        } else {
            self.ledger.append_entries(&entries)?
        };
        self.refresh_index()?;
        Ok(written)
    }

    /// 台账变更后失效并重建索引缓存
    fn refresh_index(&self) -> AppResult<PairHistoryIndex> {
        self.index_cache.invalidate()?;
        Ok(self.index_cache.rebuild(&self.ledger)?)
    }
}

/// 以运行结果替换名单中的座位表与落座标记（用于导出审计）
fn roster_with_outcome(mut roster: Roster, outcome: &SeatingOutcome) -> Roster {
    roster.grid = outcome.grid_rows();
    roster.guests = outcome.guests.clone();
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::pair::ConnectionEntry;

    fn state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        AppState::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_set_control_value_rejects_malformed() {
        let state = state();
        assert!(state.set_control_value(config_keys::TIME_LAPSE_MONTHS, "18").is_ok());
        assert!(state.set_control_value(config_keys::TIME_LAPSE_MONTHS, "soon").is_err());
        assert_eq!(state.load_control().unwrap().time_lapse_months, 18);
    }

    #[test]
    fn test_prep_connections_rebuilds_index() {
        let state = state();
        state
            .ledger
            .append_entries(&ConnectionEntry::both_orientations("A", "B", date(2025, 1, 18), false))
            .unwrap();
        // 旧缓存
        state.index_cache.store(&PairHistoryIndex::default()).unwrap();

        assert_eq!(state.prep_connections(date(2025, 11, 1)).unwrap(), 2);
        let index = state.pair_history().unwrap();
        assert_eq!(index.months_apart("A", "B"), Some(10));
    }
}
