// ==========================================
// 晚宴分桌系统 - 配置管理器
// ==========================================
// 职责: 控制参数加载、写入、快照
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::control::{ControlVariables, ScoringWeights};
use crate::db::open_sqlite_connection;
use crate::engine::error::EngineError;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入单个配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 删除单个配置值（之后读取回落到默认值）
    pub fn delete_config_value(&self, key: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute("DELETE FROM config_kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// 列出全部配置（按 key 排序）
    pub fn list_configs(&self) -> Result<Vec<(String, String)>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }
        Ok(configs)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = self.list_configs()?.into_iter().collect();
        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 控制参数 =====

    /// 读取控制参数
    ///
    /// 缺失的键使用默认值；格式错误的值直接报错（输入校验失败为致命错误）。
    pub fn load_control_variables(&self) -> Result<ControlVariables, Box<dyn Error>> {
        let defaults = ControlVariables::default();
        let default_weights = ScoringWeights::default();

        let next_dinner_date = match self.get_config_value(config_keys::NEXT_DINNER_DATE)? {
            Some(raw) if !raw.trim().is_empty() => Some(parse_value::<NaiveDate>(
                config_keys::NEXT_DINNER_DATE,
                &raw,
            )?),
            _ => None,
        };

        let shuffle_seed = match self.get_config_value(config_keys::SHUFFLE_SEED)? {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_value::<u64>(config_keys::SHUFFLE_SEED, &raw)?)
            }
            _ => None,
        };

        let relaxation_steps = match self.get_config_value(config_keys::RELAXATION_STEPS)? {
            Some(raw) => parse_steps(&raw)?,
            None => defaults.relaxation_steps.clone(),
        };

        Ok(ControlVariables {
            time_lapse_months: self.get_typed(config_keys::TIME_LAPSE_MONTHS, defaults.time_lapse_months)?,
            next_dinner_date,
            throttle_singles: self.get_flag(config_keys::THROTTLE_SINGLES, defaults.throttle_singles)?,
            sort_hosts: self.get_flag(config_keys::SORT_HOSTS, defaults.sort_hosts)?,
            sort_guests: self.get_flag(config_keys::SORT_GUESTS, defaults.sort_guests)?,
            clear_seated: self.get_flag(config_keys::CLEAR_SEATED, defaults.clear_seated)?,
            clear_grid: self.get_flag(config_keys::CLEAR_GRID, defaults.clear_grid)?,
            unseated_options: self.get_flag(config_keys::UNSEATED_OPTIONS, defaults.unseated_options)?,
            placement_policy: self.get_typed(config_keys::PLACEMENT_POLICY, defaults.placement_policy)?,
            max_attempts: self.get_typed(config_keys::MAX_ATTEMPTS, defaults.max_attempts)?,
            shuffle_seed,
            relaxation_steps,
            relaxation_floor: self.get_typed(config_keys::RELAXATION_FLOOR, defaults.relaxation_floor)?,
            critical_ceiling: self.get_typed(config_keys::CRITICAL_CEILING, defaults.critical_ceiling)?,
            prioritize_critical: self.get_flag(config_keys::PRIORITIZE_CRITICAL, defaults.prioritize_critical)?,
            weights: ScoringWeights {
                slack: self.get_typed(config_keys::WEIGHT_SLACK, default_weights.slack)?,
                balance: self.get_typed(config_keys::WEIGHT_BALANCE, default_weights.balance)?,
                freshness: self.get_typed(config_keys::WEIGHT_FRESHNESS, default_weights.freshness)?,
                months_cap: self.get_typed(config_keys::MONTHS_CAP, default_weights.months_cap)?,
            },
        })
    }

    /// 写入控制参数（全部键）
    pub fn save_control_variables(&self, control: &ControlVariables) -> Result<(), Box<dyn Error>> {
        let steps = control
            .relaxation_steps
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let entries: Vec<(&str, String)> = vec![
            (config_keys::TIME_LAPSE_MONTHS, control.time_lapse_months.to_string()),
            (
                config_keys::NEXT_DINNER_DATE,
                control.next_dinner_date.map(|d| d.to_string()).unwrap_or_default(),
            ),
            (config_keys::THROTTLE_SINGLES, flag(control.throttle_singles)),
            (config_keys::SORT_HOSTS, flag(control.sort_hosts)),
            (config_keys::SORT_GUESTS, flag(control.sort_guests)),
            (config_keys::CLEAR_SEATED, flag(control.clear_seated)),
            (config_keys::CLEAR_GRID, flag(control.clear_grid)),
            (config_keys::UNSEATED_OPTIONS, flag(control.unseated_options)),
            (config_keys::PLACEMENT_POLICY, control.placement_policy.to_string()),
            (config_keys::MAX_ATTEMPTS, control.max_attempts.to_string()),
            (
                config_keys::SHUFFLE_SEED,
                control.shuffle_seed.map(|s| s.to_string()).unwrap_or_default(),
            ),
            (config_keys::RELAXATION_STEPS, steps),
            (config_keys::RELAXATION_FLOOR, control.relaxation_floor.to_string()),
            (config_keys::CRITICAL_CEILING, control.critical_ceiling.to_string()),
            (config_keys::PRIORITIZE_CRITICAL, flag(control.prioritize_critical)),
            (config_keys::WEIGHT_SLACK, control.weights.slack.to_string()),
            (config_keys::WEIGHT_BALANCE, control.weights.balance.to_string()),
            (config_keys::WEIGHT_FRESHNESS, control.weights.freshness.to_string()),
            (config_keys::MONTHS_CAP, control.weights.months_cap.to_string()),
        ];

        for (key, value) in entries {
            self.set_config_value(key, &value)?;
        }
        Ok(())
    }

    // ===== 辅助方法 =====

    fn get_typed<T: FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(parse_value(key, &raw)?),
            _ => Ok(default),
        }
    }

    fn get_flag(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(parse_flag(key, &raw)?),
            _ => Ok(default),
        }
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, EngineError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| EngineError::invalid_control(key, format!("无法解析配置值: {}", raw)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, EngineError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(EngineError::invalid_control(key, format!("无法解析开关值: {}", raw))),
    }
}

fn parse_steps(raw: &str) -> Result<Vec<i64>, EngineError> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| parse_value::<i64>(config_keys::RELAXATION_STEPS, s))
        .collect()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 相容性
    pub const TIME_LAPSE_MONTHS: &str = "time_lapse_months";
    pub const NEXT_DINNER_DATE: &str = "next_dinner_date";

    // 首轮落座
    pub const THROTTLE_SINGLES: &str = "throttle_singles";
    pub const SORT_HOSTS: &str = "sort_hosts";
    pub const SORT_GUESTS: &str = "sort_guests";
    pub const PLACEMENT_POLICY: &str = "placement_policy";
    pub const MAX_ATTEMPTS: &str = "max_attempts";
    pub const SHUFFLE_SEED: &str = "shuffle_seed";
    pub const CRITICAL_CEILING: &str = "critical_ceiling";
    pub const PRIORITIZE_CRITICAL: &str = "prioritize_critical";

    // 运行前清理
    pub const CLEAR_SEATED: &str = "clear_seated";
    pub const CLEAR_GRID: &str = "clear_grid";

    // 报告
    pub const UNSEATED_OPTIONS: &str = "unseated_options";

    // 放宽
    pub const RELAXATION_STEPS: &str = "relaxation_steps";
    pub const RELAXATION_FLOOR: &str = "relaxation_floor";

    // 评分权重
    pub const WEIGHT_SLACK: &str = "weight_slack";
    pub const WEIGHT_BALANCE: &str = "weight_balance";
    pub const WEIGHT_FRESHNESS: &str = "weight_freshness";
    pub const MONTHS_CAP: &str = "months_cap";
}
