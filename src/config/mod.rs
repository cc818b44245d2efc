// ==========================================
// 晚宴分桌系统 - 配置层
// ==========================================
// 职责: 控制参数定义与持久化
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod control;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use control::{ControlVariables, ScoringWeights, DEFAULT_RELAXATION_STEPS};
