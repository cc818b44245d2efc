// ==========================================
// 晚宴分桌系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 为每次晚宴生成座位表（人工最终确认）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 台账与索引缓存
pub mod repository;

// 引擎层 - 分桌规则
pub mod engine;

// 导入导出层 - 外部表格
pub mod importer;

// 配置层 - 控制参数
pub mod config;

// 应用层 - 命令级操作
pub mod app;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AuditWarning, PlacementPolicy, Role};

// 领域实体
pub use domain::{
    Attendee, ConnectionEntry, GridRow, GuestRecord, HostRecord, House, NeverMatchSet, PairKey,
    PhaseReport, Roster, SeatingOutcome, UnseatedMember,
};

// 引擎
pub use engine::{
    CompatibilityOracle, ConstraintRelaxationPass, CriticalGuestAnalyzer, GridAuditor,
    LocalSearchOptimizer, PairHistoryIndex, SeatingOrchestrator,
};

// 配置
pub use config::{ConfigManager, ControlVariables};

// 应用
pub use app::{AppError, AppState};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "晚宴分桌系统";
