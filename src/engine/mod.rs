// ==========================================
// 晚宴分桌系统 - 引擎层
// ==========================================
// 职责: 实现分桌规则引擎
// 红线: 引擎不做 I/O，不拼 SQL
// 红线: 永不同桌集合在任何阶段都不能被绕过
// ==========================================

pub mod audit;
pub mod compatibility;
pub mod context;
pub mod critical;
pub mod error;
pub mod optimizer;
pub mod orchestrator;
pub mod pair_history;
pub mod placement;
pub mod relaxation;

// 重导出核心引擎
pub use audit::{AuditReport, AuditSummary, GridAuditor, HouseAudit, PairAudit};
pub use compatibility::CompatibilityOracle;
pub use context::SeatingContext;
pub use critical::{CriticalGuest, CriticalGuestAnalyzer};
pub use error::{EngineError, EngineResult};
pub use optimizer::{LocalSearchOptimizer, OptimizerReport};
pub use orchestrator::SeatingOrchestrator;
pub use pair_history::PairHistoryIndex;
pub use placement::{GreedyRestartPlacer, InitialPlacement, PlacementSummary, ScoredPlacer};
pub use relaxation::ConstraintRelaxationPass;
