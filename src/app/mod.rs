// ==========================================
// 晚宴分桌系统 - 应用层
// ==========================================
// 职责: 串联配置、台账、索引缓存、导入导出与引擎
// 红线: 引擎调用前后做 I/O，引擎内部不做
// ==========================================

pub mod error;
pub mod state;

// 重导出
pub use error::{AppError, AppResult};
pub use state::AppState;
