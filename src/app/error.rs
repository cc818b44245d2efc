// ==========================================
// 晚宴分桌系统 - 应用层错误类型
// ==========================================
// 职责: 汇总各层错误，交给命令行边界
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("输入校验失败: {0}")]
    Engine(#[from] EngineError),

    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("导入导出失败: {0}")]
    Import(#[from] ImportError),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// ConfigManager 沿用 Box<dyn Error> 返回值
    pub fn config(err: Box<dyn std::error::Error>) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
