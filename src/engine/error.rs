// ==========================================
// 晚宴分桌系统 - 引擎层错误类型
// ==========================================
// 红线: 无法全部落座不是错误（以未落座清单返回）
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎输入校验错误（在任何落座逻辑之前抛出）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // ===== 控制参数错误 =====
    #[error("控制参数无效 (field={field}): {message}")]
    InvalidControl { field: String, message: String },

    #[error("控制参数缺失: {0}")]
    MissingControl(String),

    // ===== 成员数据错误 =====
    #[error("成员代码为空 (行 {row})")]
    EmptyCode { row: usize },

    #[error("成员代码重复: {0}")]
    DuplicateCode(String),

    #[error("同行人数无效 (code={code}): {party_size}")]
    InvalidPartySize { code: String, party_size: u32 },

    #[error("主人数据无效 (code={code}): {message}")]
    InvalidHost { code: String, message: String },

    // ===== 座位表错误 =====
    #[error("座位表引用了未知成员 (house={house_id}): {code}")]
    UnknownMember { house_id: u32, code: String },

    #[error("成员在座位表中出现多次: {0}")]
    MemberSeatedTwice(String),

    #[error("房屋超出容量 (house={house_id}): {occupied} > {capacity}")]
    HouseOverCapacity {
        house_id: u32,
        occupied: u32,
        capacity: u32,
    },

    #[error("房屋成员超过上限 (house={house_id}): {members}")]
    TooManyMembers { house_id: u32, members: usize },
}

impl EngineError {
    pub fn invalid_control(field: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidControl {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
