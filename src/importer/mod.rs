// ==========================================
// 晚宴分桌系统 - 导入导出层
// ==========================================
// 职责: 外部表格 ↔ 领域记录（名单、台账、结果文件）
// 红线: 不含落座逻辑
// ==========================================

pub mod error;
pub mod exporter;
pub mod field_mapper;
pub mod file_parser;
pub mod roster_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use exporter::OutcomeExporter;
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, RawRow};
pub use roster_importer::RosterImporter;
