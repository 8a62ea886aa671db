// ==========================================
// 校园活动管理系统 - 导入层
// ==========================================
// 职责: 外部活动表格 → 规范化的活动与引用实体
// 支持: 工作簿 (多 tab), CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod event_loader;
pub mod field_mapper;
pub mod file_parser;
pub mod reference_resolver;
pub mod row_mapper;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use event_loader::{load_from_config, EventLoader, RowOutcome};
pub use field_mapper::{EventField, HeaderBinding};
pub use file_parser::{row_source_for, CsvRowSource, RowSource, WorkbookRowSource};
pub use reference_resolver::ReferenceResolver;
pub use row_mapper::{EventPlan, RowMapper};
