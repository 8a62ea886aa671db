// ==========================================
// 校园活动管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 活动表格的一次性导入与规范化
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    EventRecord, LoadOutcome, LoadReport, ParsedDate, RawRow, RawTable, ReferenceKind,
    RowRejection, StoredEvent,
};

// 导入
pub use importer::{load_from_config, EventLoader, ImportError, RowMapper, RowSource};

// 仓储
pub use repository::{EventRepository, RepositoryError, SqliteEventRepository};

// 配置
pub use config::{LoadMode, LoaderConfig, SourceSelection, TimePolicy};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "校园活动管理系统";
