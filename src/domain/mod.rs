// ==========================================
// 校园活动管理系统 - 领域层
// ==========================================
// 职责: 活动 / 引用实体 / 导入结果的数据结构
// 红线: 领域层不访问数据库
// ==========================================

pub mod event;
pub mod load;

pub use event::{
    EventRecord, ParsedDate, RawRow, RawTable, ReferenceId, ReferenceKind, StoredEvent,
    UNTITLED_EVENT,
};
pub use load::{
    LoadOutcome, LoadReport, LoadRun, RejectReason, RowRejection, SkippedRow,
};
