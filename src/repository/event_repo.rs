// ==========================================
// 校园活动管理系统 - 活动 Repository Trait
// ==========================================
// 职责: 定义导入所需的持久化接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{EventRecord, LoadRun, ReferenceId, ReferenceKind, StoredEvent};
use crate::repository::error::RepositoryResult;

// ==========================================
// EventRepository Trait
// ==========================================
// 用途: 批量导入的持久化后端
// 实现者: SqliteEventRepository（使用 rusqlite）
pub trait EventRepository: Send + Sync {
    // ===== 引用实体 =====

    /// 按名称查找引用实体, 不存在则创建
    ///
    /// # 说明
    /// - 名称精确匹配（区分大小写）
    /// - 新建的实体立即提交, 不随活动行事务回滚
    fn get_or_create_reference(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> RepositoryResult<ReferenceId>;

    /// 按名称查找引用实体（不创建）
    fn find_reference_id(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> RepositoryResult<Option<ReferenceId>>;

    /// 统计某集合的实体数量
    fn count_references(&self, kind: ReferenceKind) -> RepositoryResult<usize>;

    // ===== 活动（行级事务）=====

    /// 在单行事务中写入活动及其多对多关联
    ///
    /// # 返回
    /// - Ok(i64): 新活动 ID（已提交）
    /// - Err: 任一步失败, 本行全部回滚
    fn insert_event_row(&self, record: &EventRecord) -> RepositoryResult<i64>;

    /// 统计 events 表记录数
    fn count_events(&self) -> RepositoryResult<usize>;

    /// 读回单条活动（含关联）
    fn load_event(&self, event_id: i64) -> RepositoryResult<Option<StoredEvent>>;

    // ===== 导入批次 =====

    /// 记录一次导入
    fn insert_load_run(&self, run: &LoadRun) -> RepositoryResult<()>;
}
