// ==========================================
// 校园活动管理系统 - 引用实体解析器
// ==========================================
// 职责: 名称 → 引用实体 ID（get-or-create）
// 说明: 新建实体立即提交, 不与活动行事务绑定;
//       活动行随后写入失败时, 已建实体保留（孤儿实体可接受）
// ==========================================

use crate::domain::{ReferenceId, ReferenceKind};
use crate::importer::data_cleaner::split_multi_value;
use crate::repository::{EventRepository, RepositoryResult};

pub struct ReferenceResolver<'a> {
    repo: &'a dyn EventRepository,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(repo: &'a dyn EventRepository) -> Self {
        Self { repo }
    }

    /// 解析单个名称
    pub fn resolve_id(&self, kind: ReferenceKind, name: &str) -> RepositoryResult<ReferenceId> {
        self.repo.get_or_create_reference(kind, name)
    }

    /// 解析逗号分隔的多值单元格
    ///
    /// 逐项清洗后解析; 空项丢弃
    pub fn resolve_many(
        &self,
        kind: ReferenceKind,
        cell: Option<&str>,
    ) -> RepositoryResult<Vec<ReferenceId>> {
        self.resolve_all(kind, &split_multi_value(cell))
    }

    /// 按顺序解析一组已清洗的名称; 同名只保留首次出现的位置
    pub fn resolve_all(
        &self,
        kind: ReferenceKind,
        names: &[String],
    ) -> RepositoryResult<Vec<ReferenceId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = self.resolve_id(kind, name)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::repository::SqliteEventRepository;
    use std::sync::{Arc, Mutex};

    fn repo() -> SqliteEventRepository {
        SqliteEventRepository::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap())))
            .unwrap()
    }

    #[test]
    fn test_resolve_id_twice_creates_one_row() {
        let repo = repo();
        let resolver = ReferenceResolver::new(&repo);

        let a = resolver.resolve_id(ReferenceKind::Organizer, "Alice").unwrap();
        let b = resolver.resolve_id(ReferenceKind::Organizer, "Alice").unwrap();

        assert_eq!(a, b);
        assert_eq!(repo.count_references(ReferenceKind::Organizer).unwrap(), 1);
    }

    #[test]
    fn test_resolve_many_splits_and_dedups() {
        let repo = repo();
        let resolver = ReferenceResolver::new(&repo);

        let ids = resolver
            .resolve_many(ReferenceKind::Partner, Some(" Library, Museum ,, Library, None"))
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(
            repo.find_reference_id(ReferenceKind::Partner, "Library").unwrap(),
            Some(ids[0])
        );
        assert_eq!(
            repo.find_reference_id(ReferenceKind::Partner, "Museum").unwrap(),
            Some(ids[1])
        );
        assert_eq!(repo.count_references(ReferenceKind::Partner).unwrap(), 2);
    }

    #[test]
    fn test_resolve_many_empty_cell() {
        let repo = repo();
        let resolver = ReferenceResolver::new(&repo);

        assert!(resolver
            .resolve_many(ReferenceKind::Advertisement, None)
            .unwrap()
            .is_empty());
        assert!(resolver
            .resolve_many(ReferenceKind::Advertisement, Some("  "))
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.count_references(ReferenceKind::Advertisement).unwrap(),
            0
        );
    }
}
