// ==========================================
// 校园活动管理系统 - 活动 Repository 实现
// ==========================================
// 职责: 实现活动导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::{EventRecord, LoadRun, ReferenceId, ReferenceKind, StoredEvent};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::event_repo::EventRepository;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

// ==========================================
// SqliteEventRepository
// ==========================================
pub struct SqliteEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventRepository {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 共享底层连接（测试注入故障、同库读写）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中插入 events 行
    fn insert_event_tx(tx: &Transaction, record: &EventRecord) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO events (
                title, date, start_time, end_time, attendance, location, description,
                advert_id, partner_id, lead_organizer, type_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.title,
                record.date.as_date(),
                record.start_time,
                record.end_time,
                record.attendance,
                record.location,
                record.description,
                record.advert_id,
                record.partner_id,
                record.lead_organizer_id,
                record.type_id,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 在事务中插入多对多关联
    fn insert_links_tx(
        tx: &Transaction,
        event_id: i64,
        record: &EventRecord,
    ) -> RepositoryResult<()> {
        let mut organizer_stmt =
            tx.prepare("INSERT INTO event_organizers (event_id, organizer_id) VALUES (?1, ?2)")?;
        for organizer_id in &record.organizer_ids {
            organizer_stmt.execute(params![event_id, organizer_id])?;
        }

        let mut partner_stmt =
            tx.prepare("INSERT INTO event_partners (event_id, partner_id) VALUES (?1, ?2)")?;
        for partner_id in &record.partner_ids {
            partner_stmt.execute(params![event_id, partner_id])?;
        }

        Ok(())
    }

    fn load_link_ids(
        conn: &Connection,
        sql: &str,
        event_id: i64,
    ) -> RepositoryResult<Vec<ReferenceId>> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![event_id], |row| row.get::<_, ReferenceId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl EventRepository for SqliteEventRepository {
    fn get_or_create_reference(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> RepositoryResult<ReferenceId> {
        let conn = self.lock()?;
        let table = kind.table_name();

        let existing: Option<ReferenceId> = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE name = ?1", table),
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        // 连接处于自动提交模式, INSERT 即刻持久化
        conn.execute(
            &format!("INSERT INTO {} (name) VALUES (?1)", table),
            params![name],
        )?;
        let id = conn.last_insert_rowid();
        debug!(collection = %kind, name = %name, id = id, "新建引用实体");
        Ok(id)
    }

    fn find_reference_id(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> RepositoryResult<Option<ReferenceId>> {
        let conn = self.lock()?;
        let id = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE name = ?1", kind.table_name()),
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn count_references(&self, kind: ReferenceKind) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert_event_row(&self, record: &EventRecord) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let written = Self::insert_event_tx(&tx, record).and_then(|event_id| {
            Self::insert_links_tx(&tx, event_id, record)?;
            Ok(event_id)
        });

        match written {
            Ok(event_id) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(event_id)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "行事务回滚失败");
                }
                Err(err)
            }
        }
    }

    fn count_events(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_event(&self, event_id: i64) -> RepositoryResult<Option<StoredEvent>> {
        let conn = self.lock()?;

        let event = conn
            .query_row(
                r#"
                SELECT id, title, date, start_time, end_time, attendance, location,
                       description, type_id, lead_organizer, advert_id, partner_id
                FROM events WHERE id = ?1
                "#,
                params![event_id],
                |row| {
                    Ok(StoredEvent {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        date: row.get(2)?,
                        start_time: row.get(3)?,
                        end_time: row.get(4)?,
                        attendance: row.get(5)?,
                        location: row.get(6)?,
                        description: row.get(7)?,
                        type_id: row.get(8)?,
                        lead_organizer_id: row.get(9)?,
                        advert_id: row.get(10)?,
                        partner_id: row.get(11)?,
                        organizer_ids: Vec::new(),
                        partner_ids: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut event) = event else {
            return Ok(None);
        };

        event.organizer_ids = Self::load_link_ids(
            &conn,
            "SELECT organizer_id FROM event_organizers WHERE event_id = ?1 ORDER BY rowid",
            event_id,
        )?;
        event.partner_ids = Self::load_link_ids(
            &conn,
            "SELECT partner_id FROM event_partners WHERE event_id = ?1 ORDER BY rowid",
            event_id,
        )?;

        Ok(Some(event))
    }

    fn insert_load_run(&self, run: &LoadRun) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO load_run (
                run_id, source, started_at, finished_at, total_rows, processed,
                skipped_invalid_date, skipped_invalid_time, skipped_db_error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                run.run_id,
                run.source,
                run.started_at.to_rfc3339(),
                run.finished_at.to_rfc3339(),
                run.total_rows as i64,
                run.processed as i64,
                run.skipped_invalid_date as i64,
                run.skipped_invalid_time as i64,
                run.skipped_db_error as i64,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::ParsedDate;
    use chrono::{NaiveDate, NaiveTime};

    fn repo() -> SqliteEventRepository {
        let conn = open_in_memory().unwrap();
        SqliteEventRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn record(title: &str) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            date: ParsedDate::On(NaiveDate::from_ymd_opt(2024, 7, 25).unwrap()),
            start_time: NaiveTime::from_hms_opt(15, 0, 0),
            end_time: NaiveTime::from_hms_opt(16, 30, 0),
            attendance: Some(1200),
            location: Some("Main Hall".to_string()),
            description: None,
            type_id: None,
            lead_organizer_id: None,
            advert_id: None,
            partner_id: None,
            organizer_ids: Vec::new(),
            partner_ids: Vec::new(),
        }
    }

    #[test]
    fn test_get_or_create_reference_is_idempotent() {
        let repo = repo();
        let first = repo
            .get_or_create_reference(ReferenceKind::Organizer, "Alice")
            .unwrap();
        let second = repo
            .get_or_create_reference(ReferenceKind::Organizer, "Alice")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.count_references(ReferenceKind::Organizer).unwrap(), 1);
    }

    #[test]
    fn test_reference_names_are_case_sensitive_and_per_collection() {
        let repo = repo();
        let alice = repo
            .get_or_create_reference(ReferenceKind::Organizer, "Alice")
            .unwrap();
        let lower = repo
            .get_or_create_reference(ReferenceKind::Organizer, "alice")
            .unwrap();
        repo.get_or_create_reference(ReferenceKind::Partner, "Alice")
            .unwrap();

        assert_ne!(alice, lower);
        assert_eq!(repo.count_references(ReferenceKind::Organizer).unwrap(), 2);
        assert_eq!(repo.count_references(ReferenceKind::Partner).unwrap(), 1);
        assert_eq!(
            repo.find_reference_id(ReferenceKind::Organizer, "Alice").unwrap(),
            Some(alice)
        );
        assert_eq!(
            repo.find_reference_id(ReferenceKind::EventType, "Alice").unwrap(),
            None
        );
    }

    #[test]
    fn test_insert_event_row_round_trip() {
        let repo = repo();
        let organizer = repo
            .get_or_create_reference(ReferenceKind::Organizer, "Alice")
            .unwrap();
        let partner = repo
            .get_or_create_reference(ReferenceKind::Partner, "City Library")
            .unwrap();

        let mut rec = record("Welcome Fair");
        rec.lead_organizer_id = Some(organizer);
        rec.organizer_ids = vec![organizer];
        rec.partner_id = Some(partner);
        rec.partner_ids = vec![partner];

        let id = repo.insert_event_row(&rec).unwrap();
        let stored = repo.load_event(id).unwrap().unwrap();

        assert_eq!(stored.title, "Welcome Fair");
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 7, 25));
        assert_eq!(stored.start_time, NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(stored.attendance, Some(1200));
        assert_eq!(stored.organizer_ids, vec![organizer]);
        assert_eq!(stored.partner_ids, vec![partner]);
        assert_eq!(repo.count_events().unwrap(), 1);
    }

    #[test]
    fn test_failed_link_rolls_back_event() {
        let repo = repo();
        let mut rec = record("Broken Links");
        // 不存在的组织者 ID, 外键约束失败
        rec.organizer_ids = vec![9999];

        let result = repo.insert_event_row(&rec);

        assert!(matches!(
            result,
            Err(RepositoryError::ForeignKeyViolation(_))
        ));
        assert_eq!(repo.count_events().unwrap(), 0);
    }

    #[test]
    fn test_recurring_event_has_null_date() {
        let repo = repo();
        let mut rec = record("Weekly Yoga");
        rec.date = ParsedDate::Recurring;
        rec.start_time = None;
        rec.end_time = None;

        let id = repo.insert_event_row(&rec).unwrap();
        let stored = repo.load_event(id).unwrap().unwrap();
        assert_eq!(stored.date, None);
        assert_eq!(stored.start_time, None);
    }

    #[test]
    fn test_load_event_missing_returns_none() {
        let repo = repo();
        assert!(repo.load_event(42).unwrap().is_none());
    }
}
