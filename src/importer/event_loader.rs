// ==========================================
// 校园活动管理系统 - 批量导入器
// ==========================================
// 职责: 驱动整条导入管道, 逐行提交
// 流程: 读取来源 → 绑定表头 → 映射/校验 → 解析引用 → 行事务落库 → 汇总
// 约束:
// - 单线程, 严格按来源顺序逐行处理
// - 每行一个事务; 单行失败回滚并跳过, 不中断批次
// - 来源不可用直接返回错误
// ==========================================

use crate::config::{LoadMode, LoaderConfig};
use crate::domain::{LoadOutcome, LoadReport, LoadRun, RawRow, RawTable, RowRejection};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{EventField, HeaderBinding};
use crate::importer::file_parser::{row_source_for, RowSource};
use crate::importer::reference_resolver::ReferenceResolver;
use crate::importer::row_mapper::RowMapper;
use crate::repository::{EventRepository, RepositoryError, SqliteEventRepository};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 单行处理结果
#[derive(Debug)]
pub enum RowOutcome {
    /// 已提交, 附活动 ID
    Persisted(i64),
    /// 校验未通过
    Rejected(RowRejection),
    /// 引用解析或行事务失败（已回滚）
    Failed(RepositoryError),
}

// ==========================================
// EventLoader
// ==========================================
pub struct EventLoader<'a> {
    repo: &'a dyn EventRepository,
    mapper: RowMapper,
    load_mode: LoadMode,
}

impl<'a> EventLoader<'a> {
    pub fn new(repo: &'a dyn EventRepository, mapper: RowMapper, load_mode: LoadMode) -> Self {
        Self {
            repo,
            mapper,
            load_mode,
        }
    }

    pub fn from_config(repo: &'a dyn EventRepository, config: &LoaderConfig) -> Self {
        Self::new(repo, RowMapper::new(config.time_policy), config.load_mode)
    }

    /// 执行一次导入
    ///
    /// # 返回
    /// - Ok(Completed): 导入汇总（即使全部行被拒绝）
    /// - Ok(SkippedPopulated): guarded 模式下库中已有活动
    /// - Err: 来源不可用 / 数据库不可用
    #[instrument(skip(self, source), fields(run_id))]
    pub fn load(&self, source: &dyn RowSource) -> ImportResult<LoadOutcome> {
        if self.load_mode == LoadMode::Guarded {
            let existing_events = self.repo.count_events()?;
            if existing_events > 0 {
                info!(existing_events, "库中已有活动, 跳过导入");
                return Ok(LoadOutcome::SkippedPopulated { existing_events });
            }
        }

        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let description = source.describe();
        info!(run_id = %run_id, source = %description, "开始导入活动数据");

        let tables = source.read_tables().map_err(|e| {
            error!(error = %e, "行来源读取失败");
            e
        })?;

        let mut report = self.load_tables(&tables);
        report.run_id = run_id;
        report.source = description;

        if let Err(e) = self.repo.insert_load_run(&LoadRun::from_report(&report, started_at)) {
            warn!(error = %e, "导入批次记录写入失败");
        }

        Ok(LoadOutcome::Completed(report))
    }

    /// 逐表逐行导入（不做 guarded 检查, 不写 load_run）
    pub fn load_tables(&self, tables: &[RawTable]) -> LoadReport {
        let start_time = Instant::now();
        let resolver = ReferenceResolver::new(self.repo);
        let mut report = LoadReport::default();

        for table in tables {
            let binding = HeaderBinding::bind(table.headers.iter().map(String::as_str));
            if !binding.has(EventField::Date) {
                warn!(table = %table.name, "未找到日期列, 本表所有行将被拒绝");
            }
            debug!(
                table = %table.name,
                rows = table.rows.len(),
                missing = ?binding.missing_fields(),
                "表头绑定完成"
            );

            for (row_number, row) in table.numbered_rows() {
                report.total_rows += 1;

                match self.load_row(row, &binding, &resolver) {
                    RowOutcome::Persisted(event_id) => {
                        report.processed += 1;
                        debug!(table = %table.name, row_number, event_id, "行已提交");
                    }
                    RowOutcome::Rejected(rejection) => {
                        warn!(
                            table = %table.name,
                            row_number,
                            reason = %rejection,
                            "跳过无效行"
                        );
                        report.record_rejection(&table.name, row_number, &rejection);
                    }
                    RowOutcome::Failed(err) => {
                        error!(
                            table = %table.name,
                            row_number,
                            error = %err,
                            "行落库失败, 已回滚"
                        );
                        report.record_db_error(&table.name, row_number, err.to_string());
                    }
                }
            }
        }

        info!(
            total = report.total_rows,
            processed = report.processed,
            skipped_invalid_date = report.skipped_invalid_date,
            skipped_invalid_time = report.skipped_invalid_time,
            skipped_db_error = report.skipped_db_error,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "活动数据导入完成"
        );

        report
    }

    /// 单行: pending → mapped → persisted / rejected
    pub fn load_row(
        &self,
        row: &RawRow,
        binding: &HeaderBinding,
        resolver: &ReferenceResolver<'_>,
    ) -> RowOutcome {
        let plan = match self.mapper.map_row(row, binding) {
            Ok(plan) => plan,
            Err(rejection) => return RowOutcome::Rejected(rejection),
        };

        match plan
            .resolve(resolver)
            .and_then(|record| self.repo.insert_event_row(&record))
        {
            Ok(event_id) => RowOutcome::Persisted(event_id),
            Err(err) => RowOutcome::Failed(err),
        }
    }
}

/// 按配置完成一次导入: 打开数据库 → 选择来源 → 导入
pub fn load_from_config(config: &LoaderConfig) -> ImportResult<LoadOutcome> {
    let repo = SqliteEventRepository::new(&config.database_path)?;
    let source = row_source_for(&config.select_source());
    EventLoader::from_config(&repo, config).load(source.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimePolicy;
    use crate::db::open_in_memory;
    use crate::domain::ReferenceKind;
    use crate::importer::error::ImportError;
    use std::sync::{Arc, Mutex};

    struct StaticSource(Vec<RawTable>);

    impl RowSource for StaticSource {
        fn read_tables(&self) -> ImportResult<Vec<RawTable>> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct BrokenSource;

    impl RowSource for BrokenSource {
        fn read_tables(&self) -> ImportResult<Vec<RawTable>> {
            Err(ImportError::FileNotFound("SW_Events.csv".to_string()))
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn repo() -> SqliteEventRepository {
        let conn = open_in_memory().unwrap();
        SqliteEventRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn table(rows: &[&[(&str, &str)]]) -> RawTable {
        let headers = vec![
            "Date".to_string(),
            "Name of Event/Activity".to_string(),
            "Start Time".to_string(),
            "End Time".to_string(),
            "Attendance".to_string(),
            "Organizers".to_string(),
        ];
        let rows = rows
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<RawRow>()
            })
            .collect();
        RawTable::new("Fall 2024", headers, rows)
    }

    fn loader(repo: &SqliteEventRepository, mode: LoadMode) -> EventLoader<'_> {
        EventLoader::new(repo, RowMapper::new(TimePolicy::Required), mode)
    }

    fn completed(outcome: LoadOutcome) -> LoadReport {
        match outcome {
            LoadOutcome::Completed(report) => report,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_load_counts_processed_and_skipped() {
        crate::logging::init_test();
        let repo = repo();
        let source = StaticSource(vec![table(&[
            &[
                ("Date", "25-Jul-24"),
                ("Name of Event/Activity", "Welcome Fair"),
                ("Start Time", "3pm"),
                ("End Time", "4:30pm"),
                ("Attendance", "1,200"),
                ("Organizers", "Career Center, Alumni Office"),
            ],
            &[
                ("Date", "notadate"),
                ("Name of Event/Activity", "Broken"),
                ("Start Time", "3pm"),
                ("End Time", "4pm"),
            ],
            &[
                ("Date", "1-Aug-24"),
                ("Name of Event/Activity", "No Times"),
            ],
        ])]);

        let report = completed(loader(&repo, LoadMode::Guarded).load(&source).unwrap());

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_invalid_date, 1);
        assert_eq!(report.skipped_invalid_time, 1);
        assert_eq!(report.skipped_db_error, 0);
        assert_eq!(report.skipped_rows[0].row_number, 2);
        assert_eq!(report.skipped_rows[1].row_number, 3);
        assert_eq!(report.source, "static");
        assert!(!report.run_id.is_empty());

        assert_eq!(repo.count_events().unwrap(), 1);
        assert_eq!(repo.count_references(ReferenceKind::Organizer).unwrap(), 2);
    }

    #[test]
    fn test_guarded_load_skips_populated_store() {
        let repo = repo();
        let source = StaticSource(vec![table(&[&[
            ("Date", "25-Jul-24"),
            ("Name of Event/Activity", "Welcome Fair"),
            ("Start Time", "3pm"),
            ("End Time", "4pm"),
        ]])]);

        completed(loader(&repo, LoadMode::Guarded).load(&source).unwrap());
        let second = loader(&repo, LoadMode::Guarded).load(&source).unwrap();

        assert_eq!(second, LoadOutcome::SkippedPopulated { existing_events: 1 });
        assert_eq!(repo.count_events().unwrap(), 1);
    }

    #[test]
    fn test_append_load_duplicates_events() {
        let repo = repo();
        let source = StaticSource(vec![table(&[&[
            ("Date", "25-Jul-24"),
            ("Name of Event/Activity", "Welcome Fair"),
            ("Start Time", "3pm"),
            ("End Time", "4pm"),
        ]])]);

        completed(loader(&repo, LoadMode::Append).load(&source).unwrap());
        completed(loader(&repo, LoadMode::Append).load(&source).unwrap());

        assert_eq!(repo.count_events().unwrap(), 2);
    }

    #[test]
    fn test_source_failure_is_fatal() {
        let repo = repo();
        let result = loader(&repo, LoadMode::Guarded).load(&BrokenSource);

        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
        assert_eq!(repo.count_events().unwrap(), 0);
    }

    #[test]
    fn test_rejected_row_creates_no_references() {
        let repo = repo();
        let tables = vec![table(&[&[
            ("Date", "someday"),
            ("Name of Event/Activity", "Ghost"),
            ("Start Time", "3pm"),
            ("End Time", "4pm"),
            ("Organizers", "Nobody Club"),
        ]])];

        let report = loader(&repo, LoadMode::Append).load_tables(&tables);

        assert_eq!(report.skipped_invalid_date, 1);
        assert_eq!(repo.count_references(ReferenceKind::Organizer).unwrap(), 0);
    }

    #[test]
    fn test_empty_source_yields_zero_counts() {
        let repo = repo();
        let report = completed(
            loader(&repo, LoadMode::Guarded)
                .load(&StaticSource(vec![table(&[])]))
                .unwrap(),
        );

        assert_eq!(report.total_rows, 0);
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped_total(), 0);
    }
}
