// ==========================================
// 校园活动管理系统 - 导入结果模型
// ==========================================
// 职责: 行拒绝原因 / 导入汇总 / 导入批次记录
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RejectReason - 行拒绝原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidDate,
    InvalidTime,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidDate => f.write_str("invalid date"),
            RejectReason::InvalidTime => f.write_str("invalid time"),
        }
    }
}

/// 单行被拒绝的明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub reason: RejectReason,
    /// 导致拒绝的原始文本（日期或 "开始 / 结束" 时间）
    pub raw_value: Option<String>,
}

impl RowRejection {
    pub fn invalid_date(raw: Option<&str>) -> Self {
        Self {
            reason: RejectReason::InvalidDate,
            raw_value: raw.map(str::to_string),
        }
    }

    pub fn invalid_time(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            reason: RejectReason::InvalidTime,
            raw_value: Some(format!(
                "{} / {}",
                start.unwrap_or_default(),
                end.unwrap_or_default()
            )),
        }
    }
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw_value {
            Some(raw) => write!(f, "{}: {:?}", self.reason, raw),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// 被跳过行的定位信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub table: String,
    /// 表内行号（从 1 开始, 不含表头）
    pub row_number: usize,
    pub detail: String,
}

// ==========================================
// LoadReport - 一次导入的汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub run_id: String,
    pub source: String,
    pub total_rows: usize,
    /// 成功落库的行数
    pub processed: usize,
    pub skipped_invalid_date: usize,
    pub skipped_invalid_time: usize,
    pub skipped_db_error: usize,
    pub skipped_rows: Vec<SkippedRow>,
}

impl LoadReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped_invalid_date + self.skipped_invalid_time + self.skipped_db_error
    }

    pub(crate) fn record_rejection(&mut self, table: &str, row_number: usize, rejection: &RowRejection) {
        match rejection.reason {
            RejectReason::InvalidDate => self.skipped_invalid_date += 1,
            RejectReason::InvalidTime => self.skipped_invalid_time += 1,
        }
        self.skipped_rows.push(SkippedRow {
            table: table.to_string(),
            row_number,
            detail: rejection.to_string(),
        });
    }

    pub(crate) fn record_db_error(&mut self, table: &str, row_number: usize, message: String) {
        self.skipped_db_error += 1;
        self.skipped_rows.push(SkippedRow {
            table: table.to_string(),
            row_number,
            detail: message,
        });
    }
}

// ==========================================
// LoadOutcome - 导入入口返回值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 已执行导入
    Completed(LoadReport),
    /// guarded 模式下库中已有活动, 未导入
    SkippedPopulated { existing_events: usize },
}

// ==========================================
// LoadRun - load_run 表记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRun {
    pub run_id: String,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_rows: usize,
    pub processed: usize,
    pub skipped_invalid_date: usize,
    pub skipped_invalid_time: usize,
    pub skipped_db_error: usize,
}

impl LoadRun {
    pub fn from_report(report: &LoadReport, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: report.run_id.clone(),
            source: report.source.clone(),
            started_at,
            finished_at: Utc::now(),
            total_rows: report.total_rows,
            processed: report.processed,
            skipped_invalid_date: report.skipped_invalid_date,
            skipped_invalid_time: report.skipped_invalid_time,
            skipped_db_error: report.skipped_db_error,
        }
    }
}
