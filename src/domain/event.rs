// ==========================================
// 校园活动管理系统 - 活动领域模型
// ==========================================
// 职责: 原始行 / 解析结果 / 活动记录 / 引用实体类型
// 用途: 导入层写入, 仓储层落库
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 原始行: 表头 → 单元格文本（键不保证存在）
pub type RawRow = HashMap<String, String>;

// ==========================================
// RawTable - 行来源产出的一张表
// ==========================================
// CSV 只有一张表; 工作簿每个 tab 一张表
// source_rows[i] 为 rows[i] 在来源中的数据行号（从 1 开始, 不含表头, 含被跳过的空白行）
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    source_rows: Vec<usize>,
}

impl RawTable {
    /// 行号按 rows 顺序连续编号
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        let source_rows = (1..=rows.len()).collect();
        Self {
            name: name.into(),
            headers,
            rows,
            source_rows,
        }
    }

    /// 追加一行并记录其来源数据行号
    pub fn push_row(&mut self, source_row: usize, row: RawRow) {
        self.source_rows.push(source_row);
        self.rows.push(row);
    }

    /// (来源数据行号, 行)
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &RawRow)> + '_ {
        self.source_rows.iter().copied().zip(self.rows.iter())
    }
}

// ==========================================
// ParsedDate - 日期解析结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedDate {
    /// 具体日期
    On(NaiveDate),
    /// 周期性活动, 无具体日期
    Recurring,
}

impl ParsedDate {
    /// 落库用的日期（周期性活动为 NULL）
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParsedDate::On(d) => Some(*d),
            ParsedDate::Recurring => None,
        }
    }
}

// ==========================================
// ReferenceKind - 引用实体集合
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Organizer,
    Partner,
    Advertisement,
    EventType,
}

impl ReferenceKind {
    /// 对应的数据库表名
    pub fn table_name(&self) -> &'static str {
        match self {
            ReferenceKind::Organizer => "organizers",
            ReferenceKind::Partner => "partners",
            ReferenceKind::Advertisement => "advertisement",
            ReferenceKind::EventType => "event_type",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// 引用实体 ID（数据库自增主键）
pub type ReferenceId = i64;

// ==========================================
// EventRecord - 活动记录（已解析、已解析引用）
// ==========================================
// 对齐: events 表 + event_organizers / event_partners 关联表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub date: ParsedDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub attendance: Option<u32>,
    pub location: Option<String>,
    pub description: Option<String>,

    // ===== 主引用（多值单元格取第一个）=====
    pub type_id: Option<ReferenceId>,
    pub lead_organizer_id: Option<ReferenceId>,
    pub advert_id: Option<ReferenceId>,
    pub partner_id: Option<ReferenceId>,

    // ===== 多对多关联 =====
    pub organizer_ids: Vec<ReferenceId>,
    pub partner_ids: Vec<ReferenceId>,
}

/// 标题为空时的默认值
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// 活动读回视图（用于校验与测试）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: i64,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub attendance: Option<u32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub type_id: Option<ReferenceId>,
    pub lead_organizer_id: Option<ReferenceId>,
    pub advert_id: Option<ReferenceId>,
    pub partner_id: Option<ReferenceId>,
    pub organizer_ids: Vec<ReferenceId>,
    pub partner_ids: Vec<ReferenceId>,
}
