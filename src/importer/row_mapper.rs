// ==========================================
// 校园活动管理系统 - 行映射器
// ==========================================
// 职责: RawRow → EventPlan（校验通过）或 RowRejection
//       EventPlan + ReferenceResolver → EventRecord
// 校验顺序: 日期 → 时间; 校验通过后才解析引用实体,
//           被拒绝的行不会新建任何引用实体
// ==========================================

use crate::config::TimePolicy;
use crate::domain::{EventRecord, ParsedDate, RawRow, ReferenceKind, RowRejection, UNTITLED_EVENT};
use crate::importer::data_cleaner::{
    clean_cell, parse_attendance, parse_flexible_date, parse_time, split_multi_value,
};
use crate::importer::field_mapper::{EventField, HeaderBinding};
use crate::importer::reference_resolver::ReferenceResolver;
use crate::repository::RepositoryResult;
use chrono::NaiveTime;

/// 周期性活动的日期标记
const RECURRING_TOKEN: &str = "recurring";

// ==========================================
// EventPlan - 已校验、待解析引用的活动
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct EventPlan {
    pub title: String,
    pub date: ParsedDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub attendance: Option<u32>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// 类型单元格整体作为一个名称
    pub event_type: Option<String>,
    pub organizers: Vec<String>,
    pub partners: Vec<String>,
    pub advertisements: Vec<String>,
}

impl EventPlan {
    /// 解析全部引用实体, 生成可落库的活动记录
    ///
    /// 引用实体在此处即刻创建并提交。
    pub fn resolve(self, resolver: &ReferenceResolver<'_>) -> RepositoryResult<EventRecord> {
        let type_id = self
            .event_type
            .as_deref()
            .map(|name| resolver.resolve_id(ReferenceKind::EventType, name))
            .transpose()?;
        let advert_ids = resolver.resolve_all(ReferenceKind::Advertisement, &self.advertisements)?;
        let organizer_ids = resolver.resolve_all(ReferenceKind::Organizer, &self.organizers)?;
        let partner_ids = resolver.resolve_all(ReferenceKind::Partner, &self.partners)?;

        Ok(EventRecord {
            title: self.title,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            attendance: self.attendance,
            location: self.location,
            description: self.description,
            type_id,
            lead_organizer_id: organizer_ids.first().copied(),
            advert_id: advert_ids.first().copied(),
            partner_id: partner_ids.first().copied(),
            organizer_ids,
            partner_ids,
        })
    }
}

// ==========================================
// RowMapper
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMapper {
    time_policy: TimePolicy,
}

impl RowMapper {
    pub fn new(time_policy: TimePolicy) -> Self {
        Self { time_policy }
    }

    /// 校验并提取一行
    ///
    /// # 拒绝条件（按顺序）
    /// 1. 日期无法解析, 且不是 "recurring" → invalid date
    /// 2. 时间策略为 Required 时, 开始/结束时间缺失或无法解析 → invalid time
    ///
    /// 时间策略为 Optional 时, 缺失或无法解析的时间置为 None。
    pub fn map_row(&self, row: &RawRow, binding: &HeaderBinding) -> Result<EventPlan, RowRejection> {
        let cell = |field: EventField| clean_cell(binding.get(row, field));

        // === 日期 ===
        let raw_date = cell(EventField::Date);
        let date = match raw_date.as_deref() {
            Some(text) if text.eq_ignore_ascii_case(RECURRING_TOKEN) => ParsedDate::Recurring,
            Some(text) => match parse_flexible_date(text) {
                Some(d) => ParsedDate::On(d),
                None => return Err(RowRejection::invalid_date(Some(text))),
            },
            None => return Err(RowRejection::invalid_date(binding.get(row, EventField::Date))),
        };

        // === 时间 ===
        let raw_start = cell(EventField::StartTime);
        let raw_end = cell(EventField::EndTime);
        let start_time = raw_start.as_deref().and_then(parse_time);
        let end_time = raw_end.as_deref().and_then(parse_time);

        if self.time_policy == TimePolicy::Required && (start_time.is_none() || end_time.is_none()) {
            return Err(RowRejection::invalid_time(
                raw_start.as_deref(),
                raw_end.as_deref(),
            ));
        }

        // === 其他字段 ===
        let attendance = binding
            .has(EventField::Attendance)
            .then(|| parse_attendance(binding.get(row, EventField::Attendance)));

        Ok(EventPlan {
            title: cell(EventField::Title).unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            date,
            start_time,
            end_time,
            attendance,
            location: cell(EventField::Location),
            description: cell(EventField::Description),
            event_type: cell(EventField::EventType),
            organizers: split_multi_value(binding.get(row, EventField::LeadOrganizer)),
            partners: split_multi_value(binding.get(row, EventField::Partners)),
            advertisements: split_multi_value(binding.get(row, EventField::Advertisement)),
        })
    }
}
