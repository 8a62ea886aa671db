// ==========================================
// 校园活动管理系统 - 字段映射器
// ==========================================
// 职责: 逻辑字段 → 有序表头别名列表; 每张表绑定一次
// 说明: 不同来源表头不统一（"Date" / "date", "Name of Event/Activity" / "Event Title"）
// ==========================================

use crate::domain::RawRow;
use std::collections::HashMap;

// ==========================================
// EventField - 逻辑字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Title,
    Date,
    StartTime,
    EndTime,
    Attendance,
    Location,
    Description,
    EventType,
    LeadOrganizer,
    Partners,
    Advertisement,
}

impl EventField {
    pub const ALL: [EventField; 11] = [
        EventField::Title,
        EventField::Date,
        EventField::StartTime,
        EventField::EndTime,
        EventField::Attendance,
        EventField::Location,
        EventField::Description,
        EventField::EventType,
        EventField::LeadOrganizer,
        EventField::Partners,
        EventField::Advertisement,
    ];

    /// 可接受的表头（按优先级排列, 先命中者生效）
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            EventField::Title => &["Name of Event/Activity", "Event Title", "Title"],
            EventField::Date => &["Date", "Event Date"],
            EventField::StartTime => &["Start Time", "Start", "start_time"],
            EventField::EndTime => &["End Time", "End", "end_time"],
            EventField::Attendance => &["Attendance", "Number of Attendees", "Attendees"],
            EventField::Location => &["Location", "Venue"],
            EventField::Description => &["Description", "Details"],
            EventField::EventType => &["Type", "Event Type"],
            EventField::LeadOrganizer => &["Lead Organizer", "Organizer", "Organizers"],
            EventField::Partners => &["Partners", "Partner"],
            EventField::Advertisement => &["Advertisement", "Advertising"],
        }
    }
}

// ==========================================
// HeaderBinding - 逻辑字段 → 实际表头
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HeaderBinding {
    bound: HashMap<EventField, String>,
}

impl HeaderBinding {
    /// 根据一张表的表头绑定全部逻辑字段
    ///
    /// 每个字段按别名顺序匹配: 先精确匹配, 再忽略大小写与首尾空白匹配。
    pub fn bind<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<&str> = headers.into_iter().collect();
        let mut bound = HashMap::new();

        for field in EventField::ALL {
            let hit = field
                .aliases()
                .iter()
                .find_map(|alias| headers.iter().find(|h| **h == *alias))
                .or_else(|| {
                    field.aliases().iter().find_map(|alias| {
                        headers
                            .iter()
                            .find(|h| h.trim().eq_ignore_ascii_case(alias))
                    })
                });

            if let Some(header) = hit {
                bound.insert(field, header.to_string());
            }
        }

        Self { bound }
    }

    /// 以单行的键集合绑定（行来源未提供表头时使用）
    pub fn from_row(row: &RawRow) -> Self {
        let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
        keys.sort_unstable();
        Self::bind(keys)
    }

    /// 字段是否出现在来源表头中
    pub fn has(&self, field: EventField) -> bool {
        self.bound.contains_key(&field)
    }

    /// 取原始单元格（未清洗）
    pub fn get<'r>(&self, row: &'r RawRow, field: EventField) -> Option<&'r str> {
        let header = self.bound.get(&field)?;
        row.get(header).map(String::as_str)
    }

    /// 绑定到的实际表头
    pub fn header(&self, field: EventField) -> Option<&str> {
        self.bound.get(&field).map(String::as_str)
    }

    /// 未绑定的字段（用于日志提示）
    pub fn missing_fields(&self) -> Vec<EventField> {
        EventField::ALL
            .into_iter()
            .filter(|f| !self.bound.contains_key(f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_first_alias_wins() {
        let binding = HeaderBinding::bind(["Title", "Event Title", "Date"]);
        assert_eq!(binding.header(EventField::Title), Some("Event Title"));
        assert_eq!(binding.header(EventField::Date), Some("Date"));
    }

    #[test]
    fn test_bind_case_insensitive_fallback() {
        let binding = HeaderBinding::bind(["date", " start time ", "LOCATION"]);
        assert_eq!(binding.header(EventField::Date), Some("date"));
        assert_eq!(binding.header(EventField::StartTime), Some(" start time "));
        assert_eq!(binding.header(EventField::Location), Some("LOCATION"));
        assert!(!binding.has(EventField::EndTime));
    }

    #[test]
    fn test_exact_match_preferred_over_case_fold() {
        let binding = HeaderBinding::bind(["date", "Date"]);
        assert_eq!(binding.header(EventField::Date), Some("Date"));
    }

    #[test]
    fn test_get_reads_bound_column() {
        let mut row = RawRow::new();
        row.insert("Name of Event/Activity".to_string(), "Welcome Fair".to_string());
        let binding = HeaderBinding::from_row(&row);

        assert_eq!(binding.get(&row, EventField::Title), Some("Welcome Fair"));
        assert_eq!(binding.get(&row, EventField::Date), None);
        assert!(binding.missing_fields().contains(&EventField::Date));
    }
}
