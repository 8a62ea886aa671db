// ==========================================
// 校园活动管理系统 - 单元格清洗与解析
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期解析 / 时间解析 / 人数解析
// 约束: 纯函数, 解析失败一律返回 None（或默认值）, 不返回错误
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// "Month DD" 片段（允许缩写月份、序数后缀）
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b").unwrap()
});

/// 独立的 4 位年份
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

/// 清洗单元格
///
/// - None / 空白 / "none"（不区分大小写）→ None
/// - 其他 → 去除首尾空白后的文本
pub fn clean_cell(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 拆分逗号分隔的多值单元格, 逐项清洗, 丢弃空项
pub fn split_multi_value(raw: Option<&str>) -> Vec<String> {
    raw.map(|cell| {
        cell.split(',')
            .filter_map(|piece| clean_cell(Some(piece)))
            .collect()
    })
    .unwrap_or_default()
}

/// 解析 12 小时制时间: "3pm" / "3:30pm" / "8.30pm"
///
/// 输入应已经过 [`clean_cell`]。"." 视为分钟分隔符;
/// 缺少分钟时在 am/pm 后缀前补 ":00"。
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let normalized: String = raw
        .trim()
        .to_lowercase()
        .replace('.', ":")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if normalized.is_empty() {
        return None;
    }

    let chars: Vec<char> = normalized.chars().collect();
    let split = chars.len().saturating_sub(2);
    let head: String = chars[..split].iter().collect();
    let suffix: String = chars[split..].iter().collect();

    let candidate = if head.contains(':') {
        normalized
    } else {
        format!("{}:00{}", head, suffix)
    };

    NaiveTime::parse_from_str(&candidate, "%I:%M%p").ok()
}

/// 宽松日期解析, 依次尝试:
/// 1. `DD-Mon-YY`（25-Jul-24）
/// 2. `Month DD, YYYY`（November 6, 2024）
/// 3. 抽取首个 `Month DD` 与独立 4 位年份（November 6-7, 2024 → 11-06）
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%d-%b-%y") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%B %d, %Y") {
        return Some(date);
    }

    let year = YEAR_RE.captures(value)?.get(1)?.as_str();
    MONTH_DAY_RE.captures_iter(value).find_map(|caps| {
        let candidate = format!("{} {} {}", &caps[1], &caps[2], year);
        NaiveDate::parse_from_str(&candidate, "%B %d %Y").ok()
    })
}

/// 解析参与人数: 去掉千分位与空白; 非数字按 0 处理
pub fn parse_attendance(raw: Option<&str>) -> u32 {
    let digits: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if let Ok(n) = digits.parse::<u32>() {
        return n;
    }

    // 表格导出的数值单元格可能带 ".0"
    match digits.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => f as u32,
        _ => 0,
    }
}
