// ==========================================
// 校园活动管理系统 - 行来源适配器
// ==========================================
// 支持: 工作簿 (.xlsx/.xls/.ods, 多 tab 拼接) / CSV (.csv)
// 约束: 两种来源产出相同的 RawTable 结构; 来源不可用对整次导入致命
// ==========================================

use crate::config::SourceSelection;
use crate::domain::{RawRow, RawTable};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ==========================================
// RowSource Trait
// ==========================================
pub trait RowSource {
    /// 读取全部表（按来源顺序）
    fn read_tables(&self) -> ImportResult<Vec<RawTable>>;

    /// 来源描述（日志 / load_run 记录）
    fn describe(&self) -> String;
}

/// 按配置构造行来源
pub fn row_source_for(selection: &SourceSelection) -> Box<dyn RowSource> {
    match selection {
        SourceSelection::Workbook { path, tabs } => {
            Box::new(WorkbookRowSource::new(path.clone(), tabs.clone()))
        }
        SourceSelection::Csv { path } => Box::new(CsvRowSource::new(path.clone())),
    }
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

/// 表头 + 单元格 → RawRow; 完全空白的行返回 None
fn build_row<I>(headers: &[String], cells: I) -> Option<RawRow>
where
    I: IntoIterator<Item = String>,
{
    let mut row_map = RawRow::new();
    for (col_idx, value) in cells.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            row_map.insert(header.clone(), value.trim().to_string());
        }
    }

    if row_map.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row_map)
    }
}

/// 工作簿单元格 → 文本
///
/// 日期单元格按 `DD-Mon-YY` 输出, 纯时间单元格按 12 小时制输出,
/// 与表格作者手填的格式保持一致。
fn workbook_cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => format_excel_datetime(value),
            None => cell.to_string(),
        },
        _ => cell.to_string(),
    }
}

fn format_excel_datetime(value: NaiveDateTime) -> String {
    // Excel 纪元日（1899-12-30/31）上的值只有时间部分
    if value.date().year() < 1900 {
        value.format("%I:%M%p").to_string()
    } else {
        value.format("%d-%b-%y").to_string()
    }
}

// ==========================================
// CSV 行来源
// ==========================================
pub struct CsvRowSource {
    path: PathBuf,
}

impl CsvRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for CsvRowSource {
    fn read_tables(&self) -> ImportResult<Vec<RawTable>> {
        let path = self.path.as_path();
        ensure_exists(path)?;

        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "csv".to_string());
        let mut table = RawTable::new(name, headers, Vec::new());

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            if let Some(row) = build_row(&table.headers, record.iter().map(str::to_string)) {
                table.push_row(idx + 1, row);
            }
        }

        debug!(file = %path.display(), rows = table.rows.len(), "CSV 读取完成");
        Ok(vec![table])
    }

    fn describe(&self) -> String {
        SourceSelection::Csv {
            path: self.path.clone(),
        }
        .to_string()
    }
}

// ==========================================
// 工作簿行来源（每个 tab 一张表）
// ==========================================
pub struct WorkbookRowSource {
    path: PathBuf,
    tabs: Vec<String>,
}

impl WorkbookRowSource {
    pub fn new(path: impl Into<PathBuf>, tabs: Vec<String>) -> Self {
        Self {
            path: path.into(),
            tabs,
        }
    }
}

impl RowSource for WorkbookRowSource {
    fn read_tables(&self) -> ImportResult<Vec<RawTable>> {
        ensure_exists(&self.path)?;

        let mut workbook = open_workbook_auto(&self.path)?;
        let sheet_names = workbook.sheet_names();

        let mut tables = Vec::with_capacity(self.tabs.len());
        for tab in &self.tabs {
            if !sheet_names.iter().any(|name| name == tab) {
                return Err(ImportError::SheetNotFound(tab.clone()));
            }

            let range = workbook
                .worksheet_range(tab)
                .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

            let mut sheet_rows = range.rows();
            let Some(header_row) = sheet_rows.next() else {
                warn!(tab = %tab, "工作表为空");
                tables.push(RawTable::new(tab.clone(), Vec::new(), Vec::new()));
                continue;
            };

            let headers: Vec<String> = header_row
                .iter()
                .map(|cell| workbook_cell_text(cell).trim().to_string())
                .collect();
            let mut table = RawTable::new(tab.clone(), headers, Vec::new());

            for (idx, data_row) in sheet_rows.enumerate() {
                if let Some(row) = build_row(&table.headers, data_row.iter().map(workbook_cell_text)) {
                    table.push_row(idx + 1, row);
                }
            }

            debug!(tab = %tab, rows = table.rows.len(), "工作表读取完成");
            tables.push(table);
        }

        Ok(tables)
    }

    fn describe(&self) -> String {
        SourceSelection::Workbook {
            path: self.path.clone(),
            tabs: self.tabs.clone(),
        }
        .to_string()
    }
}
