// ==========================================
// 校园活动管理系统 - 导入配置
// ==========================================
// 职责: 数据库路径 / 行来源选择 / 时间策略 / 重复导入策略
// 优先级: 默认值 < JSON 配置文件 < 环境变量
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 配置键（环境变量名）
pub mod config_keys {
    pub const DB_PATH: &str = "EVENTS_DB_PATH";
    pub const CSV_PATH: &str = "EVENTS_CSV_PATH";
    pub const WORKBOOK_PATH: &str = "EVENTS_WORKBOOK_PATH";
    pub const WORKBOOK_TABS: &str = "EVENTS_WORKBOOK_TABS";
    pub const TIME_POLICY: &str = "EVENTS_TIME_POLICY";
    pub const LOAD_MODE: &str = "EVENTS_LOAD_MODE";
}

/// 默认 CSV 文件名
pub const DEFAULT_CSV_PATH: &str = "SW_Events.csv";

// ==========================================
// TimePolicy - 开始/结束时间是否必填
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePolicy {
    /// 缺失或无法解析 → 拒绝该行（对应 NOT NULL 时间列）
    #[default]
    Required,
    /// 缺失或无法解析 → NULL
    Optional,
}

impl FromStr for TimePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" => Ok(TimePolicy::Required),
            "optional" => Ok(TimePolicy::Optional),
            other => Err(format!("期望 required / optional, 实际 {}", other)),
        }
    }
}

// ==========================================
// LoadMode - 库中已有活动时的处理方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// events 表非空则跳过整次导入
    #[default]
    Guarded,
    /// 始终追加（重复导入会产生重复活动）
    Append,
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guarded" => Ok(LoadMode::Guarded),
            "append" => Ok(LoadMode::Append),
            other => Err(format!("期望 guarded / append, 实际 {}", other)),
        }
    }
}

// ==========================================
// SourceSelection - 选定的行来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// 多 tab 工作簿, 按 tab 顺序拼接
    Workbook { path: PathBuf, tabs: Vec<String> },
    /// 本地 CSV 文件
    Csv { path: PathBuf },
}

impl fmt::Display for SourceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelection::Workbook { path, tabs } => {
                write!(f, "workbook:{}[{}]", path.display(), tabs.join(","))
            }
            SourceSelection::Csv { path } => write!(f, "csv:{}", path.display()),
        }
    }
}

// ==========================================
// LoaderConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub database_path: String,
    pub csv_path: PathBuf,
    pub workbook_path: Option<PathBuf>,
    pub workbook_tabs: Vec<String>,
    pub time_policy: TimePolicy,
    pub load_mode: LoadMode,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            workbook_path: None,
            workbook_tabs: Vec::new(),
            time_policy: TimePolicy::default(),
            load_mode: LoadMode::default(),
        }
    }
}

impl LoaderConfig {
    /// 加载配置: 默认值 → 可选 JSON 文件 → 进程环境变量
    pub fn load(config_file: Option<&Path>) -> ImportResult<Self> {
        let base = match config_file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// 从 JSON 文件读取（缺省字段取默认值）
    pub fn from_json_file(path: &Path) -> ImportResult<Self> {
        let file = File::open(path).map_err(|e| ImportError::ConfigReadError {
            key: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// 用键值查询函数覆写配置（空白值视为未设置）
    pub fn with_overrides<F>(mut self, lookup: F) -> ImportResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(config_keys::DB_PATH) {
            self.database_path = v;
        }
        if let Some(v) = get(config_keys::CSV_PATH) {
            self.csv_path = PathBuf::from(v);
        }
        if let Some(v) = get(config_keys::WORKBOOK_PATH) {
            self.workbook_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(config_keys::WORKBOOK_TABS) {
            self.workbook_tabs = v
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get(config_keys::TIME_POLICY) {
            self.time_policy = parse_value(config_keys::TIME_POLICY, &v)?;
        }
        if let Some(v) = get(config_keys::LOAD_MODE) {
            self.load_mode = parse_value(config_keys::LOAD_MODE, &v)?;
        }

        Ok(self)
    }

    /// 选择行来源
    ///
    /// 工作簿路径与 tab 列表均非空时使用工作簿, 否则回退到 CSV 文件。
    pub fn select_source(&self) -> SourceSelection {
        match &self.workbook_path {
            Some(path) if !path.as_os_str().is_empty() && !self.workbook_tabs.is_empty() => {
                SourceSelection::Workbook {
                    path: path.clone(),
                    tabs: self.workbook_tabs.clone(),
                }
            }
            _ => SourceSelection::Csv {
                path: self.csv_path.clone(),
            },
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> ImportResult<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|message| ImportError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message,
    })
}

/// 默认数据库路径: 用户数据目录下的 campus-events/events.db
pub fn default_db_path() -> String {
    let mut path = PathBuf::from("./campus_events.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("campus-events");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("events.db");
        }
    }

    path.to_string_lossy().to_string()
}
