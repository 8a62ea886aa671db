// ==========================================
// 校园活动管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单元格解析失败不是错误（返回 None）, 行校验失败走 RowRejection
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 行来源错误（对整次导入致命）=====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误（批次级别, 非单行）=====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::ConfigReadError {
            key: "config_file".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
