// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库 / 临时 CSV / 结果查询
// ==========================================

#![allow(dead_code)]

use campus_events::db::{init_schema, open_sqlite_connection};
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// 与样例表格一致的表头
pub const EVENT_HEADER: &str =
    "Date,Name of Event/Activity,Start Time,End Time,Attendance,Location,Organizers,Partners,Type,Advertisement";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 写入临时 CSV 文件（首行为表头）
pub fn write_csv(lines: &[&str]) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(file)
}

/// 按插入顺序返回全部活动标题
pub fn event_titles(conn: &Connection) -> Result<Vec<String>, Box<dyn Error>> {
    let mut stmt = conn.prepare("SELECT title FROM events ORDER BY id")?;
    let titles = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(titles)
}

/// 统计任意表行数
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, Box<dyn Error>> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}
