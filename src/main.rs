// ==========================================
// 校园活动管理系统 - 导入命令行入口
// ==========================================
// 用法: campus-events-load [配置文件.json]
// 配置优先级: 默认值 < 配置文件 < 环境变量（含 .env）
// ==========================================

use anyhow::Context;
use campus_events::config::LoaderConfig;
use campus_events::domain::LoadOutcome;
use campus_events::{importer, logging};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 活动数据导入", campus_events::APP_NAME);
    tracing::info!("系统版本: {}", campus_events::VERSION);
    tracing::info!("==================================================");

    let config_file = std::env::args().nth(1).map(PathBuf::from);
    let config = LoaderConfig::load(config_file.as_deref()).context("加载导入配置失败")?;
    tracing::info!("使用数据库: {}", config.database_path);

    let outcome = importer::load_from_config(&config).context("活动数据导入失败")?;

    match outcome {
        LoadOutcome::Completed(report) => {
            println!("run_id:              {}", report.run_id);
            println!("source:              {}", report.source);
            println!("rows read:           {}", report.total_rows);
            println!("events loaded:       {}", report.processed);
            println!("skipped (date):      {}", report.skipped_invalid_date);
            println!("skipped (time):      {}", report.skipped_invalid_time);
            println!("skipped (db error):  {}", report.skipped_db_error);
            for skipped in &report.skipped_rows {
                println!(
                    "  - {} row {}: {}",
                    skipped.table, skipped.row_number, skipped.detail
                );
            }
        }
        LoadOutcome::SkippedPopulated { existing_events } => {
            println!(
                "database already holds {} events; nothing loaded (set EVENTS_LOAD_MODE=append to force)",
                existing_events
            );
        }
    }

    Ok(())
}
