// ==========================================
// 校园活动管理系统 - 配置层
// ==========================================
// 职责: 导入配置加载（JSON 文件 + 环境变量）与行来源选择
// ==========================================

pub mod loader_config;

// 重导出核心配置
pub use loader_config::{
    config_keys, default_db_path, LoadMode, LoaderConfig, SourceSelection, TimePolicy,
};
