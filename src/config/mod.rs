// ==========================================
// 种禽产蛋预测系统 - 配置层
// ==========================================
// 职责: 预测参数管理（产蛋周期窗口、孵化周数、默认孵化率）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ForecastConfig};
