// ==========================================
// 种禽产蛋预测系统 - 应用层
// ==========================================
// 职责: 装配存储与 API，供上层界面/服务持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
