// ==========================================
// 种禽产蛋预测系统 - API 层
// ==========================================
// 职责: 参数校验 + 对上层（HTTP/界面）暴露业务接口
// ==========================================

pub mod batch_api;
pub mod config_api;
pub mod curve_api;
pub mod error;
pub mod forecast_api;
pub mod hatchery_api;
pub mod ledger_api;
pub mod validator;

// 重导出核心类型
pub use batch_api::BatchApi;
pub use config_api::ConfigApi;
pub use curve_api::CurveApi;
pub use error::{ApiError, ApiResult};
pub use forecast_api::ForecastApi;
pub use hatchery_api::HatcheryApi;
pub use ledger_api::LedgerApi;
