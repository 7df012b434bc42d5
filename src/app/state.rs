// ==========================================
// 种禽产蛋预测系统 - 应用状态
// ==========================================
// 职责: 打开数据库、装配全部 API 实例（共用一个连接）
// 上层（HTTP/界面）持有 AppState 即可调用全部业务接口
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{BatchApi, ConfigApi, CurveApi, ForecastApi, HatcheryApi, LedgerApi};
use crate::config::config_manager::ConfigManager;
use crate::repository::error::RepositoryResult;
use crate::repository::store::SqliteForecastStore;

/// 显式指定数据库路径的环境变量
pub const DB_PATH_ENV: &str = "HATCHERY_PLANNER_DB_PATH";

/// 默认数据库文件名
const DB_FILE_NAME: &str = "hatchery_planner.db";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 存储（各表仓储的聚合）
    pub store: SqliteForecastStore,

    pub batch_api: Arc<BatchApi>,
    pub curve_api: Arc<CurveApi>,
    pub ledger_api: Arc<LedgerApi>,
    pub hatchery_api: Arc<HatcheryApi>,
    pub forecast_api: Arc<ForecastApi>,
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 打开数据库（自动建表）并装配 API
    ///
    /// 孵化率表为空时写入默认值
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        info!(db_path = %db_path, "初始化AppState");

        let store = SqliteForecastStore::open(&db_path)?;
        let seeded = store.hatch_rate_repo.seed_defaults()?;
        if seeded > 0 {
            info!(seeded, "首次启动，已写入默认孵化率");
        }

        let config_manager = Arc::new(ConfigManager::from_connection(store.connection()));

        Ok(Self {
            batch_api: Arc::new(BatchApi::new(store.batch_repo.clone())),
            curve_api: Arc::new(CurveApi::new(store.curve_repo.clone())),
            ledger_api: Arc::new(LedgerApi::new(store.ledger_repo.clone())),
            hatchery_api: Arc::new(HatcheryApi::new(
                store.hatch_rate_repo.clone(),
                store.demand_repo.clone(),
            )),
            forecast_api: Arc::new(ForecastApi::new(
                Arc::new(store.clone()),
                store.batch_repo.clone(),
                config_manager.clone(),
            )),
            config_api: Arc::new(ConfigApi::new(config_manager)),
            store,
            db_path,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("hatchery-planner");
            if let Err(e) = std::fs::create_dir_all(&dir) {
                warn!(dir = %dir.display(), error = %e, "无法创建数据目录，使用当前目录");
                return DB_FILE_NAME.to_string();
            }
            dir.join(DB_FILE_NAME).to_string_lossy().into_owned()
        }
        None => PathBuf::from(".")
            .join(DB_FILE_NAME)
            .to_string_lossy()
            .into_owned(),
    }
}
