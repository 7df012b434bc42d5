// Small reporting utility: print the weekly egg summary or the hatch plan as JSON.
//
// Usage:
//   cargo run --bin forecast_report -- [db_path] [summary|hatch] [product]
//
// db_path defaults to the per-user data dir (HATCHERY_PLANNER_DB_PATH overrides it).
// The hatch report requires a product; the summary report treats it as an optional filter.

use hatchery_planner::app::{get_default_db_path, AppState};
use hatchery_planner::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "-")
        .unwrap_or_else(get_default_db_path);
    let report = args.next().unwrap_or_else(|| "summary".to_string());
    let product = args.next();

    tracing::info!(db_path = %db_path, report = %report, "生成预测报表");
    let state = AppState::new(db_path)?;

    let json = match report.as_str() {
        "summary" => {
            let summary = state.forecast_api.weekly_summary(product.as_deref())?;
            serde_json::to_string_pretty(&summary)?
        }
        "hatch" => {
            let product = product.ok_or("hatch report requires a product (e.g. ross)")?;
            let plan = state.forecast_api.plan_hatch(&product, None, None)?;
            serde_json::to_string_pretty(&plan)?
        }
        other => return Err(format!("unknown report '{}' (expected summary|hatch)", other).into()),
    };

    println!("{}", json);
    Ok(())
}
