// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证台账覆盖写、孵化率默认值、需求客户停用、批次查询码、配置读写
// ==========================================


#[cfg(test)]
mod repository_integration_test {
    use hatchery_planner::api::ApiError;
    use hatchery_planner::domain::types::{LedgerKind, Product, YearWeek};

    use crate::test_helpers::{create_test_state, ledger_entry, BatchBuilder};

    // ==========================================
    // 台账
    // ==========================================

    #[test]
    fn test_ledger_upsert_overwrites_same_key() {
        let (_tmp, state) = create_test_state();
        state
            .ledger_api
            .record_entry(ledger_entry(LedgerKind::Sale, 2026, 5, "Agricola Nord", Product::Ross, 800))
            .unwrap();
        state
            .ledger_api
            .record_entry(ledger_entry(LedgerKind::Sale, 2026, 5, "Agricola Nord", Product::Ross, 1_200))
            .unwrap();
        state
            .ledger_api
            .record_entry(ledger_entry(LedgerKind::Purchase, 2026, 5, "Agricola Nord", Product::Ross, 300))
            .unwrap();

        let sales = state.ledger_api.list_entries(LedgerKind::Sale, Some("ross")).unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].quantity, 1_200);

        let purchases = state.ledger_api.list_entries(LedgerKind::Purchase, None).unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].quantity, 300);

        assert!(state
            .ledger_api
            .list_entries(LedgerKind::Sale, Some("Granpollo"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_ledger_rejects_negative_quantity() {
        let (_tmp, state) = create_test_state();
        let result = state
            .ledger_api
            .record_entry(ledger_entry(LedgerKind::Sale, 2026, 5, "Agricola Nord", Product::Ross, -1));
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    // ==========================================
    // 孵化率
    // ==========================================

    #[test]
    fn test_default_hatch_rates_are_seeded_once() {
        let (_tmp, state) = create_test_state();

        // AppState 启动时已写入: 41 个周龄 × 4 个产品 + 4 条外购
        assert_eq!(state.hatchery_api.list_hatch_rates().unwrap().len(), 41 * 4);
        assert_eq!(state.hatchery_api.list_purchase_hatch_rates().unwrap().len(), 4);
        assert_eq!(state.hatchery_api.seed_default_rates().unwrap(), 0);

        state.hatchery_api.set_hatch_rate(40, "Pollo70", 75.5).unwrap();
        state.hatchery_api.set_purchase_hatch_rate("ross", 90.0).unwrap();

        assert_eq!(
            state.store.hatch_rate_repo.find_rate(40, Product::Pollo70).unwrap(),
            Some(75.5)
        );
        assert_eq!(
            state.store.hatch_rate_repo.find_purchase_rate(Product::Ross).unwrap(),
            Some(90.0)
        );
        assert_eq!(
            state.store.hatch_rate_repo.find_rate(40, Product::Ross).unwrap(),
            Some(82.0)
        );
    }

    #[test]
    fn test_hatch_rate_bounds_are_enforced() {
        let (_tmp, state) = create_test_state();

        assert!(matches!(
            state.hatchery_api.set_hatch_rate(23, "ross", 80.0),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.hatchery_api.set_hatch_rate(65, "ross", 80.0),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.hatchery_api.set_hatch_rate(30, "ross", 100.5),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.hatchery_api.set_purchase_hatch_rate("ross", f64::NAN),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.hatchery_api.set_hatch_rate(30, "broiler", 80.0),
            Err(ApiError::InvalidInput(_))
        ));
    }

    // ==========================================
    // 需求客户
    // ==========================================

    #[test]
    fn test_client_deactivation_hides_requests() {
        let (_tmp, state) = create_test_state();
        let birth = YearWeek { year: 2026, week: 20 };

        let keep = state.hatchery_api.add_client("Granpollo", "Avicola Rossi", "female").unwrap();
        let drop = state.hatchery_api.add_client("Granpollo", "Verdi", "both").unwrap();
        state.hatchery_api.set_request(birth, keep.client_id, 400).unwrap();
        state.hatchery_api.set_request(birth, drop.client_id, 600).unwrap();

        let demand = state
            .store
            .demand_repo
            .find_demand(birth, Product::Granpollo)
            .unwrap();
        assert_eq!(demand.total_quantity(), 1_000);

        state.hatchery_api.deactivate_client(drop.client_id).unwrap();
        assert!(matches!(
            state.hatchery_api.deactivate_client(drop.client_id),
            Err(ApiError::NotFound(_))
        ));

        let clients = state.hatchery_api.list_clients("granpollo").unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Avicola Rossi");

        let demand = state
            .store
            .demand_repo
            .find_demand(birth, Product::Granpollo)
            .unwrap();
        assert_eq!(demand.requests.len(), 1);
        assert_eq!(demand.total_quantity(), 400);
    }

    #[test]
    fn test_add_client_validation() {
        let (_tmp, state) = create_test_state();
        assert!(matches!(
            state.hatchery_api.add_client("ross", "  ", "male"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.hatchery_api.add_client("ross", "Bianchi", "capon"),
            Err(ApiError::InvalidInput(_))
        ));
    }

    // ==========================================
    // 批次
    // ==========================================

    #[test]
    fn test_find_batch_by_code() {
        let (_tmp, state) = create_test_state();
        let batch = state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();

        let code = batch.code();
        assert_eq!(code, format!("{}TON2025JA87", batch.batch_id));
        assert_eq!(state.batch_api.find_by_code(&code).unwrap(), batch);
        assert!(matches!(
            state.batch_api.find_by_code("TON2025"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.batch_api.find_by_code("999TON"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_product_rows_are_skipped() {
        let (_tmp, state) = create_test_state();
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();
        {
            let conn = state.store.connection();
            let conn = conn.lock().unwrap();
            conn.execute(
                r#"INSERT INTO batch (farm, shed, product, headcount, start_year, start_week, updated_at)
                   VALUES ('Tonoli', '9', 'BROILER', 5000, 2025, 10, '2025-01-01 00:00:00')"#,
                [],
            )
            .unwrap();
        }

        let active = state.batch_api.list_batches(None, false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].shed, "1");
    }

    #[test]
    fn test_list_batches_filters() {
        let (_tmp, state) = create_test_state();
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "2").inactive().build())
            .unwrap();
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "3").product(Product::Pollo70).build())
            .unwrap();

        assert_eq!(state.batch_api.list_batches(None, false).unwrap().len(), 2);
        assert_eq!(state.batch_api.list_batches(None, true).unwrap().len(), 3);
        assert_eq!(state.batch_api.list_batches(Some("ross"), true).unwrap().len(), 2);
        assert_eq!(state.batch_api.list_batches(Some(" "), false).unwrap().len(), 2);
    }

    // ==========================================
    // 配置
    // ==========================================

    #[test]
    fn test_config_update_and_snapshot() {
        let (_tmp, state) = create_test_state();

        let defaults = state.config_api.get_forecast_config().unwrap();
        assert_eq!(defaults.lifecycle_min_age, 25);
        assert_eq!(defaults.lifecycle_max_age, 64);
        assert_eq!(defaults.incubation_lag_weeks, 3);

        state.config_api.update_config("incubation_lag_weeks", "4").unwrap();
        state.config_api.update_config("default_hatch_rate_pct", "80.5").unwrap();

        let snapshot = state.config_api.list_configs().unwrap();
        assert_eq!(snapshot.get("incubation_lag_weeks").map(String::as_str), Some("4"));

        let config = state.config_api.get_forecast_config().unwrap();
        assert_eq!(config.incubation_lag_weeks, 4);
        assert_eq!(config.default_hatch_rate_pct, 80.5);

        assert!(matches!(
            state.config_api.update_config("no_such_key", "1"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.config_api.update_config("hatch_horizon_weeks", "many"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.config_api.update_config("default_purchase_hatch_rate_pct", "120"),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
