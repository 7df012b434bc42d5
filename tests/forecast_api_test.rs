// ==========================================
// 预测 API 集成测试
// ==========================================
// 职责: 验证周汇总、外售先进先出冲抵、出雏计划与需求冲抵、参数校验
// ==========================================


#[cfg(test)]
mod forecast_api_test {
    use hatchery_planner::api::ApiError;
    use hatchery_planner::domain::types::{LedgerKind, Product, YearWeek};

    use crate::test_helpers::{create_test_state, ledger_entry, seed_curve, BatchBuilder};

    // ==========================================
    // 周汇总
    // ==========================================

    #[test]
    fn test_projection_arithmetic_through_api() {
        let (_tmp, state) = create_test_state();
        seed_curve(&state.store, "JA87", &[("30", "50")]);
        let batch = state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();

        let facts = state.forecast_api.project_batch(batch.batch_id, None, None).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].eggs, 35_000);
        assert_eq!(facts[0].source_label, "Tonoli 1");

        // 显式窗口排除第 30 周龄
        let facts = state
            .forecast_api
            .project_batch(batch.batch_id, Some(31), Some(64))
            .unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_net_total_can_be_negative() {
        let (_tmp, state) = create_test_state();
        state
            .ledger_api
            .record_entry(ledger_entry(
                LedgerKind::Sale,
                2026,
                12,
                "Agricola Nord",
                Product::Ross,
                500,
            ))
            .unwrap();

        let summary = state.forecast_api.weekly_summary(Some("ross")).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].calendar, YearWeek { year: 2026, week: 12 });
        assert_eq!(summary[0].production_total, 0);
        assert_eq!(summary[0].purchase_total, 0);
        assert_eq!(summary[0].sale_total, 500);
        assert_eq!(summary[0].net_total, -500);
        assert_eq!(summary[0].sale_breakdown[0].counterparty, "Agricola Nord");
    }

    #[test]
    fn test_summary_merges_sources_and_filters_product() {
        let (_tmp, state) = create_test_state();
        seed_curve(&state.store, "JA87", &[("30", "50")]);
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();
        state
            .ledger_api
            .record_entries(&[
                ledger_entry(LedgerKind::Purchase, 2025, 40, "Incubatoio Sud", Product::Ross, 2_000),
                ledger_entry(LedgerKind::Sale, 2025, 40, "Agricola Nord", Product::Ross, 1_000),
                ledger_entry(LedgerKind::Sale, 2025, 40, "Pollo Verde", Product::Pollo70, 9_000),
                ledger_entry(LedgerKind::Purchase, 2025, 41, "Incubatoio Sud", Product::Ross, 0),
            ])
            .unwrap();

        let summary = state.forecast_api.weekly_summary(Some("ross")).unwrap();
        // 数量为 0 的台账不产生汇总周
        assert_eq!(summary.len(), 1);
        let week = &summary[0];
        assert_eq!(week.production_total, 35_000);
        assert_eq!(week.purchase_total, 2_000);
        assert_eq!(week.sale_total, 1_000);
        assert_eq!(week.net_total, 36_000);

        let all = state.forecast_api.weekly_summary(None).unwrap();
        assert_eq!(all[0].sale_total, 10_000);
        assert_eq!(all[0].net_total, 27_000);
    }

    // ==========================================
    // 出雏计划
    // ==========================================

    /// 两个批次在 2026/10 分别处于 26 周龄和 30 周龄，各产 1000 枚
    fn seed_fifo_scenario(state: &hatchery_planner::app::AppState) {
        // 10000 × 1.43% × 7 = 1001 → 1000
        seed_curve(&state.store, "JA87", &[("26", "1,43%"), ("30", "1,43%")]);
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").start(2025, 36).build())
            .unwrap();
        state
            .batch_api
            .create_batch(BatchBuilder::new("Passirano", "2").start(2025, 32).build())
            .unwrap();
    }

    #[test]
    fn test_hatch_plan_sale_fifo_by_age() {
        let (_tmp, state) = create_test_state();
        seed_fifo_scenario(&state);
        state
            .hatchery_api
            .set_hatch_rate(30, "ross", 80.0)
            .unwrap();
        state
            .ledger_api
            .record_entries(&[
                ledger_entry(LedgerKind::Sale, 2026, 10, "Agricola Nord", Product::Ross, 1_500),
                ledger_entry(LedgerKind::Purchase, 2026, 10, "Incubatoio Sud", Product::Ross, 1_000),
            ])
            .unwrap();

        let plan = state
            .forecast_api
            .plan_hatch_from("ross", Some(3), Some(1), YearWeek { year: 2026, week: 10 })
            .unwrap();

        assert!(plan.has_sales);
        assert!(plan.has_purchases);
        assert_eq!(plan.weeks.len(), 1);

        let week = &plan.weeks[0];
        assert_eq!(week.birth_week, YearWeek { year: 2026, week: 13 });
        assert_eq!(week.source_week, YearWeek { year: 2026, week: 10 });
        assert_eq!(week.eggs_produced, 2_000);
        assert_eq!(week.eggs_purchased, 1_000);
        assert_eq!(week.eggs_sold, 1_500);
        assert_eq!(week.net_eggs, 1_500);
        assert_eq!(week.unallocated_sale, 0);
        assert_eq!(week.production_details.len(), 2);

        // 26 周龄全部被外售冲抵，不出现在换算明细中
        assert_eq!(week.conversion_details.len(), 2);
        let own = &week.conversion_details[0];
        assert_eq!(own.age_week, Some(30));
        assert_eq!(own.eggs, 500);
        assert_eq!(own.rate_pct, 80.0);
        assert_eq!(own.animals, 400);
        let bought = &week.conversion_details[1];
        assert_eq!(bought.age_week, None);
        assert_eq!(bought.eggs, 1_000);
        assert_eq!(bought.rate_pct, 84.0);
        assert_eq!(bought.animals, 840);

        // 400 + 840 = 1240 → 1200
        assert_eq!(week.animals_possible, 1_200);
        assert_eq!(week.male_available, 600);
        assert_eq!(week.female_available, 600);
    }

    #[test]
    fn test_hatch_plan_demand_netting() {
        let (_tmp, state) = create_test_state();
        seed_fifo_scenario(&state);

        let male = state.hatchery_api.add_client("ross", "Avicola Rossi", "male").unwrap();
        let both = state.hatchery_api.add_client("ross", "Bianchi", "both").unwrap();
        let gone = state.hatchery_api.add_client("ross", "Verdi", "female").unwrap();
        let birth = YearWeek { year: 2026, week: 13 };
        state.hatchery_api.set_request(birth, male.client_id, 300).unwrap();
        state.hatchery_api.set_request(birth, both.client_id, 501).unwrap();
        state.hatchery_api.set_request(birth, gone.client_id, 999).unwrap();
        state.hatchery_api.deactivate_client(gone.client_id).unwrap();

        let plan = state
            .forecast_api
            .plan_hatch_from("ross", Some(3), Some(2), YearWeek { year: 2026, week: 10 })
            .unwrap();
        assert!(!plan.has_sales);
        assert!(!plan.has_purchases);

        let week = &plan.weeks[0];
        // 2000 × 82% = 1640 → 1600
        assert_eq!(week.animals_possible, 1_600);
        assert_eq!(week.demand.requests.len(), 2);
        assert_eq!(week.male_requested, 550);
        assert_eq!(week.female_requested, 251);
        assert_eq!(week.male_surplus, 250);
        assert_eq!(week.female_surplus, 549);
        assert_eq!(week.total_surplus, 799);

        // 来源周 2026/11 无产量也无需求
        let next = &plan.weeks[1];
        assert_eq!(next.birth_week, YearWeek { year: 2026, week: 14 });
        assert_eq!(next.animals_possible, 0);
        assert_eq!(next.total_surplus, 0);
    }

    #[test]
    fn test_hatch_plan_rolls_over_year_boundary() {
        let (_tmp, state) = create_test_state();

        let plan = state
            .forecast_api
            .plan_hatch_from("Color Yeald", None, Some(3), YearWeek { year: 2025, week: 50 })
            .unwrap();

        let weeks: Vec<(YearWeek, YearWeek)> = plan
            .weeks
            .iter()
            .map(|w| (w.birth_week, w.source_week))
            .collect();
        assert_eq!(
            weeks,
            vec![
                (YearWeek { year: 2026, week: 1 }, YearWeek { year: 2025, week: 50 }),
                (YearWeek { year: 2026, week: 2 }, YearWeek { year: 2025, week: 51 }),
                (YearWeek { year: 2026, week: 3 }, YearWeek { year: 2025, week: 52 }),
            ]
        );
        assert_eq!(plan.product, Product::ColorYeald);
        assert_eq!(plan.lag_weeks, 3);
    }

    // ==========================================
    // 参数校验
    // ==========================================

    #[test]
    fn test_malformed_arguments_are_rejected() {
        let (_tmp, state) = create_test_state();

        assert!(matches!(
            state.forecast_api.weekly_summary(Some("broiler")),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.forecast_api.plan_hatch("ross", Some(-1), None),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.forecast_api.plan_hatch("ross", None, Some(0)),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.forecast_api.project_batch(1, Some(64), Some(25)),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.forecast_api.project_batch(999, None, None),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            state
                .batch_api
                .create_batch(BatchBuilder::new("Tonoli", "1").start(2025, 53).build()),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state
                .ledger_api
                .record_entry(ledger_entry(LedgerKind::Sale, 2026, 0, "X", Product::Ross, 10)),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_inverted_configured_window_yields_empty_summary() {
        let (_tmp, state) = create_test_state();
        seed_curve(&state.store, "JA87", &[("30", "50")]);
        state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();

        state.config_api.update_config("lifecycle_min_age_week", "64").unwrap();
        state.config_api.update_config("lifecycle_max_age_week", "25").unwrap();

        assert!(state.forecast_api.weekly_summary(None).unwrap().is_empty());
    }
}
