// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证批次乐观锁与并发填充缓存的安全性
// ==========================================


#[cfg(test)]
mod concurrent_control_test {
    use hatchery_planner::api::ApiError;
    use hatchery_planner::domain::batch::BatchChanges;
    use std::sync::Arc;
    use std::thread;

    use crate::test_helpers::{create_test_state, seed_curve, BatchBuilder};

    #[test]
    fn test_stale_version_is_rejected_and_row_unchanged() {
        let (_tmp, state) = create_test_state();
        let batch = state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();
        assert_eq!(batch.version, 1);

        // 用户 A 先提交
        let first = state
            .batch_api
            .update_batch(
                batch.batch_id,
                BatchChanges {
                    headcount: Some(9_000),
                    ..Default::default()
                },
                1,
            )
            .unwrap();
        assert_eq!(first.version, 2);

        // 用户 B 仍持有 version 1
        let err = state
            .batch_api
            .update_batch(
                batch.batch_id,
                BatchChanges {
                    headcount: Some(1),
                    shed: Some("9".to_string()),
                    ..Default::default()
                },
                1,
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::OptimisticLockFailure(_)));

        let stored = state.batch_api.get_batch(batch.batch_id).unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.headcount, 9_000);
        assert_eq!(stored.shed, "1");
    }

    #[test]
    fn test_empty_changes_check_version_without_bump() {
        let (_tmp, state) = create_test_state();
        let batch = state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();

        let same = state
            .batch_api
            .update_batch(batch.batch_id, BatchChanges::default(), 1)
            .unwrap();
        assert_eq!(same.version, 1);

        let err = state
            .batch_api
            .update_batch(batch.batch_id, BatchChanges::default(), 7)
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_concurrent_version_race_has_single_winner() {
        let (_tmp, state) = create_test_state();
        let batch = state
            .batch_api
            .create_batch(BatchBuilder::new("Tonoli", "1").build())
            .unwrap();

        let api = state.batch_api.clone();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let api = Arc::clone(&api);
                let batch_id = batch.batch_id;
                thread::spawn(move || {
                    api.update_batch(
                        batch_id,
                        BatchChanges {
                            headcount: Some(1_000 * (i + 1)),
                            ..Default::default()
                        },
                        1,
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ApiError::OptimisticLockFailure(_))))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(conflicts, 3);
        assert_eq!(state.batch_api.get_batch(batch.batch_id).unwrap().version, 2);
    }

    #[test]
    fn test_concurrent_fills_do_not_corrupt_cache() {
        let (_tmp, state) = create_test_state();
        seed_curve(&state.store, "JA87", &[("30", "50"), ("31", "48,5"), ("32", "47")]);
        for shed in ["1", "2", "3"] {
            state
                .batch_api
                .create_batch(BatchBuilder::new("Tonoli", shed).build())
                .unwrap();
        }

        let api = state.forecast_api.clone();
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let api = Arc::clone(&api);
                thread::spawn(move || api.weekly_summary(Some("ross")).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for summary in &results[1..] {
            assert_eq!(summary, &results[0]);
        }

        let cached = state.store.cache_repo.find_all(None).unwrap();
        assert_eq!(cached.len(), 9);
        assert!(cached.iter().all(|e| e.is_valid()));
        assert_eq!(results[0].len(), 3);
        assert_eq!(results[0][0].production_total, 105_000);
    }
}
