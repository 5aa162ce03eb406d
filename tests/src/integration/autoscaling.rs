//! # Autoscaling Flows
//!
//! The controller sampling pool occupancy and resizing a real validator
//! pool.
//!
//! | Occupancy | Validators |
//! |-----------|------------|
//! | < 40 % | base only |
//! | >= 60 % | base + 1 |
//! | >= 80 % | base + 2 |

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ac_06_validation::ValidatorState;
    use ac_07_autoscaler::{AutoscalerController, ControllerConfig, ScalePolicy};
    use shared_bus::ShutdownSignal;

    use crate::integration::fixtures::{wait_until, within, Pipeline};

    fn config(interval: Duration) -> ControllerConfig {
        ControllerConfig {
            interval,
            transactions_per_block: 3,
            policy: ScalePolicy::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_auxiliary_at_65_percent_retired_at_35() {
        let p = Pipeline::new(20, 3, 10);
        let txs = p.publish("load", 13).await;
        let mut controller = AutoscalerController::new(
            config(Duration::from_secs(60)),
            p.pool.clone(),
            p.validators.clone(),
            p.signals.clone(),
        )
        .unwrap();

        let report = controller.run_cycle();
        assert_eq!(report.occupied, 13);
        assert_eq!(report.validators_before, 1);
        assert_eq!(report.validators_after, 2);
        assert_eq!(p.validators.active(), 2);
        let slots: Vec<usize> = p.validators.states().into_iter().map(|(i, _)| i).collect();
        assert_eq!(slots, vec![0, 1]);

        // Same occupancy, no churn.
        assert_eq!(controller.run_cycle().validators_after, 2);

        for tx in &txs[..6] {
            assert!(p.pool.release(tx.id()));
        }
        let report = controller.run_cycle();
        assert_eq!(report.occupied, 7);
        assert_eq!(report.validators_after, 1);
        assert_eq!(p.validators.active(), 1);
        assert_eq!(p.validators.states()[0].0, 0);

        p.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_occupancy_request_triggers_cycle_between_ticks() {
        let p = Pipeline::new(20, 3, 10);
        let controller = AutoscalerController::new(
            config(Duration::from_secs(3600)),
            p.pool.clone(),
            p.validators.clone(),
            p.signals.clone(),
        )
        .unwrap();
        let stop = ShutdownSignal::new();
        let handle = tokio::spawn(controller.run(stop.subscribe()));

        // The first tick fires at start with an empty pool.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(p.validators.active(), 1);

        p.publish("burst", 17).await;
        p.signals.occupancy_check.request();
        wait_until(|| p.validators.active() == 3).await;
        wait_until(|| {
            p.validators
                .states()
                .iter()
                .all(|(_, state)| *state == ValidatorState::Reading)
        })
        .await;

        stop.trigger();
        within(handle).await.unwrap();
        p.stop().await;
        assert_eq!(p.validators.active(), 0);
    }
}
