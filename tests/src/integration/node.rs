//! # Node Flows
//!
//! The supervisor wiring every role together: generators feed the pool,
//! miners and validators grow the chain, and the statistics collector stops
//! the node once the ledger is full.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use node_runtime::{GeneratorConfig, Node, NodeConfig};

    use crate::integration::fixtures::within;

    fn small_node(ledger_capacity: usize) -> NodeConfig {
        NodeConfig {
            num_miners: 2,
            pool_capacity: 10,
            transactions_per_block: 2,
            ledger_capacity,
            controller_interval_ms: 200,
            producer_wait_ms: 100,
            miner_recheck_ms: 50,
            transport_retry_ms: 10,
            validator_drain_ms: 1000,
            generators: vec![GeneratorConfig {
                reward: 1,
                interval_ms: 200,
            }],
            ..NodeConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_node_stops_itself_when_ledger_is_full() {
        let node = Node::start(small_node(2)).unwrap();
        within(node.stopped()).await;

        let summary = within(node.shutdown()).await;
        assert_eq!(summary.ledger.blocks.len(), 2);
        assert!(summary.ledger.chain_is_valid());
        assert_eq!(summary.statistics.committed_blocks, 2);
        assert_eq!(summary.statistics.ledger_capacity, 2);
        assert!(summary.statistics.total_valid >= 2);
        assert_eq!(summary.validation.blocks_committed, 2);
        assert!(summary.mining.blocks_published >= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_requested_shutdown_leaves_consistent_ledger() {
        let node = Node::start(small_node(50)).unwrap();
        node.request_report();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!node.signals().shutdown.is_triggered());

        node.request_shutdown();
        within(node.stopped()).await;
        let summary = within(node.shutdown()).await;
        assert!(summary.ledger.chain_is_valid());
        assert_eq!(
            summary.statistics.committed_blocks,
            summary.ledger.blocks.len()
        );
        assert!(summary.ledger.blocks.len() < 50);
    }

    #[tokio::test]
    async fn test_invalid_config_refused() {
        let config = NodeConfig {
            transactions_per_block: 11,
            ..small_node(2)
        };
        assert!(Node::start(config).is_err());
    }
}
