// src/orchestration/mod.rs
use crate::results::ResultSink;
use crate::swap::SwapWorkflow;
use crate::types::{RunnerConfig, SwapOutcome, SwapRecord};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const RESULT_CATEGORY: &str = "rhino_bridge";
const EXPLORER_TX_BASE: &str = "https://opbnbscan.com/tx/";

/// Add the 0x prefix when the node returned a bare hex hash
fn ensure_0x(hash: &str) -> String {
    if hash.starts_with("0x") {
        hash.to_string()
    } else {
        format!("0x{hash}")
    }
}

/// Runs every wallet's workflow concurrently under a global semaphore of
/// `threads` permits. A permit is held across the start delay and the whole
/// workflow body; one wallet's failure never touches its siblings.
pub struct Orchestrator {
    config: Arc<RunnerConfig>,
    sink: Arc<dyn ResultSink>,
}

impl Orchestrator {
    pub fn new(config: RunnerConfig, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
        }
    }

    /// Run the full batch to completion
    pub async fn run(&self) {
        let config = self.config.clone();
        self.execute(move |private_key, delay| {
            let config = config.clone();
            async move { Self::bridge_wallet(config, private_key, delay).await }
        })
        .await;
    }

    /// Fan-out scheduling: one task per wallet, gated by the semaphore,
    /// every outcome appended to the sink. Generic over the per-wallet job
    /// so scheduling behavior is testable without the network.
    async fn execute<F, Fut>(&self, worker: F)
    where
        F: Fn(String, u64) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = SwapOutcome> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.threads));

        tracing::info!(
            "Preparing bridge tasks for {} wallets..",
            self.config.wallets.len()
        );

        let mut handles = Vec::with_capacity(self.config.wallets.len());
        for private_key in &self.config.wallets {
            let delay = self.config.delay_before_start.sample();
            let semaphore = semaphore.clone();
            let sink = self.sink.clone();
            let worker = worker.clone();
            let private_key = private_key.clone();

            handles.push(tokio::spawn(async move {
                // the semaphore is never closed; treat closure as a no-op skip
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let outcome = worker(private_key, delay).await;
                let record = SwapRecord::new(&outcome, RESULT_CATEGORY);
                if let Err(e) = sink.append(record).await {
                    tracing::error!(
                        wallet = %outcome.address,
                        "Failed to persist outcome: {e}"
                    );
                }
            }));
        }

        tracing::info!("Prepared {} swap tasks. Starting execution..", handles.len());

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Swap task aborted: {e}");
            }
        }
    }

    /// The real per-wallet job: delay, run the workflow, log the result
    async fn bridge_wallet(
        config: Arc<RunnerConfig>,
        private_key: String,
        delay: u64,
    ) -> SwapOutcome {
        let workflow =
            match SwapWorkflow::new(&config.rpc_url, &config.api_key, &private_key, config.amount)
            {
                Ok(workflow) => workflow,
                Err(e) => {
                    // no address to tag without a parseable key
                    return SwapOutcome {
                        address: "unknown".to_string(),
                        success: false,
                        detail: e.to_string(),
                    };
                }
            };

        let address = workflow.address().to_string();

        if delay > 0 {
            tracing::info!(wallet = %address, "Waiting for {delay} seconds before starting..");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        tracing::info!(wallet = %address, "Bridge all BNB (opBNB -> BSC)..");
        let outcome = workflow.run().await;

        if outcome.success {
            let tx_link = format!("{EXPLORER_TX_BASE}{}", ensure_0x(&outcome.detail));
            tracing::info!(wallet = %address, "BNB bridged | TX: {tx_link}");
        } else {
            tracing::error!(
                wallet = %address,
                "Failed to bridge BNB | Error: {}",
                outcome.detail
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::testing::MemorySink;
    use crate::types::DelayRange;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(wallets: usize, threads: usize) -> RunnerConfig {
        RunnerConfig {
            wallets: (0..wallets).map(|i| format!("key-{i}")).collect(),
            rpc_url: "http://localhost:8545".to_string(),
            api_key: "key".to_string(),
            threads,
            delay_before_start: DelayRange { min: 0, max: 0 },
            amount: None,
        }
    }

    fn outcome(address: String, success: bool) -> SwapOutcome {
        SwapOutcome {
            address,
            success,
            detail: if success { "0xbeef" } else { "synthetic failure" }.to_string(),
        }
    }

    #[test]
    fn test_ensure_0x() {
        assert_eq!(ensure_0x("abc"), "0xabc");
        assert_eq!(ensure_0x("0xabc"), "0xabc");
    }

    #[tokio::test]
    async fn test_one_record_per_wallet_with_failures_isolated() {
        let sink = Arc::new(MemorySink::default());
        let orchestrator = Orchestrator::new(config(8, 3), sink.clone());

        // every odd wallet fails; siblings must be unaffected
        orchestrator
            .execute(|key, _delay| async move {
                let index: usize = key.trim_start_matches("key-").parse().unwrap();
                outcome(key, index % 2 == 0)
            })
            .await;

        let records = sink.records.lock().await;
        assert_eq!(records.len(), 8);
        assert_eq!(records.iter().filter(|r| r.success).count(), 4);
        assert!(records.iter().all(|r| r.category == "rhino_bridge"));
    }

    #[tokio::test]
    async fn test_semaphore_bounds_concurrent_workflows() {
        let sink = Arc::new(MemorySink::default());
        let threads = 3;
        let orchestrator = Orchestrator::new(config(12, threads), sink.clone());

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let active_ref = active.clone();
        let peak_ref = peak.clone();
        orchestrator
            .execute(move |key, _delay| {
                let active = active_ref.clone();
                let peak = peak_ref.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    outcome(key, true)
                }
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) <= threads);
        assert_eq!(sink.records.lock().await.len(), 12);
    }

    #[tokio::test]
    async fn test_unparseable_key_yields_failure_record() {
        let sink = Arc::new(MemorySink::default());
        let mut cfg = config(1, 1);
        cfg.wallets = vec!["definitely-not-hex".to_string()];
        // unreachable endpoints are fine: the key fails to parse first
        cfg.rpc_url = "http://127.0.0.1:1".to_string();

        Orchestrator::new(cfg, sink.clone()).run().await;

        let records = sink.records.lock().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].address, "unknown");
        assert!(records[0].detail.contains("Invalid private key"));
    }
}
