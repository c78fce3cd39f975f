// src/results.rs
use crate::error::{BridgeError, BridgeResult};
use crate::types::SwapRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Destination for per-wallet outcomes. Appends must be atomic with respect
/// to each other; every wallet writes exactly one record per run.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, record: SwapRecord) -> BridgeResult<()>;
}

/// JSON-lines file sink, one line per record. A mutex serializes appends so
/// concurrent wallets never interleave partial lines.
pub struct JsonlResultSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ResultSink for JsonlResultSink {
    async fn append(&self, record: SwapRecord) -> BridgeResult<()> {
        let mut line = serde_json::to_string(&record)
            .map_err(|e| BridgeError::SerializationError(e.to_string()))?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// In-memory sink for orchestration tests
    #[derive(Default)]
    pub struct MemorySink {
        pub records: Mutex<Vec<SwapRecord>>,
    }

    #[async_trait]
    impl ResultSink for MemorySink {
        async fn append(&self, record: SwapRecord) -> BridgeResult<()> {
            self.records.lock().await.push(record);
            Ok(())
        }
    }
}
