// src/config.rs
use crate::error::{BridgeError, BridgeResult};
use crate::types::RunnerConfig;
use std::path::Path;

/// Load and validate a batch configuration from a TOML file
pub async fn load_config(path: impl AsRef<Path>) -> BridgeResult<RunnerConfig> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        BridgeError::ConfigurationLoadError(format!("{}: {}", path.display(), e))
    })?;

    let config: RunnerConfig = toml::from_str(&raw)
        .map_err(|e| BridgeError::ConfigurationLoadError(format!("{}: {}", path.display(), e)))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &RunnerConfig) -> BridgeResult<()> {
    if config.wallets.is_empty() {
        return Err(BridgeError::InvalidConfiguration(
            "wallets list is empty".to_string(),
        ));
    }
    if config.threads == 0 {
        return Err(BridgeError::InvalidConfiguration(
            "threads must be > 0".to_string(),
        ));
    }
    if config.delay_before_start.max < config.delay_before_start.min {
        return Err(BridgeError::InvalidConfiguration(format!(
            "delay_before_start max ({}) < min ({})",
            config.delay_before_start.max, config.delay_before_start.min
        )));
    }
    if config.rpc_url.is_empty() {
        return Err(BridgeError::InvalidConfiguration(
            "rpc_url is empty".to_string(),
        ));
    }
    if config.api_key.is_empty() {
        return Err(BridgeError::InvalidConfiguration(
            "api_key is empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_valid_config() {
        let file = write_config(
            r#"
wallets = ["0xabc"]
rpc_url = "https://opbnb-mainnet-rpc.bnbchain.org"
api_key = "key"
threads = 4

[delay_before_start]
min = 0
max = 30
"#,
        );
        let config = load_config(file.path()).await.unwrap();
        assert_eq!(config.wallets.len(), 1);
        assert_eq!(config.threads, 4);
        assert!(config.amount.is_none());
    }

    #[tokio::test]
    async fn test_rejects_zero_threads() {
        let file = write_config(
            r#"
wallets = ["0xabc"]
rpc_url = "http://localhost:8545"
api_key = "key"
threads = 0

[delay_before_start]
min = 0
max = 0
"#,
        );
        let err = load_config(file.path()).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_rejects_inverted_delay_range() {
        let file = write_config(
            r#"
wallets = ["0xabc"]
rpc_url = "http://localhost:8545"
api_key = "key"
threads = 1

[delay_before_start]
min = 10
max = 5
"#,
        );
        let err = load_config(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("delay_before_start"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_config("/nonexistent/config.toml").await.unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationLoadError(_)));
    }
}
