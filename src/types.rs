// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Inclusive range for the randomized per-wallet start delay, in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    /// Draw a uniform delay from [min, max]; 0 when max is 0
    pub fn sample(&self) -> u64 {
        if self.max == 0 {
            return 0;
        }
        use rand::Rng;
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Runtime configuration for one bridging batch
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Wallet private keys, one workflow per entry
    pub wallets: Vec<String>,
    /// opBNB JSON-RPC endpoint
    pub rpc_url: String,
    /// rhino.fi API key
    pub api_key: String,
    /// Global concurrency limit
    pub threads: usize,
    pub delay_before_start: DelayRange,
    /// Fixed deposit amount in whole tokens; None bridges the max available
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Per-chain leg of the bridge route, as served by /bridge/configs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainRoute {
    #[serde(deserialize_with = "lenient_u64")]
    pub chain_id: Option<u64>,
    pub contract_address: Option<String>,
    pub native_token_name: Option<String>,
}

// Some deployments serve chainId as a number, others as a decimal string
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// Bridge route configuration keyed by chain identifier, cached per client
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    chains: HashMap<String, ChainRoute>,
}

impl RouteConfig {
    /// Build from the raw /bridge/configs payload, skipping non-route entries
    pub fn from_value(value: &Value) -> Self {
        let mut chains = HashMap::new();
        if let Some(map) = value.as_object() {
            for (name, entry) in map {
                if entry.is_object() {
                    if let Ok(route) = serde_json::from_value(entry.clone()) {
                        chains.insert(name.clone(), route);
                    }
                }
            }
        }
        Self { chains }
    }

    pub fn chain(&self, name: &str) -> Option<&ChainRoute> {
        self.chains.get(name)
    }

    /// Sorted chain keys, for precondition error messages
    pub fn available_chains(&self) -> String {
        let mut names: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

/// Priced bridge offer returned by the quote endpoint
#[derive(Debug, Clone)]
pub struct Quote {
    pub quote_id: String,
    pub pay_amount: Option<String>,
    pub receive_amount: Option<String>,
    /// Full response body, kept for diagnostics only
    pub raw: Value,
}

/// Terminal result of one wallet's swap workflow
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub address: String,
    pub success: bool,
    /// Transaction hash on success, error description on failure
    pub detail: String,
}

/// Persisted form of a SwapOutcome
#[derive(Debug, Clone, Serialize)]
pub struct SwapRecord {
    pub address: String,
    pub success: bool,
    pub detail: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl SwapRecord {
    pub fn new(outcome: &SwapOutcome, category: &str) -> Self {
        Self {
            address: outcome.address.clone(),
            success: outcome.success,
            detail: outcome.detail.clone(),
            category: category.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_config_parses_mixed_entries() {
        let body = json!({
            "OPBNB": {
                "chainId": 204,
                "contractAddress": "0x2b33cf282f867a7ff693a66e11b0fcc5552e4425",
                "nativeTokenName": "BNB"
            },
            "ETHEREUM": { "chainId": "1", "nativeTokenName": "ETH" },
            "comment": "not a route"
        });

        let config = RouteConfig::from_value(&body);
        let opbnb = config.chain("OPBNB").unwrap();
        assert_eq!(opbnb.chain_id, Some(204));
        assert_eq!(opbnb.native_token_name.as_deref(), Some("BNB"));

        // string chainId is tolerated
        assert_eq!(config.chain("ETHEREUM").unwrap().chain_id, Some(1));
        assert!(config.chain("comment").is_none());
    }

    #[test]
    fn test_available_chains_sorted() {
        let body = json!({
            "OPBNB": {},
            "BINANCE": {},
            "ARBITRUM": {}
        });
        let config = RouteConfig::from_value(&body);
        assert_eq!(config.available_chains(), "ARBITRUM, BINANCE, OPBNB");
    }

    #[test]
    fn test_delay_range_zero_max() {
        let range = DelayRange { min: 5, max: 0 };
        assert_eq!(range.sample(), 0);
    }

    #[test]
    fn test_delay_range_within_bounds() {
        let range = DelayRange { min: 2, max: 7 };
        for _ in 0..50 {
            let d = range.sample();
            assert!((2..=7).contains(&d));
        }
    }
}
