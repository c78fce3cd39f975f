// src/bridge/mod.rs
use crate::error::{BridgeError, BridgeResult};
use crate::types::{Quote, RouteConfig};
use serde_json::{json, Value};
use std::time::Duration;

const API_BASE: &str = "https://api.rhino.fi";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Candidate response fields for the bearer token, checked in order
const TOKEN_FIELDS: [&str; 4] = ["token", "jwt", "accessToken", "authorization"];

/// Stateful HTTP client for the bridge service. Owns one reqwest client,
/// a cached bearer token and a cached route configuration; one instance
/// per wallet workflow, never shared.
pub struct BridgeApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
    route_config: Option<RouteConfig>,
}

impl BridgeApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with static builder config");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            token: None,
            route_config: None,
        }
    }

    /// Authenticate with the API key; the token is cached for the client's
    /// lifetime and not refreshed on expiry.
    pub async fn authenticate(&mut self) -> BridgeResult<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        let body = json!({ "apiKey": self.api_key });
        let data = self
            .request("POST", "/authentication/auth/apiKey", Some(&body), None)
            .await?;

        let token = extract_token(&data).ok_or_else(|| {
            BridgeError::Auth(format!("no token field in auth response: {data}"))
        })?;

        self.token = Some(token.clone());
        Ok(token)
    }

    /// Fetch the bridge route configuration, cached after first success
    pub async fn route_config(&mut self) -> BridgeResult<RouteConfig> {
        if let Some(config) = &self.route_config {
            return Ok(config.clone());
        }

        let data = self.request("GET", "/bridge/configs", None, None).await?;
        let config = RouteConfig::from_value(&data);
        self.route_config = Some(config.clone());
        Ok(config)
    }

    /// Request a "pay"-mode quote for the given route and formatted amount
    #[allow(clippy::too_many_arguments)]
    pub async fn request_quote(
        &mut self,
        chain_in: &str,
        chain_out: &str,
        amount: &str,
        token_in: &str,
        token_out: &str,
        depositor: &str,
        recipient: &str,
    ) -> BridgeResult<Quote> {
        let token = self.authenticate().await?;

        let payload = json!({
            "chainIn": chain_in,
            "chainOut": chain_out,
            "amount": amount,
            "mode": "pay",
            "tokenIn": token_in,
            "tokenOut": token_out,
            "depositor": depositor,
            "recipient": recipient,
            "amountNative": "0",
            "isSda": "false",
        });

        let data = self
            .request(
                "POST",
                "/bridge/quote/bridge-swap/user",
                Some(&payload),
                Some(&token),
            )
            .await?;

        let quote_id = data
            .get("quoteId")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::Quote(format!("quote has no quoteId: {data}")))?
            .to_string();

        Ok(Quote {
            quote_id,
            pay_amount: field_as_string(&data, "payAmount"),
            receive_amount: field_as_string(&data, "receiveAmount"),
            raw: data,
        })
    }

    /// Commit a quote; returns the committed quote identifier
    pub async fn commit_quote(&mut self, quote_id: &str) -> BridgeResult<String> {
        let token = self.authenticate().await?;
        let path = format!("/bridge/quote/commit/{quote_id}");
        let data = self.request("POST", &path, None, Some(&token)).await?;

        data.get("quoteId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BridgeError::Commit(format!("commit returned no quoteId: {data}")))
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> BridgeResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = match method {
            "GET" => self.client.get(&url),
            _ => self.client.post(&url),
        };

        if let Some(token) = token {
            builder = builder.header("authorization", token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| BridgeError::Http {
            status: 0,
            path: path.to_string(),
            body: format!("{e}"),
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| BridgeError::Http {
            status,
            path: path.to_string(),
            body: format!("{e}"),
        })?;

        let data: Value = serde_json::from_str(&text).map_err(|_| BridgeError::Http {
            status,
            path: path.to_string(),
            body: format!("non-JSON response: {}", truncate(&text, 300)),
        })?;

        if status >= 400 {
            return Err(BridgeError::Http {
                status,
                path: path.to_string(),
                body: truncate(&data.to_string(), 800),
            });
        }

        Ok(data)
    }
}

/// First matching token field wins; None when no candidate is present
fn extract_token(data: &Value) -> Option<String> {
    TOKEN_FIELDS
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Stringify a field that may arrive as a JSON string or number
fn field_as_string(data: &Value, key: &str) -> Option<String> {
    match data.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
