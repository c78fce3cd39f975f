// src/swap/mod.rs
use crate::bridge::BridgeApiClient;
use crate::chain::{self, ChainClient};
use crate::error::{BridgeError, BridgeResult};
use crate::types::{RouteConfig, SwapOutcome};
use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};

const CHAIN_IN: &str = "OPBNB";
const CHAIN_OUT: &str = "BINANCE";
const TOKEN_IN: &str = "BNB";
const TOKEN_OUT: &str = "BNB";

/// Parse a committed-quote identifier into the uint256 contract argument.
/// Accepts an optional "0x" prefix, case-insensitive.
pub fn parse_commitment_id(quote_id: &str) -> BridgeResult<U256> {
    let hex_part = quote_id.trim().to_lowercase();
    let hex_part = hex_part.strip_prefix("0x").unwrap_or(&hex_part);
    if hex_part.is_empty() {
        // from_str_radix maps "" to 0; an empty id must never deposit
        // against commitment 0
        return Err(BridgeError::Commit(format!(
            "commitment id '{quote_id}' is empty"
        )));
    }
    U256::from_str_radix(hex_part, 16)
        .map_err(|e| BridgeError::Commit(format!("commitment id '{quote_id}' is not hex: {e}")))
}

/// Format an explicit amount for the quote payload: 18 decimal digits,
/// trailing zeros and a trailing point stripped. Must be strictly positive.
pub fn format_explicit_amount(amount: f64) -> BridgeResult<String> {
    if amount.is_nan() || amount <= 0.0 {
        return Err(BridgeError::Precondition(
            "amount must be > 0 (or unset for max balance)".to_string(),
        ));
    }
    let formatted = format!("{amount:.18}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    Ok(formatted.to_string())
}

/// Validate the source-chain leg of the route and extract the deposit target.
/// These are local precondition checks, distinct from transport failures.
fn resolve_route(config: &RouteConfig) -> BridgeResult<(Address, Option<u64>)> {
    let route = config.chain(CHAIN_IN).ok_or_else(|| {
        BridgeError::Precondition(format!(
            "chain '{CHAIN_IN}' not found in bridge configs; available: {}",
            config.available_chains()
        ))
    })?;

    let contract = route.contract_address.as_deref().ok_or_else(|| {
        BridgeError::Precondition(format!(
            "missing contractAddress for chain '{CHAIN_IN}' in bridge configs"
        ))
    })?;
    let bridge_address: Address = contract.parse().map_err(|e| {
        BridgeError::Precondition(format!("bad contractAddress '{contract}': {e}"))
    })?;

    if let Some(native) = route.native_token_name.as_deref() {
        if native != TOKEN_IN {
            return Err(BridgeError::Precondition(format!(
                "tokenIn '{TOKEN_IN}' != nativeTokenName '{native}' for chain '{CHAIN_IN}'; \
                 this workflow only does native deposits"
            )));
        }
    }

    Ok((bridge_address, route.chain_id))
}

/// One wallet's end-to-end bridge swap. Owns its own chain and API clients;
/// nothing is shared across wallets.
pub struct SwapWorkflow {
    chain: ChainClient,
    api: BridgeApiClient,
    amount: Option<f64>,
}

impl SwapWorkflow {
    pub fn new(
        rpc_url: &str,
        api_key: &str,
        private_key: &str,
        amount: Option<f64>,
    ) -> BridgeResult<Self> {
        let chain = ChainClient::new(rpc_url, private_key)?;
        Ok(Self::from_parts(chain, BridgeApiClient::new(api_key), amount))
    }

    pub fn from_parts(chain: ChainClient, api: BridgeApiClient, amount: Option<f64>) -> Self {
        Self { chain, api, amount }
    }

    pub fn address(&self) -> Address {
        self.chain.address()
    }

    /// Run the swap to completion. Every step error is converted into a
    /// failure outcome here; nothing propagates past this boundary. Consumes
    /// the workflow, so both clients are released on every exit path.
    pub async fn run(mut self) -> SwapOutcome {
        let address = self.chain.address().to_string();
        match self.execute().await {
            Ok(tx_hash) => SwapOutcome {
                address,
                success: true,
                detail: tx_hash,
            },
            Err(e) => SwapOutcome {
                address,
                success: false,
                detail: e.to_string(),
            },
        }
    }

    async fn execute(&mut self) -> BridgeResult<String> {
        let depositor = self.chain.address().to_string();

        // explicit amounts are validated before any network call
        let explicit_amount = match self.amount {
            Some(amount) => Some(format_explicit_amount(amount)?),
            None => None,
        };

        self.api.authenticate().await?;
        let config = self.api.route_config().await?;
        let (bridge_address, route_chain_id) = resolve_route(&config)?;

        let chain_id = match route_chain_id {
            Some(id) => id,
            None => self.chain.chain_id().await?,
        };

        let amount_str = match explicit_amount {
            Some(formatted) => formatted,
            None => {
                let max_send = self.chain.max_send().await?;
                if max_send.is_zero() {
                    return Err(BridgeError::Precondition(
                        "insufficient balance to cover gas".to_string(),
                    ));
                }
                let formatted = chain::wei_to_ether_string(max_send);
                tracing::info!(
                    wallet = %depositor,
                    "Using MAX available: {formatted} {TOKEN_IN}"
                );
                formatted
            }
        };

        let quote = self
            .api
            .request_quote(
                CHAIN_IN, CHAIN_OUT, &amount_str, TOKEN_IN, TOKEN_OUT, &depositor, &depositor,
            )
            .await?;
        tracing::info!(
            wallet = %depositor,
            "Quote: pay={} {TOKEN_IN} -> receive={} {TOKEN_OUT} | quoteId={}",
            quote.pay_amount.as_deref().unwrap_or("?"),
            quote.receive_amount.as_deref().unwrap_or("?"),
            quote.quote_id
        );

        let committed_id = self.api.commit_quote(&quote.quote_id).await?;
        let commitment = parse_commitment_id(&committed_id)?;

        let value_wei = parse_ether(&amount_str).map_err(|e| {
            BridgeError::Precondition(format!("amount '{amount_str}' is not a valid value: {e}"))
        })?;

        self.chain
            .send_deposit(bridge_address, chain_id, commitment, value_wei)
            .await
    }
}
