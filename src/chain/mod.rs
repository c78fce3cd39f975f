// src/chain/mod.rs
use crate::error::{BridgeError, BridgeResult};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Payable deposit entrypoint on the bridge contract
    function depositNativeWithId(uint256 commitmentId) external payable;
}

/// Gas limit used when estimation fails, and the unit count the fee buffer reserves
pub const FALLBACK_GAS_LIMIT: u64 = 300_000;

/// ceil(gas_price * 300_000 * 1.25), reserved for the deposit's own gas
pub fn fee_buffer(gas_price: u128) -> U256 {
    let units = U256::from(gas_price) * U256::from(FALLBACK_GAS_LIMIT);
    (units * U256::from(125) + U256::from(99)) / U256::from(100)
}

/// Maximum sendable wei after the fee buffer, clamped to 0
pub fn max_send_wei(balance: U256, gas_price: u128) -> U256 {
    balance.saturating_sub(fee_buffer(gas_price))
}

/// ceil(estimate * 1.20)
pub fn padded_gas_limit(estimate: u64) -> u64 {
    estimate.saturating_mul(120).div_ceil(100)
}

/// Convert a wei amount to a decimal-ether string with full precision,
/// trailing zeros stripped ("998125000000000000" -> "0.998125")
pub fn wei_to_ether_string(wei: U256) -> String {
    let unit = U256::from(10).pow(U256::from(18));
    let whole = wei / unit;
    let frac = wei % unit;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{frac:0>18}");
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}

/// Blockchain reads and writes for one wallet on one RPC endpoint
#[derive(Debug)]
pub struct ChainClient {
    provider: DynProvider,
    address: Address,
}

impl ChainClient {
    /// Resolve the account from a private key and connect the provider.
    /// Network I/O is deferred until the first read.
    pub fn new(rpc_url: &str, private_key: &str) -> BridgeResult<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| BridgeError::InvalidKey(format!("{e}")))?;
        let address = signer.address();

        let url = rpc_url
            .parse()
            .map_err(|e| BridgeError::ChainRpc(format!("invalid RPC URL '{rpc_url}': {e}")))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self { provider, address })
    }

    /// Checksummed depositor address
    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn native_balance(&self) -> BridgeResult<U256> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(|e| BridgeError::ChainRpc(format!("get_balance: {e}")))
    }

    pub async fn gas_price(&self) -> BridgeResult<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| BridgeError::ChainRpc(format!("gas_price: {e}")))
    }

    pub async fn nonce(&self) -> BridgeResult<u64> {
        self.provider
            .get_transaction_count(self.address)
            .await
            .map_err(|e| BridgeError::ChainRpc(format!("get_transaction_count: {e}")))
    }

    pub async fn chain_id(&self) -> BridgeResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| BridgeError::ChainRpc(format!("chain_id: {e}")))
    }

    /// Max sendable wei for this account under the fee-buffer policy
    pub async fn max_send(&self) -> BridgeResult<U256> {
        let balance = self.native_balance().await?;
        let gas_price = self.gas_price().await?;
        Ok(max_send_wei(balance, gas_price))
    }

    /// Build, sign and broadcast the native-value deposit call.
    /// Gas estimation failure falls back to FALLBACK_GAS_LIMIT; it alone
    /// never fails the swap.
    pub async fn send_deposit(
        &self,
        bridge_address: Address,
        chain_id: u64,
        commitment_id: U256,
        value_wei: U256,
    ) -> BridgeResult<String> {
        let input = Bytes::from(
            depositNativeWithIdCall {
                commitmentId: commitment_id,
            }
            .abi_encode(),
        );

        let gas_price = self.gas_price().await?;

        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(bridge_address)
            .with_value(value_wei)
            .with_input(input);

        let gas_limit = match self.provider.estimate_gas(tx.clone()).await {
            Ok(estimate) => padded_gas_limit(estimate),
            Err(e) => {
                tracing::warn!(
                    wallet = %self.address,
                    "Gas estimation failed ({e}), using fallback limit {FALLBACK_GAS_LIMIT}"
                );
                FALLBACK_GAS_LIMIT
            }
        };

        let nonce = self.nonce().await?;

        let tx = tx
            .with_nonce(nonce)
            .with_chain_id(chain_id)
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| BridgeError::Broadcast(format!("{e}")))?;

        Ok(format!("0x{}", hex::encode(pending.tx_hash())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_buffer_is_exact_multiple() {
        // 300_000 * 1.25 = 375_000 exactly, so no rounding occurs
        assert_eq!(fee_buffer(1), U256::from(375_000u64));
        assert_eq!(fee_buffer(2), U256::from(750_000u64));
    }

    #[test]
    fn test_fee_buffer_five_gwei() {
        // 5 gwei * 300_000 * 1.25 = 1_875_000_000_000_000 wei
        assert_eq!(
            fee_buffer(5_000_000_000),
            U256::from(1_875_000_000_000_000u64)
        );
    }

    #[test]
    fn test_max_send_one_ether_at_five_gwei() {
        let balance = U256::from(10).pow(U256::from(18));
        let max = max_send_wei(balance, 5_000_000_000);
        assert_eq!(max, U256::from(998_125_000_000_000_000u64));
        assert_eq!(wei_to_ether_string(max), "0.998125");
    }

    #[test]
    fn test_max_send_clamps_to_zero() {
        let balance = U256::from(1_000u64);
        assert_eq!(max_send_wei(balance, 5_000_000_000), U256::ZERO);
    }

    #[test]
    fn test_padded_gas_limit_rounds_up() {
        assert_eq!(padded_gas_limit(100), 120);
        assert_eq!(padded_gas_limit(21_000), 25_200);
        // 101 * 1.2 = 121.2 -> 122
        assert_eq!(padded_gas_limit(101), 122);
    }

    #[test]
    fn test_wei_to_ether_string() {
        let one = U256::from(10).pow(U256::from(18));
        assert_eq!(wei_to_ether_string(one), "1");
        assert_eq!(wei_to_ether_string(U256::ZERO), "0");
        assert_eq!(wei_to_ether_string(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(
            wei_to_ether_string(one + U256::from(500_000_000_000_000_000u64)),
            "1.5"
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = ChainClient::new("http://localhost:8545", "not-a-key").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidKey(_)));
    }

    #[test]
    fn test_account_resolution() {
        // well-known test vector: this key derives this address
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let client = ChainClient::new("http://localhost:8545", key).unwrap();
        assert_eq!(
            client.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }
}
