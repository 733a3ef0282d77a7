//! Value-transfer collaborator.
//!
//! A matched mint address triggers an attempt to swap a fixed USD amount
//! of SOL into that mint through the Jupiter aggregator: price lookup to
//! size the input, quote, swap transaction, local signing, submission to
//! an RPC endpoint. Every step is fire-and-forget from the pipeline's
//! point of view — a failed swap is logged and never rolls anything back.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signer, SigningKey};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Performs a value transfer against an extracted identifier.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Attempt to acquire `usd_amount` worth of `identifier`.
    async fn execute(&self, identifier: &str, usd_amount: f64) -> Result<()>;
}

/// Wrapped SOL, the input side of every swap.
const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Endpoints and swap parameters for [`JupiterActuator`].
#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub quote_api: String,
    pub price_api: String,
    pub rpc_endpoint: String,
    pub slippage_bps: u32,
    pub timeout: Duration,
}

/// Swap executor backed by the Jupiter aggregator and a Solana RPC node.
pub struct JupiterActuator {
    client: reqwest::Client,
    config: SwapConfig,
    signing_key: SigningKey,
    wallet_address: String,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: HashMap<String, PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

impl JupiterActuator {
    /// Build an actuator from a wallet keypair in the Solana CLI format:
    /// a JSON array of 64 bytes (32-byte secret followed by the public key).
    pub fn new(config: SwapConfig, wallet_key_json: &str) -> Result<Self> {
        let signing_key = parse_wallet_key(wallet_key_json)?;
        let wallet_address = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build swap HTTP client")?;

        Ok(Self {
            client,
            config,
            signing_key,
            wallet_address,
        })
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// Current SOL/USD price, used to size the input amount.
    async fn sol_price_usd(&self) -> Result<f64> {
        let url = format!("{}/price", self.config.price_api);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", "SOL")])
            .send()
            .await
            .context("price API unreachable")?;

        if !response.status().is_success() {
            bail!("price lookup failed: HTTP {}", response.status());
        }

        let prices: PriceResponse = response
            .json()
            .await
            .context("failed to parse price response")?;
        let entry = prices
            .data
            .get("SOL")
            .ok_or_else(|| anyhow!("price response has no SOL entry"))?;
        Ok(entry.price)
    }

    async fn quote(&self, output_mint: &str, lamports: u64) -> Result<Value> {
        let url = format!("{}/quote", self.config.quote_api);
        let amount = lamports.to_string();
        let slippage = self.config.slippage_bps.to_string();

        debug!("Requesting quote for {} lamports into {}", amount, output_mint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("inputMint", NATIVE_MINT),
                ("outputMint", output_mint),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
            ])
            .send()
            .await
            .context("quote API unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("no route for swap: HTTP {}: {}", status, body);
        }

        response.json().await.context("failed to parse quote response")
    }

    /// Exchange a quote for a serialized (unsigned) swap transaction.
    async fn swap_transaction(&self, quote: &Value) -> Result<String> {
        let url = format!("{}/swap", self.config.quote_api);
        let request = json!({
            "quoteResponse": quote,
            "userPublicKey": self.wallet_address,
            "wrapAndUnwrapSol": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("swap API unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("swap build failed: HTTP {}: {}", status, body);
        }

        let swap: SwapResponse = response
            .json()
            .await
            .context("failed to parse swap response")?;
        Ok(swap.swap_transaction)
    }

    /// Sign the fee-payer slot of a serialized transaction.
    ///
    /// Wire layout: a shortvec count of signature slots, the 64-byte
    /// slots themselves, then the message bytes the signatures cover.
    /// Our wallet is the fee payer, so slot 0 is ours.
    fn sign_transaction(&self, transaction_base64: &str) -> Result<String> {
        let raw = BASE64
            .decode(transaction_base64)
            .context("swap transaction is not valid base64")?;

        let (signature_count, prefix_len) = decode_shortvec_len(&raw)?;
        if signature_count == 0 {
            bail!("swap transaction has no signature slot");
        }
        let message_offset = prefix_len + signature_count * 64;
        if raw.len() <= message_offset {
            bail!("swap transaction is truncated");
        }

        let signature = self.signing_key.sign(&raw[message_offset..]);
        let mut signed = raw;
        signed[prefix_len..prefix_len + 64].copy_from_slice(&signature.to_bytes());
        Ok(BASE64.encode(signed))
    }

    /// Submit the signed transaction and return its signature.
    async fn submit(&self, signed_base64: &str) -> Result<String> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendTransaction",
            "params": [signed_base64, {"encoding": "base64", "maxRetries": 2}],
        });

        let response = self
            .client
            .post(&self.config.rpc_endpoint)
            .json(&request)
            .send()
            .await
            .context("RPC endpoint unreachable")?;

        let body: Value = response
            .json()
            .await
            .context("failed to parse RPC response")?;
        if let Some(error) = body.get("error") {
            bail!("transaction rejected: {}", error);
        }
        body["result"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("RPC response has no transaction signature"))
    }
}

#[async_trait]
impl Actuator for JupiterActuator {
    async fn execute(&self, identifier: &str, usd_amount: f64) -> Result<()> {
        info!("Preparing to swap ${:.2} into mint {}", usd_amount, identifier);

        let sol_price = self.sol_price_usd().await?;
        let lamports = usd_to_lamports(usd_amount, sol_price)?;
        let quote = self.quote(identifier, lamports).await?;
        let transaction = self.swap_transaction(&quote).await?;
        let signed = self.sign_transaction(&transaction)?;
        let signature = self.submit(&signed).await?;

        info!("Swap transaction submitted: {}", signature);
        Ok(())
    }
}

fn parse_wallet_key(wallet_key_json: &str) -> Result<SigningKey> {
    let bytes: Vec<u8> =
        serde_json::from_str(wallet_key_json).context("wallet key is not a JSON byte array")?;
    if bytes.len() != 64 {
        bail!("wallet key must be 64 bytes, got {}", bytes.len());
    }
    let secret: [u8; 32] = bytes[..32].try_into().expect("length checked above");
    Ok(SigningKey::from_bytes(&secret))
}

fn usd_to_lamports(usd: f64, sol_price_usd: f64) -> Result<u64> {
    if !(sol_price_usd > 0.0) {
        bail!("SOL price must be positive, got {}", sol_price_usd);
    }
    Ok(((usd / sol_price_usd) * LAMPORTS_PER_SOL) as u64)
}

/// Decode a Solana shortvec length prefix: little-endian base-128 with a
/// continuation bit, at most three bytes.
fn decode_shortvec_len(data: &[u8]) -> Result<(usize, usize)> {
    let mut value = 0usize;
    let mut consumed = 0usize;
    loop {
        let byte = *data
            .get(consumed)
            .ok_or_else(|| anyhow!("truncated length prefix"))?;
        value |= ((byte & 0x7f) as usize) << (7 * consumed);
        consumed += 1;
        if byte & 0x80 == 0 {
            return Ok((value, consumed));
        }
        if consumed == 3 {
            bail!("length prefix too long");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    fn test_actuator() -> JupiterActuator {
        let key: Vec<u8> = (0u8..64).collect();
        let config = SwapConfig {
            quote_api: "http://localhost:1".to_string(),
            price_api: "http://localhost:1".to_string(),
            rpc_endpoint: "http://localhost:1".to_string(),
            slippage_bps: 1500,
            timeout: Duration::from_secs(5),
        };
        JupiterActuator::new(config, &serde_json::to_string(&key).unwrap()).unwrap()
    }

    #[test]
    fn test_usd_to_lamports() {
        assert_eq!(usd_to_lamports(20.0, 100.0).unwrap(), 200_000_000);
        assert_eq!(usd_to_lamports(150.0, 150.0).unwrap(), 1_000_000_000);
        assert!(usd_to_lamports(20.0, 0.0).is_err());
        assert!(usd_to_lamports(20.0, -5.0).is_err());
    }

    #[test]
    fn test_decode_shortvec_len() {
        assert_eq!(decode_shortvec_len(&[1]).unwrap(), (1, 1));
        assert_eq!(decode_shortvec_len(&[0x7f]).unwrap(), (127, 1));
        assert_eq!(decode_shortvec_len(&[0x80, 0x01]).unwrap(), (128, 2));
        assert!(decode_shortvec_len(&[]).is_err());
        assert!(decode_shortvec_len(&[0x80, 0x80, 0x80]).is_err());
    }

    #[test]
    fn test_wallet_key_must_be_64_bytes() {
        assert!(parse_wallet_key("[1, 2, 3]").is_err());
        assert!(parse_wallet_key("not json").is_err());

        let key: Vec<u8> = vec![7; 64];
        assert!(parse_wallet_key(&serde_json::to_string(&key).unwrap()).is_ok());
    }

    #[test]
    fn test_wallet_address_is_base58_of_public_key() {
        let actuator = test_actuator();
        let decoded = bs58::decode(actuator.wallet_address()).into_vec().unwrap();
        assert_eq!(decoded.len(), 32);
        assert_eq!(
            decoded,
            actuator.signing_key.verifying_key().to_bytes().to_vec()
        );
    }

    #[test]
    fn test_sign_transaction_fills_fee_payer_slot() {
        let actuator = test_actuator();
        let message = b"swap message bytes".to_vec();

        // One empty signature slot followed by the message.
        let mut unsigned = vec![1u8];
        unsigned.extend_from_slice(&[0u8; 64]);
        unsigned.extend_from_slice(&message);

        let signed = actuator.sign_transaction(&BASE64.encode(&unsigned)).unwrap();
        let signed = BASE64.decode(signed).unwrap();

        assert_eq!(signed.len(), unsigned.len());
        assert_eq!(&signed[65..], message.as_slice());

        let signature_bytes: [u8; 64] = signed[1..65].try_into().unwrap();
        let signature = Signature::from_bytes(&signature_bytes);
        actuator
            .signing_key
            .verifying_key()
            .verify(&message, &signature)
            .expect("fee payer slot holds a valid signature over the message");
    }

    #[test]
    fn test_sign_rejects_garbage() {
        let actuator = test_actuator();
        assert!(actuator.sign_transaction("!!not base64!!").is_err());
        // Slot count says one signature but there is no message after it.
        let truncated = BASE64.encode([1u8; 65]);
        assert!(actuator.sign_transaction(&truncated).is_err());
    }
}
