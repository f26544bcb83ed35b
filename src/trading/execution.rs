//! Order execution through the authenticated Polymarket CLOB client.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Credentials, Normal};
use polymarket_client_sdk::clob::types::response::PostOrderResponse;
use polymarket_client_sdk::clob::types::Side as ClobSide;
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::U256;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::order::{OrderParams, OrderReceipt, Side};
use crate::config::Config;
use crate::error::TradingError;
use crate::metrics;
use crate::signing;

/// Authenticated CLOB client.
type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Submits signed limit orders to the CLOB.
pub struct OrderSubmitter {
    /// Authenticated CLOB client.
    client: Arc<AuthenticatedClient>,
    /// Local signer for order signatures.
    signer: PrivateKeySigner,
    /// Upper bound on one build/sign/post round trip.
    timeout: Duration,
}

impl std::fmt::Debug for OrderSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSubmitter")
            .field("address", &self.signer.address())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OrderSubmitter {
    /// Authenticate with the CLOB using the configured wallet.
    #[instrument(skip(config), fields(chain_id = config.chain_id))]
    pub async fn connect(config: &Config) -> Result<Self, TradingError> {
        let signer = signing::create_chain_signer(&config.polymarket_private_key, config.chain_id)?;
        let signature_type = signing::signature_type_from_u8(config.polymarket_signature_type);

        info!(
            address = %signer.address(),
            signature_type = signing::signature_type_name(config.polymarket_signature_type),
            "Creating CLOB client"
        );

        let mut builder = Client::new(&config.polymarket_clob_url, ClobConfig::default())
            .map_err(|e| {
                TradingError::AuthenticationFailed(format!("Failed to create CLOB client: {}", e))
            })?
            .authentication_builder(&signer)
            .signature_type(signature_type);

        if let Some(funder) = config.polymarket_funder.as_deref().filter(|f| !f.is_empty()) {
            builder = builder.funder(signing::parse_funder(funder)?);
        }

        if let Some(credentials) = api_credentials(config)? {
            info!("Using configured API credentials");
            builder = builder.credentials(credentials);
        }

        let client = builder
            .authenticate()
            .await
            .map_err(|e| TradingError::AuthenticationFailed(e.to_string()))?;

        info!("CLOB client authenticated successfully");

        Ok(Self {
            client: Arc::new(client),
            signer,
            timeout: config.order_timeout(),
        })
    }

    /// Submit a limit order, bounded by the configured timeout.
    ///
    /// Size is truncated to the exchange lot precision before building.
    #[instrument(skip(self, params), fields(token = %params.token_id, side = %params.side))]
    pub async fn submit_limit_order(
        &self,
        params: &OrderParams,
    ) -> Result<OrderReceipt, TradingError> {
        params.validate().map_err(TradingError::InvalidParams)?;

        let _timer = metrics::timer_order_submit();
        let result = match tokio::time::timeout(self.timeout, self.post(params)).await {
            Ok(result) => result,
            Err(_) => Err(TradingError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(receipt) => info!(
                order_id = %receipt.order_id,
                token_id = %receipt.token_id,
                price = %receipt.price,
                size = %receipt.size,
                "Order submitted successfully"
            ),
            Err(e) => warn!(error = %e, "Order submission failed"),
        }

        result
    }

    async fn post(&self, params: &OrderParams) -> Result<OrderReceipt, TradingError> {
        let token_id =
            U256::from_str(&params.token_id).map_err(|e| TradingError::InvalidTokenId {
                token_id: params.token_id.clone(),
                reason: e.to_string(),
            })?;
        let size = params.lot_size();

        debug!(price = %params.price, size = %size, "Building limit order");

        let order = self
            .client
            .limit_order()
            .token_id(token_id)
            .side(clob_side(params.side))
            .price(params.price)
            .size(size)
            .build()
            .await
            .map_err(|e| TradingError::InvalidParams(e.to_string()))?;

        let signed = self
            .client
            .sign(&self.signer, order)
            .await
            .map_err(|e| TradingError::SigningError(e.to_string()))?;

        let response: PostOrderResponse = self
            .client
            .post_order(signed)
            .await
            .map_err(|e| TradingError::SubmissionFailed(e.to_string()))?;

        let order_id = response.order_id.to_string();
        if order_id.is_empty() {
            return Err(TradingError::OrderRejected {
                reason: "No order ID in response".to_string(),
            });
        }

        Ok(OrderReceipt {
            order_id,
            token_id: params.token_id.clone(),
            price: params.price,
            size,
        })
    }
}

/// Static L2 credentials, when the full key/secret/passphrase triple is set.
fn api_credentials(config: &Config) -> Result<Option<Credentials>, TradingError> {
    let (Some(key), Some(secret), Some(passphrase)) = (
        config.polymarket_api_key.as_deref(),
        config.polymarket_api_secret.as_deref(),
        config.polymarket_api_passphrase.as_deref(),
    ) else {
        return Ok(None);
    };

    let key = Uuid::parse_str(key).map_err(|e| {
        TradingError::AuthenticationFailed(format!("POLYMARKET_API_KEY is not a UUID: {}", e))
    })?;

    Ok(Some(Credentials::new(
        key,
        secret.to_string(),
        passphrase.to_string(),
    )))
}

/// Map our order side onto the SDK's.
fn clob_side(side: Side) -> ClobSide {
    match side {
        Side::Buy => ClobSide::Buy,
        Side::Sell => ClobSide::Sell,
    }
}
