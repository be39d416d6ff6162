//! `ClaimStore` over the platform HTTP API
//!
//! Thin typed wrapper around reqwest. Responses arrive in the platform's
//! `{code, message, data}` envelope; `E0000` is success, everything else
//! maps onto [`StoreError`] by status class so callers can tell a rejected
//! precondition from a transport failure.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use shared::loyalty::BillReceipt;
use shared::models::{PurchaseToken, RedemptionToken, TokenStatus};

use crate::store::{ClaimStore, StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    message: String,
    data: Option<T>,
}

#[derive(Clone, Debug)]
pub struct HttpClaimStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClaimStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn unwrap<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if envelope.code == "E0000" {
            return envelope
                .data
                .ok_or_else(|| StoreError::Transport("missing response data".into()));
        }
        match status {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(envelope.message)),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                Err(StoreError::Precondition(envelope.message))
            }
            _ => Err(StoreError::Transport(envelope.message)),
        }
    }
}

#[async_trait]
impl ClaimStore for HttpClaimStore {
    async fn find_finished_token(
        &self,
        purchase_token_id: i64,
    ) -> StoreResult<Option<RedemptionToken>> {
        let response = self
            .http
            .get(self.url("/api/redemption-tokens"))
            .query(&[("purchase_token_id", purchase_token_id)])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let tokens: Vec<RedemptionToken> = Self::unwrap(response).await?;
        Ok(tokens
            .into_iter()
            .find(|t| t.status == TokenStatus::Finished))
    }

    async fn create_token(&self, purchase: &PurchaseToken) -> StoreResult<RedemptionToken> {
        let response = self
            .http
            .post(self.url("/api/redemption-tokens"))
            .json(&json!({ "purchase_token_id": purchase.id }))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::unwrap(response).await
    }

    async fn delete_token_if_unscanned(&self, token_id: i64) -> StoreResult<bool> {
        #[derive(Deserialize)]
        struct DeleteResult {
            deleted: bool,
        }
        let response = self
            .http
            .delete(self.url(&format!("/api/redemption-tokens/{token_id}")))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let result: DeleteResult = Self::unwrap(response).await?;
        Ok(result.deleted)
    }

    async fn get_token(&self, token_id: i64) -> StoreResult<Option<RedemptionToken>> {
        let response = self
            .http
            .get(self.url(&format!("/api/redemption-tokens/{token_id}")))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        match Self::unwrap(response).await {
            Ok(token) => Ok(Some(token)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn dispute_bill(&self, token_id: i64) -> StoreResult<RedemptionToken> {
        let response = self
            .http
            .post(self.url(&format!("/api/redemption-tokens/{token_id}/dispute")))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::unwrap(response).await
    }

    async fn confirm_bill(&self, token_id: i64, user_id: i64) -> StoreResult<BillReceipt> {
        let response = self
            .http
            .post(self.url(&format!("/api/redemption-tokens/{token_id}/confirm-bill")))
            .json(&json!({ "user_id": user_id }))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::unwrap(response).await
    }

    async fn cancel_claim(&self, purchase_token_id: i64) -> StoreResult<PurchaseToken> {
        let response = self
            .http
            .post(self.url(&format!("/api/claims/{purchase_token_id}/cancel")))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::unwrap(response).await
    }
}
