//! Notification Dispatch
//!
//! Everything here is downstream of a committed state mutation and is
//! try-once: a failed push, email or in-app insert is logged at `warn` and
//! never propagated back to the transition that triggered it.

use crate::db::repository::notification;
use serde::Serialize;
use serde_json::{Value, json};
use shared::models::{AppNotificationCreate, User};
use sqlx::SqlitePool;

/// Push message payload (Expo wire shape)
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none", rename = "channelId")]
    pub channel_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NotifierService {
    http: reqwest::Client,
    pool: SqlitePool,
    push_endpoint: String,
    email_endpoint: Option<String>,
}

impl NotifierService {
    pub fn new(pool: SqlitePool, push_endpoint: String, email_endpoint: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            pool,
            push_endpoint,
            email_endpoint,
        }
    }

    /// Points credited after a confirmed bill
    pub fn spawn_points_earned(&self, user: &User, points: i64, offer_name: &str) {
        let body = format!("You earned {points} points for redeeming {offer_name}!");
        let data = json!({ "type": "loyalty_points_earned", "points_earned": points });
        self.spawn_push(user, "Points earned".into(), body, data);
    }

    /// Tier changed after a recompute
    pub fn spawn_tier_upgrade(&self, user: &User, new_tier: &str) {
        let body = format!("Congratulations — you've reached the {new_tier} tier!");
        let data = json!({ "type": "loyalty_upgrade", "new_tier": new_tier });
        self.spawn_push(user, "Tier upgrade".into(), body, data);
    }

    /// Business-initiated cancellation: in-app row + push + email, with an
    /// optional human-readable reason
    pub fn spawn_claim_cancelled(
        &self,
        user: &User,
        offer_name: &str,
        business_name: &str,
        offer_id: Option<i64>,
        business_id: Option<i64>,
        purchase_token_id: i64,
        reason: Option<String>,
    ) {
        let title = "Booking Cancelled".to_string();
        let body = match &reason {
            Some(r) => format!(
                "{business_name} has cancelled your booking for the promotion '{offer_name}'. Reason: {r}"
            ),
            None => format!(
                "{business_name} has cancelled your booking for the promotion '{offer_name}'."
            ),
        };
        let data = json!({
            "type": "claim_cancelled",
            "offerId": offer_id,
            "businessId": business_id,
            "purchaseTokenId": purchase_token_id,
        });

        // In-app row first: it is the one channel the consumer is guaranteed
        // to see on next open even if push and email both fail.
        let pool = self.pool.clone();
        let row = AppNotificationCreate {
            user_id: user.id,
            name: title.clone(),
            content: body.clone(),
            category: "offer".into(),
            offer_id,
            business_id,
        };
        tokio::spawn(async move {
            if let Err(e) = notification::create(&pool, row).await {
                tracing::warn!(error = %e, "Failed to insert in-app cancellation notification");
            }
        });

        self.spawn_push(user, title, body, data);
        self.spawn_email(
            user,
            "cancellation_by_business",
            json!({
                "offer_name": offer_name,
                "business_name": business_name,
                "cancellation_reason": reason,
            }),
        );
    }

    fn spawn_push(&self, user: &User, title: String, body: String, data: Value) {
        if !user.activate_notifications {
            tracing::debug!(user_id = user.id, "Push skipped: notifications disabled");
            return;
        }
        let Some(token) = user.expo_push_token.clone() else {
            tracing::debug!(user_id = user.id, "Push skipped: no push token");
            return;
        };
        let message = PushMessage {
            to: token,
            sound: "default".into(),
            title,
            body,
            data,
            channel_id: Some("offers".into()),
        };
        let http = self.http.clone();
        let endpoint = self.push_endpoint.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            match http.post(&endpoint).json(&vec![message]).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(user_id, "Push notification dispatched");
                }
                Ok(resp) => {
                    tracing::warn!(user_id, status = %resp.status(), "Push gateway rejected message");
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Push dispatch failed");
                }
            }
        });
    }

    fn spawn_email(&self, user: &User, kind: &'static str, extra: Value) {
        let Some(endpoint) = self.email_endpoint.clone() else {
            tracing::debug!("Email skipped: no email endpoint configured");
            return;
        };
        let http = self.http.clone();
        let payload = json!({
            "type": kind,
            "user_id": user.id.to_string(),
            "user_email": user.email,
            "user_first_name": user.first_name,
            "fields": extra,
        });
        let user_id = user.id;
        tokio::spawn(async move {
            match http.post(&endpoint).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(user_id, kind, "Email dispatched");
                }
                Ok(resp) => {
                    tracing::warn!(user_id, kind, status = %resp.status(), "Email endpoint rejected message");
                }
                Err(e) => {
                    tracing::warn!(user_id, kind, error = %e, "Email dispatch failed");
                }
            }
        });
    }
}
