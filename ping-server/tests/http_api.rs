//! HTTP API surface: the real router served on an ephemeral port, driven
//! through `ping_client::HttpClaimStore` — the production transport, so the
//! envelope codes and error mapping get exercised for real.

use std::net::SocketAddr;

use ping_client::store::ClaimStore;
use ping_client::{HttpClaimStore, StoreError};
use ping_server::db::repository::{offer, purchase_token, redemption_token, user};
use ping_server::{Config, ServerState};
use shared::models::{PurchaseToken, PurchaseTokenCreate, TokenStatus};

struct Api {
    _dir: tempfile::TempDir,
    addr: SocketAddr,
    state: ServerState,
}

async fn serve() -> Api {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api.db");
    let config = Config::for_tests(path.to_str().unwrap());
    let state = ServerState::initialize(&config).await.unwrap();

    let app = ping_server::api::router().with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Api {
        _dir: dir,
        addr,
        state,
    }
}

async fn seed_purchase(api: &Api, customer_price: Option<f64>) -> (PurchaseToken, i64) {
    let pool = api.state.pool();
    let u = user::create(pool, "diner@example.com", Some("Dana"), 0).await.unwrap();
    let o = offer::create(pool, "Lunch deal", None, 1, false, None, true)
        .await
        .unwrap();
    let purchase = purchase_token::create(
        pool,
        PurchaseTokenCreate {
            offer_id: Some(o.id),
            offer_name: Some(o.name.clone()),
            business_id: None,
            user_id: u.id,
            user_email: Some(u.email.clone()),
            purchase_type: None,
            customer_price,
            offer_slot: None,
            quantity: None,
            booking_confirmed: false,
            booking_date: None,
            booking_reminder_id: None,
        },
    )
    .await
    .unwrap();
    (purchase, u.id)
}

#[tokio::test]
async fn full_flow_over_http() {
    let api = serve().await;
    let (purchase, user_id) = seed_purchase(&api, None).await;
    let store = HttpClaimStore::new(format!("http://{}", api.addr));

    // Nothing finished yet
    assert!(store.find_finished_token(purchase.id).await.unwrap().is_none());

    // Open the QR attempt over HTTP
    let token = store.create_token(&purchase).await.unwrap();
    assert_eq!(token.status, TokenStatus::Pending);
    assert!(!token.scanned);

    // Confirming before any bill exists is a distinguishable rejection
    let err = store.confirm_bill(token.id, user_id).await.unwrap_err();
    assert!(matches!(err, StoreError::Precondition(_)));

    // Staff act through the gateway services; customer confirms over HTTP
    api.state.redemption.scan(purchase.id, None).await.unwrap();
    api.state.redemption.complete(token.id, Some(18.5)).await.unwrap();

    let fetched = store.get_token(token.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, TokenStatus::Submitted);
    assert_eq!(fetched.bill_input_total, Some(18.5));

    let receipt = store.confirm_bill(token.id, user_id).await.unwrap();
    assert_eq!(receipt.points_earned, 185);

    let finished = store.find_finished_token(purchase.id).await.unwrap().unwrap();
    assert_eq!(finished.id, token.id);
}

#[tokio::test]
async fn teardown_delete_over_http_respects_scan_guard() {
    let api = serve().await;
    let (purchase, _) = seed_purchase(&api, None).await;
    let store = HttpClaimStore::new(format!("http://{}", api.addr));

    let token = store.create_token(&purchase).await.unwrap();
    assert!(store.delete_token_if_unscanned(token.id).await.unwrap());

    // Recreate, scan, and the guarded delete must refuse
    let token = store.create_token(&purchase).await.unwrap();
    api.state.redemption.scan(purchase.id, None).await.unwrap();
    assert!(!store.delete_token_if_unscanned(token.id).await.unwrap());
    assert!(
        redemption_token::find_by_id(api.state.pool(), token.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn missing_rows_map_to_not_found() {
    let api = serve().await;
    let store = HttpClaimStore::new(format!("http://{}", api.addr));

    assert!(store.get_token(123456789).await.unwrap().is_none());

    let err = store.dispute_bill(123456789).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn ineligible_cancellation_is_a_precondition_error() {
    let api = serve().await;
    // No booking on this claim, so the consumer path must refuse
    let (purchase, _) = seed_purchase(&api, None).await;
    let store = HttpClaimStore::new(format!("http://{}", api.addr));

    let err = store.cancel_claim(purchase.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Precondition(_)));
}
