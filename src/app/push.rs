use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::adapters::WebPushSender;
use crate::ports::store::Store;
use crate::push as push_service;
use crate::state::AppState;
use crate::types::push::{BroadcastSummary, PushPayload, Subscription};

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) status: &'static str,
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn public_key(State(state): State<AppState>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.config.vapid.public_key.clone(),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeRequest {
    pub(crate) endpoint: String,
    pub(crate) p256dh: String,
    pub(crate) auth: String,
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

pub(crate) async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.endpoint.trim().is_empty()
        || request.p256dh.trim().is_empty()
        || request.auth.trim().is_empty()
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "endpoint, p256dh, and auth are required.",
            }),
        ));
    }

    let subscription = Subscription {
        endpoint: request.endpoint,
        p256dh: request.p256dh,
        auth: request.auth,
        user_id: request.user_id,
    };
    if let Err(err) = state.store.upsert_subscription(&subscription) {
        eprintln!("subscribe error: {err}");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to save subscription.",
            }),
        ));
    }

    Ok(Json(StatusResponse {
        status: "subscribed",
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnsubscribeRequest {
    pub(crate) endpoint: String,
}

pub(crate) async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(err) = state.store.remove_subscription(&request.endpoint) {
        eprintln!("unsubscribe error: {err}");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to remove subscription.",
            }),
        ));
    }

    Ok(Json(StatusResponse {
        status: "unsubscribed",
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequest {
    pub(crate) message: String,
    /// Absent means broadcast-to-all.
    #[serde(default)]
    pub(crate) subscription: Option<SendTarget>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendTarget {
    pub(crate) endpoint: String,
    pub(crate) p256dh: String,
    pub(crate) auth: String,
}

pub(crate) async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<BroadcastSummary>, (StatusCode, Json<ErrorResponse>)> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message must not be empty.",
            }),
        ));
    }

    let sender = WebPushSender::new(state.config.vapid.clone()).map_err(|err| {
        eprintln!("push send error: failed to init web-push ({err})");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to initialize push sender.",
            }),
        )
    })?;

    let payload = PushPayload::new(&state.config.app_name, message);
    let payload = serde_json::to_string(&payload).map_err(|err| {
        eprintln!("push send error: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to encode payload.",
            }),
        )
    })?;

    let summary = match request.subscription {
        Some(target) => {
            let subscription = Subscription {
                endpoint: target.endpoint,
                p256dh: target.p256dh,
                auth: target.auth,
                user_id: None,
            };
            let outcome =
                push_service::send_to_one(&sender, &state.store, &subscription, &payload).await;
            BroadcastSummary::for_single(outcome)
        }
        None => push_service::broadcast(&sender, &state.store, &payload)
            .await
            .map_err(|err| {
                eprintln!("push broadcast error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Broadcast failed.",
                    }),
                )
            })?,
    };

    Ok(Json(summary))
}
