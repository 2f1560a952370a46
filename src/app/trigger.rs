use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};

use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::app::push::ErrorResponse;
use crate::push::trigger::{TickOutcome, run_tick};
use crate::state::AppState;

/// Scheduled milestone tick, invoked by the external cron with a Bearer
/// shared secret. Everything that can go wrong past the auth check ends up
/// in the returned `TickOutcome` so the scheduler sees a 200 and keeps its
/// cadence.
pub(crate) async fn cron_tick(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TickOutcome>, (StatusCode, Json<ErrorResponse>)> {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if presented != Some(state.config.cron_secret.as_str()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "unauthorized",
            }),
        ));
    }

    let sender = WebPushSender::new(state.config.vapid.clone()).map_err(|err| {
        eprintln!("cron tick error: failed to init web-push ({err})");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to initialize push sender.",
            }),
        )
    })?;

    let outcome = run_tick(&TokioTimeProvider, &sender, &state.store, &state.config).await;
    Ok(Json(outcome))
}
