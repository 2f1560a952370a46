use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub(crate) struct ServerTimeResponse {
    /// Unix milliseconds, matching what the offset-sync client expects.
    pub(crate) now: i64,
}

pub(crate) fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Trusted time endpoint; clients call it once per session to correct their
/// local clock before evaluating milestones.
pub(crate) async fn server_time() -> Json<ServerTimeResponse> {
    Json(ServerTimeResponse {
        now: unix_millis(OffsetDateTime::now_utc()),
    })
}
