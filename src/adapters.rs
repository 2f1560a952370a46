use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::ports;
use crate::types::push::{SendFailure, Subscription, VapidConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::time::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn send_message(
        &self,
        subscription: &Subscription,
        payload: &str,
    ) -> Result<(), web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload.as_bytes());
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

/// The push service's 410/404 equivalents mean the endpoint will never
/// accept another delivery; everything else may succeed on a later fan-out.
fn classify(err: web_push::WebPushError) -> SendFailure {
    match err {
        web_push::WebPushError::EndpointNotValid | web_push::WebPushError::EndpointNotFound => {
            SendFailure::Gone
        }
        other => SendFailure::Transient(other.to_string()),
    }
}

impl ports::push::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), SendFailure>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            self.send_message(subscription, payload)
                .await
                .map_err(classify)
        })
    }
}

#[derive(Debug)]
pub enum TimeFetchError {
    Request(reqwest::Error),
    InvalidTimestamp(i64),
}

impl std::fmt::Display for TimeFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFetchError::Request(err) => write!(f, "time fetch failed: {err}"),
            TimeFetchError::InvalidTimestamp(millis) => {
                write!(f, "time endpoint returned invalid timestamp {millis}")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServerTimeResponse {
    now: i64,
}

/// Fetches `{ "now": <unix ms> }` from the server's time endpoint.
#[derive(Clone)]
pub struct HttpTimeSource {
    url: String,
    client: reqwest::Client,
}

impl HttpTimeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl ports::time::TimeSource for HttpTimeSource {
    type Error = TimeFetchError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<OffsetDateTime, TimeFetchError>> + Send + 'a>>
    where
        Self: 'a;

    fn server_now(&self) -> Self::Fut<'_> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(TimeFetchError::Request)?;
            let body: ServerTimeResponse =
                response.json().await.map_err(TimeFetchError::Request)?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(body.now) * 1_000_000)
                .map_err(|_| TimeFetchError::InvalidTimestamp(body.now))
        })
    }
}
