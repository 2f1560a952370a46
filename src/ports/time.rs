use std::time::Duration;

use time::OffsetDateTime;

pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}

/// Trusted time source used once per client session to compute the clock
/// offset. Not retried internally; the caller decides whether to try again.
pub trait TimeSource: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<OffsetDateTime, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn server_now(&self) -> Self::Fut<'_>;
}
