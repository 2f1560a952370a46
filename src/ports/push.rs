use crate::types::push::{SendFailure, Subscription};

/// Push transport seam. Implementations classify permanent endpoint
/// invalidity as `SendFailure::Gone`; everything else is transient.
pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<(), SendFailure>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a>;
}
