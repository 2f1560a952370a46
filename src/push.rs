use crate::ports::push::PushSender;
use crate::ports::store::{StorageError, Store};
use crate::types::push::{BroadcastSummary, DeliveryOutcome, SendFailure, Subscription};

pub mod trigger;
pub(crate) mod vapid;

/// Deliver one payload to one subscription and classify the outcome. A gone
/// endpoint is deleted from the store; transient failures are only logged,
/// the next fan-out retries them naturally since the subscription stays
/// stored.
pub async fn send_to_one<S, D>(
    sender: &S,
    store: &D,
    subscription: &Subscription,
    payload: &str,
) -> DeliveryOutcome
where
    S: PushSender,
    D: Store,
{
    match sender.send(subscription, payload).await {
        Ok(()) => DeliveryOutcome::Delivered,
        Err(SendFailure::Gone) => {
            if let Err(err) = store.remove_subscription(&subscription.endpoint) {
                eprintln!("push cleanup error: {err} ({})", subscription.endpoint);
            }
            DeliveryOutcome::Gone
        }
        Err(SendFailure::Transient(reason)) => {
            eprintln!("push delivery error: {reason} ({})", subscription.endpoint);
            DeliveryOutcome::TransientFailure
        }
    }
}

/// Fan a payload out to every stored subscription concurrently, wait for all
/// outcomes, and tally them. One subscriber's failure never blocks or
/// cancels delivery to the others.
pub async fn broadcast<S, D>(
    sender: &S,
    store: &D,
    payload: &str,
) -> Result<BroadcastSummary, StorageError>
where
    S: PushSender,
    D: Store,
{
    let subscriptions = store.list_subscriptions()?;
    let mut summary = BroadcastSummary {
        attempted: subscriptions.len(),
        ..BroadcastSummary::default()
    };
    if subscriptions.is_empty() {
        return Ok(summary);
    }

    let mut deliveries = tokio::task::JoinSet::new();
    for subscription in subscriptions {
        let sender = sender.clone();
        let store = store.clone();
        let payload = payload.to_string();
        deliveries
            .spawn(async move { send_to_one(&sender, &store, &subscription, &payload).await });
    }

    while let Some(joined) = deliveries.join_next().await {
        match joined {
            Ok(DeliveryOutcome::Delivered) => summary.delivered += 1,
            Ok(DeliveryOutcome::Gone) => summary.gone += 1,
            Ok(DeliveryOutcome::TransientFailure) => summary.failed += 1,
            Err(err) => {
                eprintln!("push delivery task error: {err}");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}
