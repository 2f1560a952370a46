use serde::Serialize;
use time::Duration;

use crate::config::AppConfig;
use crate::ledger;
use crate::milestone;
use crate::ports::push::PushSender;
use crate::ports::store::Store;
use crate::ports::time::TimeProvider;
use crate::push;
use crate::types::push::{BroadcastSummary, PushPayload};

/// Result of one scheduled tick. Failures are captured here instead of
/// propagating, so the next tick always runs regardless of what this one hit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickOutcome {
    NoMilestoneDue { remaining_ms: i64 },
    Suppressed { milestone: String },
    Broadcast { milestone: String, summary: BroadcastSummary },
    Failed { error: String },
}

/// One trigger invocation: evaluate the clock, gate through the dedup
/// ledger, then fan out. The broadcast record is written before fan-out
/// begins so two concurrent ticks for the same milestone cannot both pass
/// the gate (best-effort guard, not a distributed lock).
pub async fn run_tick<T, S, D>(time: &T, sender: &S, store: &D, config: &AppConfig) -> TickOutcome
where
    T: TimeProvider,
    S: PushSender,
    D: Store,
{
    let now = time.now();
    let remaining = milestone::remaining(config.target, now, Duration::ZERO);
    let Some(milestone) = milestone::match_milestone(remaining, config.tolerance) else {
        return TickOutcome::NoMilestoneDue {
            remaining_ms: remaining.whole_milliseconds() as i64,
        };
    };

    // The release milestone is terminal: once recorded it never re-fires,
    // even after the suppression window lapses.
    let permitted = if milestone.is_terminal() {
        match store.last_broadcast(milestone.key) {
            Ok(last_sent) => last_sent.is_none(),
            Err(err) => {
                return TickOutcome::Failed {
                    error: err.to_string(),
                };
            }
        }
    } else {
        match ledger::should_broadcast(store, milestone.key, now, config.suppress_window) {
            Ok(permitted) => permitted,
            Err(err) => {
                return TickOutcome::Failed {
                    error: err.to_string(),
                };
            }
        }
    };
    if !permitted {
        return TickOutcome::Suppressed {
            milestone: milestone.key.to_string(),
        };
    }

    if let Err(err) = store.record_broadcast(milestone.key, now) {
        return TickOutcome::Failed {
            error: err.to_string(),
        };
    }

    let payload = PushPayload::for_milestone(&config.app_name, &milestone);
    let payload = match serde_json::to_string(&payload) {
        Ok(payload) => payload,
        Err(err) => {
            return TickOutcome::Failed {
                error: err.to_string(),
            };
        }
    };

    match push::broadcast(sender, store, &payload).await {
        Ok(summary) => TickOutcome::Broadcast {
            milestone: milestone.key.to_string(),
            summary,
        },
        Err(err) => TickOutcome::Failed {
            error: err.to_string(),
        },
    }
}
