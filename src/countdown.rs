use serde::Serialize;
use std::time::Duration as StdDuration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ledger::NotifiedSet;
use crate::milestone;
use crate::ports::notify::Notifier;
use crate::ports::time::{TimeProvider, TimeSource};

const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Remaining time split for display, clamped to all zeros once the target
/// has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    pub fn is_expired(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

pub fn time_left(
    target: OffsetDateTime,
    now: OffsetDateTime,
    offset: time::Duration,
) -> TimeLeft {
    let remaining = milestone::remaining(target, now, offset);
    let total_seconds = remaining.whole_seconds();
    TimeLeft {
        days: total_seconds / 86_400,
        hours: (total_seconds % 86_400) / 3_600,
        minutes: (total_seconds % 3_600) / 60,
        seconds: total_seconds % 60,
    }
}

/// Offset between the trusted server clock and the local clock, assuming the
/// request spent half its round trip in each direction.
pub fn compute_offset(
    server_time: OffsetDateTime,
    request_start: OffsetDateTime,
    request_end: OffsetDateTime,
) -> time::Duration {
    let latency = (request_end - request_start) / 2;
    let local_at_server = request_end - latency;
    server_time - local_at_server
}

/// Single sync attempt against the trusted time source. Callers decide
/// whether a failure warrants a retry; an offset of zero is a reasonable
/// fallback.
pub async fn sync_offset<T, S>(time: &T, source: &S) -> Result<time::Duration, S::Error>
where
    T: TimeProvider,
    S: TimeSource,
{
    let request_start = time.now();
    let server_time = source.server_now().await?;
    let request_end = time.now();
    Ok(compute_offset(server_time, request_start, request_end))
}

/// Running countdown tied to one target. Dropping the owning context must
/// call `abort` so no periodic work leaks against a dead target.
pub struct CountdownHandle {
    pub target: OffsetDateTime,
    receiver: watch::Receiver<TimeLeft>,
    handle: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn time_left(&self) -> TimeLeft {
        *self.receiver.borrow()
    }

    pub fn is_expired(&self) -> bool {
        self.time_left().is_expired()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

/// Recompute the displayed remaining time every second until the target
/// passes. The offset comes from `sync_offset` once per session.
pub fn spawn_countdown<T>(time: T, target: OffsetDateTime, offset: time::Duration) -> CountdownHandle
where
    T: TimeProvider,
{
    let (sender, receiver) = watch::channel(time_left(target, time.now(), offset));
    let handle = tokio::spawn(async move {
        loop {
            let left = time_left(target, time.now(), offset);
            if sender.send(left).is_err() {
                break;
            }
            if left.is_expired() {
                break;
            }
            time.sleep(TICK_INTERVAL).await;
        }
    });
    CountdownHandle {
        target,
        receiver,
        handle,
    }
}

pub struct LocalNotifierHandle {
    handle: JoinHandle<()>,
}

impl LocalNotifierHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

/// Evaluate milestones against the local clock every second and fire the
/// notifier for each key at most once per device, persisting fired keys so a
/// restart does not repeat them. Stops once the release milestone has fired
/// (or had already fired before startup).
pub fn spawn_local_notifier<T, N>(
    time: T,
    notifier: N,
    mut notified: NotifiedSet,
    target: OffsetDateTime,
    offset: time::Duration,
    tolerance: time::Duration,
) -> LocalNotifierHandle
where
    T: TimeProvider,
    N: Notifier,
{
    let handle = tokio::spawn(async move {
        loop {
            let remaining = milestone::remaining(target, time.now(), offset);
            if let Some(milestone) = milestone::match_milestone(remaining, tolerance) {
                if notified.should_notify(milestone.key) {
                    if let Err(err) = notifier.notify(&milestone).await {
                        eprintln!("local notification error: {err} ({})", milestone.key);
                    }
                    if let Err(err) = notified.mark_notified(milestone.key) {
                        eprintln!("notified set persist error: {err}");
                    }
                }
                if milestone.is_terminal() {
                    break;
                }
            }
            time.sleep(TICK_INTERVAL).await;
        }
    });
    LocalNotifierHandle { handle }
}
