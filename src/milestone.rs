use time::{Duration, OffsetDateTime};

const MS_MINUTE: i64 = 60_000;
const MS_HOUR: i64 = 3_600_000;
const MS_DAY: i64 = 86_400_000;
const MS_WEEK: i64 = 7 * MS_DAY;
const MS_MONTH: i64 = 30 * MS_DAY;

/// A discrete point in the countdown eligible for one notification firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub key: &'static str,
    pub remaining_ms: i64,
    pub label: &'static str,
}

impl Milestone {
    /// The release milestone ends the countdown; nothing fires after it.
    pub fn is_terminal(&self) -> bool {
        self.key == RELEASE_MILESTONE.key
    }
}

/// Matched whenever the remaining time is zero or negative, independent of
/// the table scan below.
pub const RELEASE_MILESTONE: Milestone = Milestone {
    key: "now",
    remaining_ms: 0,
    label: "The wait is over!",
};

/// Threshold table, ascending by remaining time. The 24-hour and 1-day marks
/// coincide at 86,400,000 ms, so only `d1` is kept. Consecutive entries must
/// stay more than twice the matching tolerance apart or a single remaining
/// value could match two of them.
pub const MILESTONES: &[Milestone] = &[
    Milestone { key: "min1", remaining_ms: MS_MINUTE, label: "Only 1 minute to go!" },
    Milestone { key: "min5", remaining_ms: 5 * MS_MINUTE, label: "Only 5 minutes to go!" },
    Milestone { key: "min15", remaining_ms: 15 * MS_MINUTE, label: "Only 15 minutes to go!" },
    Milestone { key: "min30", remaining_ms: 30 * MS_MINUTE, label: "Only 30 minutes to go!" },
    Milestone { key: "h1", remaining_ms: MS_HOUR, label: "1 hour to go!" },
    Milestone { key: "h3", remaining_ms: 3 * MS_HOUR, label: "3 hours to go!" },
    Milestone { key: "h6", remaining_ms: 6 * MS_HOUR, label: "6 hours to go!" },
    Milestone { key: "h12", remaining_ms: 12 * MS_HOUR, label: "12 hours to go!" },
    Milestone { key: "d1", remaining_ms: MS_DAY, label: "1 day to go!" },
    Milestone { key: "d2", remaining_ms: 2 * MS_DAY, label: "2 days to go!" },
    Milestone { key: "d3", remaining_ms: 3 * MS_DAY, label: "3 days to go!" },
    Milestone { key: "d4", remaining_ms: 4 * MS_DAY, label: "4 days to go!" },
    Milestone { key: "d5", remaining_ms: 5 * MS_DAY, label: "5 days to go!" },
    Milestone { key: "d6", remaining_ms: 6 * MS_DAY, label: "6 days to go!" },
    Milestone { key: "d7", remaining_ms: 7 * MS_DAY, label: "7 days to go!" },
    Milestone { key: "w2", remaining_ms: 2 * MS_WEEK, label: "2 weeks to go!" },
    Milestone { key: "w3", remaining_ms: 3 * MS_WEEK, label: "3 weeks to go!" },
    Milestone { key: "w4", remaining_ms: 4 * MS_WEEK, label: "4 weeks to go!" },
    Milestone { key: "m2", remaining_ms: 2 * MS_MONTH, label: "2 months to go!" },
    Milestone { key: "m3", remaining_ms: 3 * MS_MONTH, label: "3 months to go!" },
    Milestone { key: "m4", remaining_ms: 4 * MS_MONTH, label: "4 months to go!" },
    Milestone { key: "m5", remaining_ms: 5 * MS_MONTH, label: "5 months to go!" },
    Milestone { key: "m6", remaining_ms: 6 * MS_MONTH, label: "6 months to go!" },
    Milestone { key: "m7", remaining_ms: 7 * MS_MONTH, label: "7 months to go!" },
    Milestone { key: "m8", remaining_ms: 8 * MS_MONTH, label: "8 months to go!" },
    Milestone { key: "m9", remaining_ms: 9 * MS_MONTH, label: "9 months to go!" },
    Milestone { key: "m10", remaining_ms: 10 * MS_MONTH, label: "10 months to go!" },
    Milestone { key: "m11", remaining_ms: 11 * MS_MONTH, label: "11 months to go!" },
    Milestone { key: "m12", remaining_ms: 12 * MS_MONTH, label: "12 months to go!" },
];

/// Time left until `target`, with the local clock corrected by `offset`.
/// Clamped to zero once the target has passed.
pub fn remaining(target: OffsetDateTime, now: OffsetDateTime, offset: Duration) -> Duration {
    let diff = target - (now + offset);
    if diff.is_negative() { Duration::ZERO } else { diff }
}

/// First table entry whose remaining time is within `tolerance` of the given
/// remaining time (exclusive bound: a difference of exactly `tolerance` does
/// not match). Zero or negative remaining always yields the release
/// milestone.
pub fn match_milestone(remaining: Duration, tolerance: Duration) -> Option<Milestone> {
    let remaining_ms = remaining.whole_milliseconds() as i64;
    if remaining_ms <= 0 {
        return Some(RELEASE_MILESTONE);
    }
    let tolerance_ms = tolerance.whole_milliseconds() as i64;
    MILESTONES
        .iter()
        .copied()
        .find(|milestone| (remaining_ms - milestone.remaining_ms).abs() < tolerance_ms)
}
