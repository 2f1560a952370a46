use serde::{Deserialize, Serialize};

use crate::milestone::Milestone;

/// One stored push endpoint with its encryption material. `endpoint` is the
/// primary key; upserting the same endpoint replaces the keys (rotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// Wire shape consumed by the platform notification display.
#[derive(Debug, Clone, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Keeps the release notification on screen until dismissed.
    #[serde(rename = "requireInteraction")]
    pub require_interaction: bool,
    pub data: PayloadData,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadData {
    pub url: String,
}

const PAYLOAD_ICON: &str = "/icon-192.png";
const PAYLOAD_URL: &str = "/";

impl PushPayload {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon: PAYLOAD_ICON.to_string(),
            require_interaction: false,
            data: PayloadData {
                url: PAYLOAD_URL.to_string(),
            },
        }
    }

    pub fn for_milestone(title: &str, milestone: &Milestone) -> Self {
        Self {
            require_interaction: milestone.is_terminal(),
            ..Self::new(title, milestone.label)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Gone,
    TransientFailure,
}

/// Transport failure as classified by the push sender port. `Gone` means the
/// endpoint is permanently invalid (410/404) and must be deleted.
#[derive(Debug)]
pub enum SendFailure {
    Gone,
    Transient(String),
}

impl std::fmt::Display for SendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendFailure::Gone => f.write_str("endpoint gone"),
            SendFailure::Transient(reason) => write!(f, "transient failure: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub gone: usize,
    pub failed: usize,
}

impl BroadcastSummary {
    /// Summary for a single-target delivery, so callers get one response
    /// shape whether they targeted one subscription or everyone.
    pub fn for_single(outcome: DeliveryOutcome) -> Self {
        let mut summary = Self {
            attempted: 1,
            ..Self::default()
        };
        match outcome {
            DeliveryOutcome::Delivered => summary.delivered = 1,
            DeliveryOutcome::Gone => summary.gone = 1,
            DeliveryOutcome::TransientFailure => summary.failed = 1,
        }
        summary
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn push_payload__should_serialize_to_wire_shape() {
        // Given
        let payload = PushPayload::new("T-Minus", "3 days to go!");

        // When
        let json = serde_json::to_string(&payload).expect("serialize payload");

        // Then
        assert_eq!(
            json,
            r#"{"title":"T-Minus","body":"3 days to go!","icon":"/icon-192.png","requireInteraction":false,"data":{"url":"/"}}"#
        );
    }

    #[test]
    fn for_milestone__should_require_interaction_only_at_release() {
        // Given
        use crate::milestone::{MILESTONES, RELEASE_MILESTONE};

        // When
        let release = PushPayload::for_milestone("T-Minus", &RELEASE_MILESTONE);
        let ordinary = PushPayload::for_milestone("T-Minus", &MILESTONES[0]);

        // Then
        assert!(release.require_interaction);
        assert_eq!(release.body, "The wait is over!");
        assert!(!ordinary.require_interaction);
    }

    #[test]
    fn for_single__should_count_each_outcome_once() {
        // Then
        assert_eq!(
            BroadcastSummary::for_single(DeliveryOutcome::Delivered),
            BroadcastSummary {
                attempted: 1,
                delivered: 1,
                gone: 0,
                failed: 0
            }
        );
        assert_eq!(
            BroadcastSummary::for_single(DeliveryOutcome::Gone),
            BroadcastSummary {
                attempted: 1,
                delivered: 0,
                gone: 1,
                failed: 0
            }
        );
        assert_eq!(
            BroadcastSummary::for_single(DeliveryOutcome::TransientFailure),
            BroadcastSummary {
                attempted: 1,
                delivered: 0,
                gone: 0,
                failed: 1
            }
        );
    }
}
