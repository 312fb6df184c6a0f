//! # Result Generator
//!
//! Converts query outcomes into the object results reported to the host scanner.

use crate::results::outcome::QueryOutcome;
use crate::results::types::{CollectedItem, CollectionFlag, ItemStatus, ObjectResult};

pub struct ResultGenerator;

impl ResultGenerator {
    /// Render one outcome for `stream_id`
    ///
    /// In offline mode (scanning an image or chroot) an unreachable service is
    /// expected, so `Unavailable` is reported as not collected rather than as
    /// an error.
    pub fn render(outcome: &QueryOutcome, stream_id: &str, offline_mode: bool) -> ObjectResult {
        match outcome {
            QueryOutcome::Found { result, .. } => {
                ObjectResult::new(stream_id, CollectionFlag::Complete).with_item(CollectedItem {
                    stream_id: stream_id.to_string(),
                    security_attr: Some(result.as_str().to_string()),
                    status: ItemStatus::Exists,
                    message: None,
                })
            }
            QueryOutcome::NotFound { reason, .. } => {
                ObjectResult::new(stream_id, CollectionFlag::Complete).with_item(CollectedItem {
                    stream_id: stream_id.to_string(),
                    security_attr: None,
                    status: ItemStatus::NotCollected,
                    message: Some(reason.to_string()),
                })
            }
            QueryOutcome::Unavailable { reason } => {
                let flag = if offline_mode {
                    CollectionFlag::NotCollected
                } else {
                    CollectionFlag::Error
                };
                ObjectResult::new(stream_id, flag).with_message(reason.to_string())
            }
        }
    }
}
