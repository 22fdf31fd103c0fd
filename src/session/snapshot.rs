// src/session/snapshot.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::question::AnswerOption;

/// Resume snapshot for one (student, test) session, written through on
/// every state change and deleted only after a submission has been
/// confirmed committed.
///
/// This is a best-effort resume mechanism, not a source of truth: a
/// failed read or write is logged and the session proceeds with
/// defaults. Note that `time` re-seeds the countdown directly on
/// resume; elapsed wall-clock time while the session was away is not
/// recomputed. That freeze is the accepted resume behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current question index (0-based).
    pub index: usize,
    /// Question id -> selected option label.
    pub answers: BTreeMap<i64, AnswerOption>,
    /// Remaining seconds.
    pub time: i64,
    /// Question ids marked for review.
    pub marked: Vec<i64>,
}
