// src/session/mod.rs
//
// The server-side test session: a per-(student, test) state machine
// driving the countdown, answer tracking, navigation, best-effort
// resume snapshots and the exactly-once submission pipeline.

pub mod engine;
pub mod pipeline;
pub mod registry;
pub mod scoring;
pub mod snapshot;

pub use engine::{Phase, SubmitStatus, TestSession, TickOutcome};
pub use pipeline::SubmissionOutcome;
pub use registry::{SessionKey, SessionRegistry, SharedSession};
pub use snapshot::SessionSnapshot;
