//! Session telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a side-effect layer. Routing decisions never read it; only
//! the status report displays it.
//!
//! # PRIVACY INVARIANT
//! Events never carry user text or generated jokes. Only enums, counts and
//! durations are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{ReplyKind, TelemetryEvent};
pub use metrics::TelemetrySnapshot;
pub use recorder::{SharedRecorder, TelemetryRecorder};
