//! Reader interactions: sanitized actions, aggregated counters and the log
//! processor folding one into the other.
//!
//! ## Flow
//!
//! ```text
//! POST /api/log-action ──sanitize──▶ log:<slug>:<ip>:<id>   (INTERACTIONS_LOG)
//!                                         │
//!                     process_logs (cron / POST /api/process-log)
//!                                         ▼
//!                                   interactions:<slug>      (INTERACTIONS_CACHE)
//! ```

mod action;
mod counters;
mod processor;
mod sanitize;

pub use action::{Action, Comment, CommentTarget, Rating};
pub use counters::{ItemCounters, RatingStats, SeriesInteractions, SeriesStats};
pub use processor::{LogProcessor, ProcessSummary, process_logs};
pub use sanitize::{SanitizeContext, sanitize};
