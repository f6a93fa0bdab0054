//! # Breathwork Core Library
//!
//! Core business logic for the Breathwork breathing-exercise tracker. The
//! CLI binary and any graphical front end are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Session Engine**: a clock-driven state machine for one breathing
//!   session (phases, cycles, pauses, holds). The caller polls it; the
//!   [`SessionDriver`] does so on a tokio task at frame rate
//! - **Persistence**: finished sessions go to a [`SessionSink`], either the
//!   local SQLite [`Database`], the remote HTTP API, or both
//! - **Statistics**: daily/weekly breakdowns and practice streaks
//!
//! ## Key Components
//!
//! - [`BreathingSessionEngine`]: session state machine
//! - [`Pattern`]: phase timings and their display semantics
//! - [`Clock`]: injectable wall/monotonic time source
//! - [`Database`]: session and favorites persistence
//! - [`ApiClient`]: remote persistence API
//! - [`Config`]: application configuration management

pub mod api;
pub mod clock;
pub mod error;
pub mod events;
pub mod pattern;
pub mod persistence;
pub mod session;
pub mod stats;
pub mod storage;

pub use api::ApiClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ApiError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use pattern::{Animation, Pattern, Presentation};
pub use persistence::{
    FanoutSink, NullSink, PendingUploads, RemoteSink, SessionSink, SessionSummary, UploadReport,
};
pub use session::{Activity, BreathingSessionEngine, CadenceConfig, HoldStats, SessionDriver};
pub use stats::{DailyStats, SessionStats, Streaks};
pub use storage::{Config, Database, FavoritePattern, PersistenceMode, SessionRecord};
