mod cadence;
mod driver;
mod engine;
mod state;

pub use cadence::{Cadence, CadenceConfig, Cadences};
pub use driver::SessionDriver;
pub use engine::BreathingSessionEngine;
pub use state::{Activity, HoldStats, SessionState};
