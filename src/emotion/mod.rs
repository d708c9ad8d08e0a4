//! Emotional state: the five clamped session counters and the EQ category
//! profile accumulated over the session.

pub mod profile;
pub mod state;

pub use profile::{EqProfile, EqProfileTracker};
pub use state::{EmotionalState, STATE_MAX};
