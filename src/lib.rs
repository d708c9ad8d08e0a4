//! # eqcoach
//!
//! Stateful controller for turn-based coaching conversations.
//!
//! Every student utterance is turned into emotional-intelligence signals,
//! folded into a bounded emotional state and a cumulative profile, and
//! walked one step through a fixed multi-phase dialogue. The resulting
//! mood drives style directives for the next coach reply, and candidate
//! replies are scored against those directives, deterministically reranked
//! and, when a rewriter is available, corrected in a bounded loop before
//! delivery.
//!
//! Language models are optional collaborators behind narrow traits
//! ([`collaborators::Generator`], [`collaborators::SignalRefiner`],
//! [`collaborators::Rewriter`]). Without them the engine runs fully
//! deterministic on keyword heuristics.
//!
//! ```no_run
//! use eqcoach::{CoachingEngine, EngineConfig, SessionConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = CoachingEngine::standalone(EngineConfig::default())?;
//! let state = engine.init_session(&SessionConfig::default())?;
//! let state = engine.run_turn("Honestly I'm pretty stressed about all this", &state).await?;
//! println!("{}", engine.current_prompt(&state)?);
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod config;
pub mod dialogue;
pub mod emotion;
pub mod engine;
pub mod errors;
pub mod quality;
pub mod server;
pub mod signals;
pub mod tone;

pub use config::{EngineConfig, SessionConfig};
pub use dialogue::{build_transcript, DialogueOrchestrator, Phase, SessionState, Transcript};
pub use emotion::{EmotionalState, EqProfileTracker};
pub use engine::{CoachingEngine, Collaborators};
pub use errors::{
    CatalogIntegrityError, CollaboratorFailure, ConfigError, SessionError, ValidationError,
};
pub use quality::{CorrectionOutcome, CorrectionResult, ScoreReport};
pub use signals::{EqSignal, SignalDelta};
pub use tone::{StyleDirectives, ToneSnapshot};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
