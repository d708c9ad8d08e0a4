//! HTTP surface for the coaching engine.
//!
//! Sessions live in memory, keyed by session id, and a restart loses them.
//! `GET /sessions/:id` returns the full serializable state for hosts that
//! persist it themselves.
//!
//! # Endpoints
//!
//! - `GET  /health`                  — Liveness check
//! - `POST /sessions`                — Start a session
//! - `GET  /sessions/:id`            — Session state, for persistence
//! - `POST /sessions/:id/turns`      — Advance one dialogue turn
//! - `POST /sessions/:id/replies`    — Score, correct and deliver a reply
//! - `GET  /sessions/:id/transcript` — Ordered transcript
//! - `POST /score`                   — Score a text against directives

pub mod routes;

pub use routes::{app_router, AppState};
