//! Fuzzy pilot: chromosome decoding, per-tick control and fitness evaluation.
//!
//! This crate turns a flat chromosome into a cascade of TSK blocks and uses it to steer a
//! ship through a [`Simulator`](fuzzpilot_engine::Simulator):
//!
//! 1. **Schema** ([`schema`]) - declares which genes belong to which slot of the cascade
//! 2. **Network** ([`network`]) - decodes a chromosome into named blocks and evaluates
//!    threat, thrust and avoidance scores for one asteroid
//! 3. **Controller** ([`controller`]) - turns those scores into an action every tick,
//!    switching between offensive and defensive behavior
//! 4. **Session Evaluation** ([`session_evaluator`]) - plays scenarios and reduces their
//!    scores to one fitness value for the genetic algorithm
//!
//! # Architecture
//!
//! ```text
//! Session Evaluation (fitness for training)
//!     ↓ builds one per run
//! FuzzyController (state: tracks, shot memory, mode, respawn countdown)
//!     ↓ uses
//! FuzzyNetwork (decoded once, shared read-only)
//!     ↓ reads
//! Features (toroidal geometry, normalized block inputs)
//! ```
//!
//! # Supporting Modules
//!
//! - [`features`] - closure rate, relative heading, intercept aim, gap finding
//! - [`tracker`] - stable asteroid identifiers across ticks
//!
//! # Current Limitations
//!
//! - **Fixed wiring**: the block inputs are fixed in code; a schema may reorder slots or
//!   widen blocks, but cannot rewire the cascade.
//! - **Single ship**: the controller assumes it is the only ship on the map.

pub mod controller;
pub mod features;
pub mod network;
pub mod schema;
pub mod session_evaluator;
pub mod tracker;
