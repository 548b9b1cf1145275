//! Training system for evolving fuzzy pilot chromosomes with a genetic algorithm.
//!
//! This crate knows nothing about asteroids: it maximizes any [`Fitness`](genetic::Fitness)
//! over fixed-length real-valued chromosomes with per-gene bounds. The CLI plugs in the
//! session evaluator from `fuzzpilot-evaluator` as the fitness function.
//!
//! # How Training Works
//!
//! 1. **Population** - Draw random chromosomes within the gene ranges
//! 2. **Evaluation** - Score every new individual in parallel on a reusable worker pool
//! 3. **Selection** - Pick parents by tournament
//! 4. **Reproduction** - Create the next generation through crossover and mutation,
//!    keeping the best individual unchanged
//! 5. **Repeat** - Continue for the configured number of generations
//!
//! # Architecture
//!
//! ```text
//! GeneticAlgorithm (config, RNG, population)
//!     ↓ evaluates on
//! EvaluationPool (rayon workers, panics and NaN mapped to MIN_FITNESS)
//!     ↓ calls
//! Fitness (e.g. the session evaluator)
//!     ↓ guides
//! Selection & Reproduction (genes module)
//! ```
//!
//! # Genetic Algorithm Parameters
//!
//! See [`GaConfig`](config::GaConfig):
//!
//! - **Population size** - Number of individuals per generation
//! - **Tournament size** - Selection pressure
//! - **Mutation and crossover schedules** - Rates interpolated over the run
//! - **Mutation strategy** - Reset genes or perturb them with a shrinking radius
//! - **Stagnation boost** - Temporary mutation increase when progress stalls
//!
//! # Current Limitations
//!
//! - **Reproducibility needs a seed**: without one, the RNG is seeded from OS entropy
//! - **No checkpoints**: an interrupted run cannot be resumed

pub mod config;
pub mod genes;
pub mod genetic;
pub mod pool;
