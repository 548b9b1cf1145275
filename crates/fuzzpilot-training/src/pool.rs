//! Reusable worker pool for fitness evaluation.
//!
//! Evaluating one chromosome means playing whole games, and individuals are independent
//! of each other, so a generation is evaluated as one parallel map over the population.
//! The pool is built once per search and reused for every generation.

use std::{
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    thread,
};

use rayon::prelude::*;

use crate::genetic::{Fitness, MIN_FITNESS};

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("failed to build the evaluation thread pool")]
pub struct PoolBuildError(rayon::ThreadPoolBuildError);

#[derive(Debug)]
pub struct EvaluationPool {
    pool: rayon::ThreadPool,
}

impl EvaluationPool {
    /// Builds a pool with `threads` workers, or one per available core.
    pub fn new(threads: Option<usize>) -> Result<Self, PoolBuildError> {
        let threads = threads
            .filter(|n| *n > 0)
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fuzzpilot-eval-{i}"))
            .build()
            .map_err(PoolBuildError)?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Scores every chromosome, returning fitness values in input order.
    ///
    /// A panicking or NaN-producing fitness call scores [`MIN_FITNESS`].
    pub fn evaluate<G, F>(&self, chromosomes: &[G], fitness: &F) -> Vec<f64>
    where
        G: AsRef<[f64]> + Sync,
        F: Fitness + ?Sized,
    {
        self.pool.install(|| {
            chromosomes
                .par_iter()
                .enumerate()
                .map(|(index, genes)| {
                    match panic::catch_unwind(AssertUnwindSafe(|| fitness.fitness(genes.as_ref())))
                    {
                        Ok(value) if !value.is_nan() => value,
                        Ok(_) => {
                            log::warn!("individual {index}: fitness is NaN");
                            MIN_FITNESS
                        }
                        Err(_) => {
                            log::warn!("individual {index}: fitness evaluation panicked");
                            MIN_FITNESS
                        }
                    }
                })
                .collect()
        })
    }
}
