//! Genetic algorithm over fixed-length real-valued chromosomes.
//!
//! This module implements a generational genetic algorithm (GA) that searches for the
//! chromosome maximizing a [`Fitness`] function. It uses tournament selection,
//! single-point crossover, per-gene mutation and single-individual elitism.
//!
//! # Algorithm Overview
//!
//! Each generation:
//!
//! 1. **Evaluate Fitness** - Every individual not yet scored is evaluated on the
//!    [`EvaluationPool`]
//! 2. **Track Best** - The generation best replaces the best-so-far if strictly better
//! 3. **Schedule Rates** - Mutation and crossover rates are interpolated between their
//!    configured start and end values
//! 4. **Detect Stagnation** - If the generation best equals the previous generation's
//!    best, the stagnation counter grows, otherwise it resets; at the threshold, the
//!    mutation rate is multiplied by the boost and clamped to the configured maximum
//! 5. **Elitism** - The generation best is copied unchanged, with its score
//! 6. **Reproduce** - Pairs of parents are drawn by tournament, crossed over with the
//!    crossover rate (cloned otherwise) and mutated gene by gene, until the population is
//!    full again (an odd size drops the last surplus child)
//!
//! The search stops after the configured number of generations, or earlier when the
//! [`GenerationObserver`] asks to. Either way the best individual ever seen is returned,
//! which may come from any generation.
//!
//! # Key Components
//!
//! - [`Individual`] - A chromosome and its fitness, once evaluated
//! - [`Population`] - The individuals of one generation
//! - [`GeneticAlgorithm`] - Owns the configuration, RNG, worker pool and population
//! - [`GenerationReport`] - Per-generation progress, handed to the observer
//!
//! # Genetic Operators
//!
//! ## Tournament Selection
//!
//! Draw K individuals uniformly with replacement and keep the fittest. Larger K means
//! stronger selection pressure; as K grows past the population size, the best individual
//! is selected almost surely.
//!
//! ## Crossover and Mutation
//!
//! See [`genes`](crate::genes).
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use fuzzpilot_training::{
//!     config::GaConfig,
//!     genetic::{GenerationReport, GeneticAlgorithm},
//! };
//!
//! let config = GaConfig {
//!     population_size: 12,
//!     generations: 15,
//!     seed: Some(7),
//!     threads: Some(2),
//!     ..GaConfig::default()
//! };
//! let mut ga = GeneticAlgorithm::new(config, vec![(0.0, 1.0); 4]).unwrap();
//! let target = |genes: &[f64]| -genes.iter().map(|g| (g - 0.25).powi(2)).sum::<f64>();
//! let outcome = ga.run(&target, &mut |_: &GenerationReport| ControlFlow::Continue(()));
//! assert_eq!(outcome.history.len(), 15);
//! assert!(outcome.best.unwrap().fitness().unwrap() > -0.5);
//! ```
//!
//! # Current Limitations
//!
//! - **Single elite**: only one individual is preserved per generation
//! - **No restart mechanism**: stagnation only raises the mutation rate; the population is
//!   never reinitialized
//! - **Single-objective only**: fitness is a scalar

use std::ops::ControlFlow;

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;

use crate::{
    config::{ConfigError, GaConfig},
    genes,
    pool::EvaluationPool,
};

/// Fitness assigned to individuals whose evaluation failed.
pub const MIN_FITNESS: f64 = -1.0e9;

/// A function to maximize.
pub trait Fitness: Sync {
    fn fitness(&self, genes: &[f64]) -> f64;
}

impl<F> Fitness for F
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    fn fitness(&self, genes: &[f64]) -> f64 {
        self(genes)
    }
}

/// Receives a report after every evaluated generation and may stop the search.
pub trait GenerationObserver {
    fn on_generation(&mut self, report: &GenerationReport) -> ControlFlow<()>;
}

impl<F> GenerationObserver for F
where
    F: FnMut(&GenerationReport) -> ControlFlow<()>,
{
    fn on_generation(&mut self, report: &GenerationReport) -> ControlFlow<()> {
        self(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub generation_best: f64,
    pub best_so_far: f64,
    pub mean: f64,
    /// Mutation rate used to breed the next generation, boost included.
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub stagnation: usize,
}

/// A single candidate chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    genes: Vec<f64>,
    fitness: Option<f64>,
}

impl Individual {
    /// An individual that has not been evaluated yet.
    #[must_use]
    pub fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    #[must_use]
    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    /// `None` until the individual has been evaluated.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    #[must_use]
    pub fn into_genes(self) -> Vec<f64> {
        self.genes
    }

    fn score(&self) -> f64 {
        self.fitness.unwrap_or(MIN_FITNESS)
    }
}

impl AsRef<[f64]> for Individual {
    fn as_ref(&self) -> &[f64] {
        &self.genes
    }
}

/// The individuals of one generation.
#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// `count` individuals drawn uniformly from `ranges`.
    #[must_use]
    pub fn random<R>(ranges: &[(f64, f64)], count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let individuals = (0..count)
            .map(|_| Individual::new(genes::random(ranges, rng)))
            .collect();
        Self { individuals }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// The fittest individual; the first one wins ties.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|best, ind| if ind.score() > best.score() { ind } else { best })
    }

    #[must_use]
    pub fn mean_fitness(&self) -> f64 {
        if self.individuals.is_empty() {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss)]
        let len = self.individuals.len() as f64;
        self.individuals.iter().map(Individual::score).sum::<f64>() / len
    }

    /// Scores every individual that has no fitness yet.
    fn evaluate<F>(&mut self, pool: &EvaluationPool, fitness: &F)
    where
        F: Fitness + ?Sized,
    {
        let pending: Vec<usize> = self
            .individuals
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.fitness.is_none())
            .map(|(i, _)| i)
            .collect();
        let chromosomes: Vec<&[f64]> = pending
            .iter()
            .map(|&i| self.individuals[i].genes())
            .collect();
        let scores = pool.evaluate(&chromosomes, fitness);
        for (i, score) in pending.into_iter().zip(scores) {
            self.individuals[i].fitness = Some(score);
        }
    }
}

/// Result of [`GeneticAlgorithm::run`].
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best individual over all generations; `None` only if no generation completed.
    pub best: Option<Individual>,
    pub history: Vec<GenerationReport>,
    /// The observer stopped the search before the last generation.
    pub stopped_early: bool,
}

#[derive(Debug)]
pub struct GeneticAlgorithm {
    config: GaConfig,
    gene_ranges: Vec<(f64, f64)>,
    rng: Pcg64Mcg,
    pool: EvaluationPool,
    population: Population,
}

impl GeneticAlgorithm {
    /// Validates `config`, then builds the RNG, the worker pool and a random population.
    pub fn new(config: GaConfig, gene_ranges: Vec<(f64, f64)>) -> Result<Self, ConfigError> {
        config.validate()?;
        if gene_ranges.is_empty() {
            return Err(ConfigError::NoGenes);
        }
        for (index, &(min, max)) in gene_ranges.iter().enumerate() {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(ConfigError::InvalidGeneRange { index, min, max });
            }
        }

        let mut rng = match config.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::from_rng(&mut rand::rng()),
        };
        let pool = EvaluationPool::new(config.threads)?;
        let population = Population::random(&gene_ranges, config.population_size, &mut rng);
        log::debug!(
            "population of {} with {} genes, {} evaluation threads",
            config.population_size,
            gene_ranges.len(),
            pool.threads()
        );
        Ok(Self {
            config,
            gene_ranges,
            rng,
            pool,
            population,
        })
    }

    /// Replaces the first individuals of the initial population with known chromosomes.
    ///
    /// Genes are clamped into their ranges; surplus seeds are ignored.
    pub fn with_seed_individuals(mut self, seeds: Vec<Vec<f64>>) -> Result<Self, ConfigError> {
        for (index, seed) in seeds.iter().enumerate() {
            if seed.len() != self.gene_ranges.len() {
                return Err(ConfigError::SeedLength {
                    index,
                    expected: self.gene_ranges.len(),
                    actual: seed.len(),
                });
            }
        }
        for (slot, seed) in self.population.individuals.iter_mut().zip(seeds) {
            let genes = seed
                .into_iter()
                .zip(&self.gene_ranges)
                .map(|(g, &(min, max))| g.clamp(min, max))
                .collect();
            *slot = Individual::new(genes);
        }
        Ok(self)
    }

    #[must_use]
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    /// Runs the search to completion or until `observer` breaks.
    pub fn run<F, O>(&mut self, fitness: &F, observer: &mut O) -> SearchOutcome
    where
        F: Fitness + ?Sized,
        O: GenerationObserver + ?Sized,
    {
        let generations = self.config.generations;
        let mut best: Option<Individual> = None;
        let mut previous_best: Option<f64> = None;
        let mut stagnation = 0;
        let mut history = Vec::with_capacity(generations);
        let mut stopped_early = false;

        for generation in 0..generations {
            self.population.evaluate(&self.pool, fitness);
            let Some(generation_best) = self.population.best().cloned() else {
                break;
            };
            let generation_fitness = generation_best.score();
            if best.as_ref().is_none_or(|b| generation_fitness > b.score()) {
                best = Some(generation_best.clone());
            }

            stagnation = if previous_best == Some(generation_fitness) {
                stagnation + 1
            } else {
                0
            };
            previous_best = Some(generation_fitness);

            let crossover_rate = self.config.crossover.at(generation, generations);
            let mut mutation_rate = self.config.mutation.at(generation, generations);
            if stagnation >= self.config.stagnation_threshold {
                mutation_rate = (mutation_rate * self.config.stagnation_boost)
                    .min(self.config.max_mutation_rate);
            }

            let report = GenerationReport {
                generation,
                generation_best: generation_fitness,
                best_so_far: best.as_ref().map_or(generation_fitness, Individual::score),
                mean: self.population.mean_fitness(),
                mutation_rate,
                crossover_rate,
                stagnation,
            };
            log::info!(
                "generation {generation}: best {:.3}, best so far {:.3}, mean {:.3}, \
                 mutation {mutation_rate:.3}, crossover {crossover_rate:.3}, stagnation {stagnation}",
                report.generation_best,
                report.best_so_far,
                report.mean,
            );
            history.push(report);

            if observer.on_generation(&report).is_break() {
                stopped_early = generation + 1 < generations;
                break;
            }
            if generation + 1 < generations {
                self.breed(&generation_best, mutation_rate, crossover_rate, generation);
            }
        }

        SearchOutcome {
            best,
            history,
            stopped_early,
        }
    }

    /// Replaces the population with the elite plus bred children.
    fn breed(
        &mut self,
        elite: &Individual,
        mutation_rate: f64,
        crossover_rate: f64,
        generation: usize,
    ) {
        let size = self.config.population_size;
        let op = self
            .config
            .mutation_strategy
            .operator(generation, self.config.generations);
        let mut next = Vec::with_capacity(size + 1);
        next.push(elite.clone());

        while next.len() < size {
            let parents = &self.population.individuals;
            let p1 = tournament_select(parents, self.config.tournament_size, &mut self.rng);
            let p2 = tournament_select(parents, self.config.tournament_size, &mut self.rng);
            let (mut c1, mut c2) = if self.rng.random::<f64>() < crossover_rate {
                genes::single_point_crossover(&p1.genes, &p2.genes, &mut self.rng)
            } else {
                (p1.genes.clone(), p2.genes.clone())
            };
            genes::mutate(&mut c1, &self.gene_ranges, mutation_rate, op, &mut self.rng);
            genes::mutate(&mut c2, &self.gene_ranges, mutation_rate, op, &mut self.rng);
            next.push(Individual::new(c1));
            next.push(Individual::new(c2));
        }
        next.truncate(size);
        self.population = Population { individuals: next };
    }
}

/// Draws `tournament_size` individuals with replacement and returns the fittest.
fn tournament_select<'a, R>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual
where
    R: Rng + ?Sized,
{
    assert!(!population.is_empty());
    let mut winner = &population[rng.random_range(0..population.len())];
    for _ in 1..tournament_size {
        let challenger = &population[rng.random_range(0..population.len())];
        if challenger.score() > winner.score() {
            winner = challenger;
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;

    use super::*;
    use crate::config::RateSchedule;

    fn config(population_size: usize, generations: usize) -> GaConfig {
        GaConfig {
            population_size,
            generations,
            seed: Some(42),
            threads: Some(2),
            ..GaConfig::default()
        }
    }

    fn sphere(genes: &[f64]) -> f64 {
        -genes.iter().map(|g| (g - 0.7).powi(2)).sum::<f64>()
    }

    fn keep_going(_: &GenerationReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn evaluated(fitness: &[f64]) -> Vec<Individual> {
        fitness
            .iter()
            .map(|&f| Individual {
                genes: vec![f],
                fitness: Some(f),
            })
            .collect()
    }

    #[test]
    fn test_population_size_is_invariant() {
        for size in [2, 3, 7, 10] {
            let mut ga = GeneticAlgorithm::new(config(size, 5), vec![(0.0, 1.0); 6]).unwrap();
            let mut sizes = vec![];
            let outcome = ga.run(&sphere, &mut |r: &GenerationReport| {
                sizes.push(r.generation);
                ControlFlow::Continue(())
            });
            assert_eq!(outcome.history.len(), 5);
            assert_eq!(sizes, [0, 1, 2, 3, 4]);
            assert_eq!(ga.population().len(), size);
        }
    }

    #[test]
    fn test_elitism_is_monotonic() {
        let mut ga = GeneticAlgorithm::new(config(9, 30), vec![(0.0, 1.0); 8]).unwrap();
        let outcome = ga.run(&sphere, &mut keep_going);
        for pair in outcome.history.windows(2) {
            assert!(pair[1].generation_best >= pair[0].generation_best);
            assert!(pair[1].best_so_far >= pair[0].best_so_far);
        }
        let best = outcome.best.unwrap();
        assert_eq!(best.fitness(), Some(outcome.history[29].best_so_far));
        assert_eq!(sphere(best.genes()), best.fitness().unwrap());
        assert!(!outcome.stopped_early);
    }

    #[test]
    fn test_zero_rates_clone_selected_parents() {
        let config = GaConfig {
            mutation: RateSchedule::constant(0.0),
            crossover: RateSchedule::constant(0.0),
            ..config(10, 2)
        };
        let mut ga = GeneticAlgorithm::new(config, vec![(0.0, 1.0); 5]).unwrap();
        ga.population.evaluate(&ga.pool, &sphere);
        let before = ga.population.clone();
        let elite = before.best().unwrap().clone();

        ga.breed(&elite, 0.0, 0.0, 0);
        let after = ga.population();
        assert_eq!(after.len(), 10);
        assert_eq!(after.individuals()[0], elite);
        for child in &after.individuals()[1..] {
            assert_eq!(child.fitness(), None);
            assert!(before.individuals().iter().any(|p| p.genes() == child.genes()));
        }
    }

    #[test]
    fn test_tournament_pressure_grows_with_size() {
        let population = evaluated(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let mut best_share = |k: usize| {
            let wins = (0..4000)
                .filter(|_| tournament_select(&population, k, &mut rng).score() == 10.0)
                .count();
            #[expect(clippy::cast_precision_loss)]
            let share = wins as f64 / 4000.0;
            share
        };
        let k1 = best_share(1);
        let k3 = best_share(3);
        let k10 = best_share(10);
        let k50 = best_share(50);
        assert!(k1 < k3 && k3 < k10 && k10 < k50, "{k1} {k3} {k10} {k50}");
        assert!((k1 - 0.1).abs() < 0.03);
        assert!(k50 > 0.98);
    }

    #[test]
    fn test_stagnation_boost_is_clamped() {
        let config = GaConfig {
            mutation: RateSchedule::constant(0.5),
            stagnation_threshold: 3,
            stagnation_boost: 4.0,
            max_mutation_rate: 0.9,
            ..config(4, 6)
        };
        let mut ga = GeneticAlgorithm::new(config, vec![(0.0, 1.0); 3]).unwrap();
        let flat = |_: &[f64]| 1.0;
        let outcome = ga.run(&flat, &mut keep_going);
        let stagnation: Vec<_> = outcome.history.iter().map(|r| r.stagnation).collect();
        assert_eq!(stagnation, [0, 1, 2, 3, 4, 5]);
        let rates: Vec<_> = outcome.history.iter().map(|r| r.mutation_rate).collect();
        assert_eq!(rates, [0.5, 0.5, 0.5, 0.9, 0.9, 0.9]);
    }

    #[test]
    fn test_observer_can_stop_early() {
        let mut ga = GeneticAlgorithm::new(config(6, 50), vec![(0.0, 1.0); 4]).unwrap();
        let outcome = ga.run(&sphere, &mut |r: &GenerationReport| {
            if r.generation == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(outcome.stopped_early);
        assert_eq!(outcome.history.len(), 3);
        assert!(outcome.best.is_some());
    }

    #[test]
    fn test_same_seed_same_result() {
        let run = |threads| {
            let config = GaConfig {
                threads: Some(threads),
                ..config(8, 10)
            };
            let mut ga = GeneticAlgorithm::new(config, vec![(0.0, 1.0); 5]).unwrap();
            ga.run(&sphere, &mut keep_going).best.unwrap()
        };
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn test_seed_individuals() {
        let ranges = vec![(0.0, 1.0); 3];
        let ga = GeneticAlgorithm::new(config(5, 3), ranges.clone()).unwrap();
        assert!(matches!(
            ga.with_seed_individuals(vec![vec![0.7; 2]]),
            Err(ConfigError::SeedLength {
                index: 0,
                expected: 3,
                actual: 2
            })
        ));

        let ga = GeneticAlgorithm::new(config(5, 3), ranges).unwrap();
        let mut ga = ga
            .with_seed_individuals(vec![vec![0.7; 3], vec![2.0, -1.0, 0.5]])
            .unwrap();
        assert_eq!(ga.population().individuals()[1].genes(), [1.0, 0.0, 0.5]);
        let outcome = ga.run(&sphere, &mut keep_going);
        assert_eq!(outcome.best.unwrap().genes(), [0.7; 3]);
    }

    #[test]
    fn test_rejects_invalid_setup() {
        assert!(matches!(
            GeneticAlgorithm::new(config(1, 3), vec![(0.0, 1.0)]),
            Err(ConfigError::PopulationTooSmall { size: 1 })
        ));
        assert!(matches!(
            GeneticAlgorithm::new(config(4, 3), vec![]),
            Err(ConfigError::NoGenes)
        ));
        assert!(matches!(
            GeneticAlgorithm::new(config(4, 3), vec![(0.0, 1.0), (1.0, 1.0)]),
            Err(ConfigError::InvalidGeneRange { index: 1, .. })
        ));
    }
}
