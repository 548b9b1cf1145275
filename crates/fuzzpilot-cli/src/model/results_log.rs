use std::{
    fmt,
    fs::OpenOptions,
    io::{BufWriter, Write as _},
    path::Path,
};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use fuzzpilot_evaluator::session_evaluator::{FitnessPolicy, FitnessPreset};
use fuzzpilot_training::config::{GaConfig, MutationStrategy};

/// One finished training run, as appended to the plain-text results log.
#[derive(Debug, Clone)]
pub struct TrainingRecord<'a> {
    pub finished_at: DateTime<Utc>,
    pub config: &'a GaConfig,
    pub fitness: FitnessPreset,
    /// Custom coefficients used instead of `fitness`.
    pub policy: Option<FitnessPolicy>,
    pub scenarios: &'a [String],
    pub best_fitness: f64,
    pub genes: &'a [f64],
}

impl fmt::Display for TrainingRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let GaConfig {
            population_size,
            generations,
            tournament_size,
            mutation,
            crossover,
            mutation_strategy,
            ..
        } = self.config;
        writeln!(
            f,
            "[{}]",
            self.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        writeln!(
            f,
            "population={population_size} generations={generations} tournament={tournament_size}"
        )?;
        writeln!(
            f,
            "mutation={:.3}->{:.3} crossover={:.3}->{:.3} strategy={}",
            mutation.start,
            mutation.end,
            crossover.start,
            crossover.end,
            StrategyLabel(mutation_strategy),
        )?;
        writeln!(
            f,
            "fitness={} scenarios={}",
            FitnessLabel(self.fitness, self.policy.as_ref()),
            self.scenarios.join(",")
        )?;
        writeln!(f, "best_fitness={}", self.best_fitness)?;
        writeln!(f, "genes={:?}", self.genes)
    }
}

struct StrategyLabel<'a>(&'a MutationStrategy);

impl fmt::Display for StrategyLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            MutationStrategy::Reset => write!(f, "reset"),
            MutationStrategy::Perturb {
                initial_radius,
                final_radius,
            } => write!(f, "perturb({initial_radius:.3}->{final_radius:.3})"),
        }
    }
}

struct FitnessLabel<'a>(FitnessPreset, Option<&'a FitnessPolicy>);

impl fmt::Display for FitnessLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            None => write!(f, "{}", self.0),
            Some(FitnessPolicy {
                hit_weight,
                accuracy_weighted,
                death_coefficient,
                death_exponent,
            }) => write!(
                f,
                "custom(hits={hit_weight}{} deaths={death_coefficient}^{death_exponent})",
                if *accuracy_weighted { "*accuracy" } else { "" },
            ),
        }
    }
}

/// Appends `record` to the log at `path`, creating the file if needed.
///
/// Entries are separated by a blank line.
pub fn append(path: &Path, record: &TrainingRecord<'_>) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open results log: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{record}")
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to append to results log: {}", path.display()))?;
    Ok(())
}
