use std::{
    ops::ControlFlow,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use fuzzpilot_engine::{ArenaSimulator, ScenarioRegistry};
use fuzzpilot_evaluator::{
    schema::ChromosomeSchema,
    session_evaluator::{FitnessEvaluator, FitnessPolicy, FitnessPreset},
};
use fuzzpilot_training::{
    config::GaConfig,
    genetic::{GenerationReport, GeneticAlgorithm, SearchOutcome},
};
use serde::{Deserialize, Serialize};

use crate::{
    model::{
        pilot_model::PilotModel,
        results_log::{self, TrainingRecord},
    },
    util::{self, JsonOutput},
};

/// Everything a training run needs besides file paths.
///
/// Loaded from `--config`; command-line flags override individual values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TrainConfig {
    pub ga: GaConfig,
    pub fitness: FitnessPreset,
    /// Custom fitness coefficients, used instead of `fitness` when set.
    pub policy: Option<FitnessPolicy>,
    pub scenarios: Vec<String>,
    pub runs_per_scenario: usize,
    /// Wall-clock budget per run in seconds.
    pub timeout_secs: Option<f64>,
    /// Overrides `ga.threads` when set.
    pub threads: Option<usize>,
    pub centers_per_input: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            ga: GaConfig::default(),
            fitness: FitnessPreset::default(),
            policy: None,
            scenarios: vec!["random_repeatable".to_owned()],
            runs_per_scenario: 1,
            timeout_secs: None,
            threads: None,
            centers_per_input: 1,
        }
    }
}

impl TrainConfig {
    fn ga_config(&self) -> GaConfig {
        let mut ga = self.ga.clone();
        if self.threads.is_some() {
            ga.threads = self.threads;
        }
        ga
    }

    fn policy(&self) -> FitnessPolicy {
        self.policy.unwrap_or_else(|| self.fitness.policy())
    }

    fn fitness_name(&self) -> String {
        match self.policy {
            Some(_) => "custom".to_owned(),
            None => self.fitness.to_string().to_lowercase(),
        }
    }

    fn schema(&self) -> ChromosomeSchema {
        ChromosomeSchema::with_centers(self.centers_per_input)
    }

    fn evaluator(&self, registry: &ScenarioRegistry) -> anyhow::Result<FitnessEvaluator> {
        anyhow::ensure!(!self.scenarios.is_empty(), "No training scenario selected");
        anyhow::ensure!(
            self.runs_per_scenario > 0,
            "Runs per scenario must be positive"
        );
        let scenarios = registry.select(&self.scenarios)?;
        Ok(FitnessEvaluator::new(
            Arc::new(ArenaSimulator::default()),
            self.schema(),
            scenarios,
        )
        .with_runs(self.runs_per_scenario)
        .with_policy(self.policy())
        .with_timeout(util::timeout_from_secs(self.timeout_secs)?))
    }
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration file (JSON format)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of individuals per generation
    #[arg(long)]
    population: Option<usize>,
    /// Number of generations
    #[arg(long)]
    generations: Option<usize>,
    /// Tournament size for parent selection
    #[arg(long)]
    tournament: Option<usize>,
    /// Training scenario; repeat for several
    #[arg(long)]
    scenario: Vec<String>,
    /// JSON file with additional scenarios
    #[arg(long)]
    scenarios: Option<PathBuf>,
    /// Runs per scenario for every individual
    #[arg(long)]
    runs: Option<usize>,
    /// Fitness formula: cubic, quintic, quadratic or accuracyquintic
    #[arg(long)]
    fitness: Option<FitnessPreset>,
    /// RNG seed for a repeatable run
    #[arg(long)]
    seed: Option<u64>,
    /// Evaluation threads (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
    /// Wall-clock budget per run in seconds
    #[arg(long)]
    timeout_secs: Option<f64>,
    /// Interior membership function centers per block input
    #[arg(long)]
    centers: Option<usize>,
    /// Model whose chromosome joins the initial population
    #[arg(long)]
    seed_model: Option<PathBuf>,
    /// Stop as soon as the best fitness reaches this value
    #[arg(long)]
    target_fitness: Option<f64>,
    /// Plain-text log the run summary is appended to
    #[arg(long, default_value = "results.txt")]
    results_log: PathBuf,
    /// Model name (defaults to the fitness formula)
    #[arg(long)]
    name: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn apply_to(&self, config: &mut TrainConfig) {
        if let Some(population) = self.population {
            config.ga.population_size = population;
        }
        if let Some(generations) = self.generations {
            config.ga.generations = generations;
        }
        if let Some(tournament) = self.tournament {
            config.ga.tournament_size = tournament;
        }
        if !self.scenario.is_empty() {
            config.scenarios.clone_from(&self.scenario);
        }
        if let Some(runs) = self.runs {
            config.runs_per_scenario = runs;
        }
        if let Some(fitness) = self.fitness {
            config.fitness = fitness;
            config.policy = None;
        }
        if self.seed.is_some() {
            config.ga.seed = self.seed;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }
        if let Some(centers) = self.centers {
            config.centers_per_input = centers;
        }
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let mut config = match &arg.config {
        Some(path) => util::read_json_file("training config", path)?,
        None => TrainConfig::default(),
    };
    arg.apply_to(&mut config);

    let registry = util::load_scenario_registry(arg.scenarios.as_deref())?;
    let seed_genes = match &arg.seed_model {
        Some(path) => {
            let model = util::read_pilot_model_file(path)?;
            anyhow::ensure!(
                model.centers_per_input == config.centers_per_input,
                "Seed model {} has {} centers per input, training uses {}",
                path.display(),
                model.centers_per_input,
                config.centers_per_input
            );
            vec![model.genes]
        }
        None => vec![],
    };

    let target = arg.target_fitness;
    let outcome = train(&config, &registry, seed_genes, |report| {
        if target.is_some_and(|target| report.best_so_far >= target) {
            eprintln!(
                "Target fitness reached at generation #{}",
                report.generation
            );
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    let best = outcome
        .best
        .context("Training finished without evaluating a generation")?;
    let final_fitness = best.fitness().context("Best individual was never evaluated")?;

    eprintln!("Training completed.");
    eprintln!("  Generations run: {}", outcome.history.len());
    if outcome.stopped_early {
        eprintln!("  Stopped early");
    }
    eprintln!("  Best fitness: {final_fitness:.3}");

    let model = PilotModel {
        name: arg.name.clone().unwrap_or_else(|| config.fitness_name()),
        trained_at: Utc::now(),
        final_fitness,
        centers_per_input: config.centers_per_input,
        genes: best.into_genes(),
    };
    let record = TrainingRecord {
        finished_at: model.trained_at,
        config: &config.ga,
        fitness: config.fitness,
        policy: config.policy,
        scenarios: &config.scenarios,
        best_fitness: final_fitness,
        genes: &model.genes,
    };
    save_results(&model, &record, arg.output.as_deref(), &arg.results_log)?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    eprintln!("  Genes: {}", model.genes.len());

    Ok(())
}

/// Saves the model, then appends the run to the results log.
///
/// A results log that cannot be written is reported as a warning; the run still succeeds.
fn save_results(
    model: &PilotModel,
    record: &TrainingRecord<'_>,
    output: Option<&Path>,
    results_log: &Path,
) -> anyhow::Result<()> {
    JsonOutput::new(output).write(model)?;
    match results_log::append(results_log, record) {
        Ok(()) => eprintln!("Results log: {}", results_log.display()),
        Err(err) => eprintln!("Warning: {err:#}"),
    }
    Ok(())
}

fn train<O>(
    config: &TrainConfig,
    registry: &ScenarioRegistry,
    seed_genes: Vec<Vec<f64>>,
    mut observer: O,
) -> anyhow::Result<SearchOutcome>
where
    O: FnMut(&GenerationReport) -> ControlFlow<()>,
{
    let evaluator = config.evaluator(registry)?;
    let ga_config = config.ga_config();
    let gene_ranges = evaluator.schema().gene_ranges();
    let mut ga = GeneticAlgorithm::new(ga_config, gene_ranges)?.with_seed_individuals(seed_genes)?;

    eprintln!(
        "Training {} genes on {} ({} runs each), population {}, {} generations, {} threads",
        evaluator.schema().gene_count(),
        config.scenarios.join(", "),
        config.runs_per_scenario,
        ga.config().population_size,
        ga.config().generations,
        ga.threads(),
    );

    let fitness = |genes: &[f64]| evaluator.evaluate(genes);
    Ok(ga.run(&fitness, &mut observer))
}
