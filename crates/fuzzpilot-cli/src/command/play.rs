use std::{path::PathBuf, sync::Arc};

use fuzzpilot_engine::ArenaSimulator;
use fuzzpilot_evaluator::session_evaluator::{FitnessEvaluator, FitnessPreset};

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Path to the model file (JSON format)
    #[arg(long)]
    model: PathBuf,
    /// Scenario to play; repeat for several. All scenarios when omitted
    #[arg(long)]
    scenario: Vec<String>,
    /// JSON file with additional scenarios
    #[arg(long)]
    scenarios: Option<PathBuf>,
    /// Fitness formula used for the reported fitness
    #[arg(long, default_value = "cubic")]
    fitness: FitnessPreset,
    /// Wall-clock budget per run in seconds
    #[arg(long)]
    timeout_secs: Option<f64>,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        model,
        scenario,
        scenarios,
        fitness,
        timeout_secs,
    } = arg;

    let model = util::read_pilot_model_file(model)?;
    let network = model.to_network()?;
    let registry = util::load_scenario_registry(scenarios.as_deref())?;
    let selected = if scenario.is_empty() {
        registry.iter().cloned().collect()
    } else {
        registry.select(scenario)?
    };

    let evaluator = FitnessEvaluator::new(
        Arc::new(ArenaSimulator::default()),
        model.schema(),
        selected,
    )
    .with_policy(fitness.policy())
    .with_timeout(util::timeout_from_secs(*timeout_secs)?);

    eprintln!("Model: {} (trained at {})", model.name, model.trained_at);
    let mut total = 0.0;
    for scenario in evaluator.scenarios() {
        let outcome = evaluator.run_once(&network, scenario)?;
        let score = &outcome.score;
        let run_fitness = evaluator.policy().score(score);
        total += run_fitness;
        for team in &score.teams {
            println!(
                "{:<20} hits {:>4}  deaths {:>2}  accuracy {:>5.1}%  fitness {run_fitness:>9.3}  ({}, {:.1}s)",
                scenario.name,
                team.asteroids_hit,
                team.deaths,
                team.accuracy() * 100.0,
                score.stop_reason,
                score.sim_time,
            );
        }
    }
    eprintln!("Total fitness ({fitness}): {total:.3}");
    Ok(())
}
