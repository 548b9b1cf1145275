use std::path::PathBuf;

use fuzzpilot_engine::{AsteroidField, Scenario};

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ScenariosArg {
    /// JSON file with additional scenarios
    #[arg(long)]
    scenarios: Option<PathBuf>,
}

pub(crate) fn run(arg: &ScenariosArg) -> anyhow::Result<()> {
    let ScenariosArg { scenarios } = arg;
    let registry = util::load_scenario_registry(scenarios.as_deref())?;
    for scenario in registry.iter() {
        println!("{}", describe(scenario));
    }
    eprintln!("{} scenarios", registry.len());
    Ok(())
}

fn describe(scenario: &Scenario) -> String {
    let asteroids = match &scenario.asteroids {
        AsteroidField::Random { count, seed } => format!("{count} random (seed {seed})"),
        AsteroidField::Fixed(spawns) => format!("{} fixed", spawns.len()),
    };
    format!(
        "{:<20} {:>5.0}x{:<5.0} {:>6.1}s  {asteroids}",
        scenario.name, scenario.map_size.width, scenario.map_size.height, scenario.time_limit,
    )
}

#[cfg(test)]
mod tests {
    use fuzzpilot_engine::ScenarioRegistry;

    use super::*;

    #[test]
    fn test_describe_mentions_field() {
        let registry = ScenarioRegistry::builtin();
        for scenario in registry.iter() {
            let line = describe(scenario);
            assert!(line.starts_with(&scenario.name));
            assert!(line.contains("random") || line.contains("fixed"));
        }
    }
}
