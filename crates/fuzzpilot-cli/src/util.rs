use std::{
    fs::{self, File},
    io::{self, BufWriter},
    path::Path,
    time::Duration,
};

use anyhow::Context;
use fuzzpilot_engine::ScenarioRegistry;

use crate::model::pilot_model::PilotModel;

/// Where a JSON document goes: a file when a path was given, stdout otherwise.
#[derive(Debug, Clone, Copy)]
pub enum JsonOutput<'a> {
    Stdout,
    File(&'a Path),
}

impl<'a> JsonOutput<'a> {
    pub fn new(path: Option<&'a Path>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }

    /// Writes `value` as pretty-printed JSON followed by a newline.
    pub fn write<T>(self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        match self {
            Self::Stdout => write_pretty_json(io::stdout().lock(), value)
                .context("Failed to write JSON to stdout"),
            Self::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                write_pretty_json(BufWriter::new(file), value)
                    .with_context(|| format!("Failed to write JSON to {}", path.display()))
            }
        }
    }
}

fn write_pretty_json<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: io::Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a trained pilot model from a JSON file
pub fn read_pilot_model_file<P>(path: P) -> anyhow::Result<PilotModel>
where
    P: AsRef<Path>,
{
    read_json_file("pilot model", path)
}

/// The built-in scenarios, extended or overridden by a JSON scenario file
pub fn load_scenario_registry(path: Option<&Path>) -> anyhow::Result<ScenarioRegistry> {
    let mut registry = ScenarioRegistry::builtin();
    if let Some(path) = path {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        let extra = ScenarioRegistry::from_json(&json)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?;
        registry.extend(extra.iter().cloned());
    }
    Ok(registry)
}

/// Converts an optional timeout in seconds, rejecting negative and non-finite values
pub fn timeout_from_secs(secs: Option<f64>) -> anyhow::Result<Option<Duration>> {
    secs.map(|secs| {
        Duration::try_from_secs_f64(secs)
            .with_context(|| format!("Invalid timeout: {secs} seconds"))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_file_extends_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenarios.json");
        fs::write(
            &path,
            r#"[
                { "name": "duel", "time_limit": 5.0 },
                { "name": "one_asteroid", "time_limit": 2.0 }
            ]"#,
        )
        .unwrap();

        let builtin = ScenarioRegistry::builtin();
        let registry = load_scenario_registry(Some(path.as_path())).unwrap();
        assert_eq!(registry.len(), builtin.len() + 1);
        assert_eq!(registry.get("duel").unwrap().time_limit, 5.0);
        assert_eq!(registry.get("one_asteroid").unwrap().time_limit, 2.0);

        let missing = dir.path().join("missing.json");
        let err = load_scenario_registry(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_json_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeouts.json");
        JsonOutput::new(Some(path.as_path())).write(&[1.5, 2.0]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("]\n"));
        let values: Vec<f64> = read_json_file("timeouts", &path).unwrap();
        assert_eq!(values, [1.5, 2.0]);

        let missing = dir.path().join("no_such_dir").join("out.json");
        let err = JsonOutput::new(Some(missing.as_path())).write(&0).unwrap_err();
        assert!(err.to_string().contains("out.json"));
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(None).unwrap(), None);
        assert_eq!(
            timeout_from_secs(Some(1.5)).unwrap(),
            Some(Duration::from_millis(1500))
        );
        assert!(timeout_from_secs(Some(-1.0)).is_err());
        assert!(timeout_from_secs(Some(f64::NAN)).is_err());
    }
}
