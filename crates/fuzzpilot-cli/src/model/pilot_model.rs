use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use fuzzpilot_evaluator::{network::FuzzyNetwork, schema::ChromosomeSchema};
use serde::{Deserialize, Serialize};

/// A trained chromosome together with the schema it was trained for.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PilotModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f64,
    pub centers_per_input: usize,
    pub genes: Vec<f64>,
}

impl PilotModel {
    pub fn schema(&self) -> ChromosomeSchema {
        ChromosomeSchema::with_centers(self.centers_per_input)
    }

    pub fn to_network(&self) -> anyhow::Result<Arc<FuzzyNetwork>> {
        let network = FuzzyNetwork::decode(&self.schema(), &self.genes).with_context(|| {
            format!(
                "Model {} does not match a schema with {} centers per input",
                self.name, self.centers_per_input
            )
        })?;
        Ok(Arc::new(network))
    }
}
