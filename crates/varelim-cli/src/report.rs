use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use varelim_core::{BayesianNetwork, Evidence, Inference, VariableId};

/// JSON form of a finished query, with every variable written by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub run_id: String,
    pub network: String,
    pub query: String,
    pub evidence: Vec<Observation>,
    pub heuristic: String,
    pub order: Vec<String>,
    pub initial_factors: Vec<Vec<String>>,
    pub steps: Vec<StepReport>,
    pub peak_factor_size: usize,
    pub posterior: Vec<Probability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub variable: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub eliminated: Option<String>,
    pub merged: Vec<Vec<String>>,
    pub result: Vec<String>,
    pub result_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probability {
    pub value: String,
    pub probability: f64,
}

impl QueryReport {
    pub fn new(
        run_id: &str,
        network_path: &str,
        network: &BayesianNetwork,
        evidence: &Evidence,
        inference: &Inference,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            network: network_path.to_string(),
            query: network.name(inference.query).to_string(),
            evidence: evidence
                .iter()
                .map(|(id, value)| Observation {
                    variable: network.name(id).to_string(),
                    value: network
                        .variable(id)
                        .and_then(|var| var.value_label(value))
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect(),
            heuristic: inference.heuristic.to_string(),
            order: names(network, &inference.order),
            initial_factors: inference
                .initial_factors
                .iter()
                .map(|scope| names(network, scope))
                .collect(),
            steps: inference
                .steps
                .iter()
                .map(|step| StepReport {
                    eliminated: step.eliminated.map(|id| network.name(id).to_string()),
                    merged: step
                        .merged
                        .iter()
                        .map(|scope| names(network, scope))
                        .collect(),
                    result: names(network, &step.result),
                    result_size: step.result_size,
                })
                .collect(),
            peak_factor_size: inference.peak_factor_size(),
            posterior: inference
                .posterior
                .iter()
                .map(|(value, probability)| Probability {
                    value: value.to_string(),
                    probability,
                })
                .collect(),
        }
    }

    /// Writes the report as pretty JSON, creating the parent directory when needed.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| ReportError::Io {
                context: "creating report directory",
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| ReportError::Io {
            context: "creating report file",
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|source| ReportError::Io {
                context: "writing report file",
                source,
            })?;
        Ok(())
    }
}

fn names(network: &BayesianNetwork, scope: &[VariableId]) -> Vec<String> {
    scope.iter().map(|id| network.name(*id).to_string()).collect()
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}
