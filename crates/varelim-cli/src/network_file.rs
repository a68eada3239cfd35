//! YAML network definitions.
//!
//! Variables are declared in order and refer to their parents by name. A variable's
//! `probabilities` hold one row per parent combination with the first parent most significant.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use varelim_core::{
    BayesianNetwork, ConditionalProbabilityTable, NetworkError, TableError, Variable, VariableId,
};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NetworkFile {
    #[serde(default)]
    pub name: Option<String>,
    pub variables: Vec<VariableSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub values: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub parents: Vec<String>,
    /// Absent for a variable whose table is unknown; querying through it fails later.
    #[serde(default)]
    pub probabilities: Option<Vec<Vec<f64>>>,
}

impl NetworkFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NetworkFileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| NetworkFileError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_yaml(&text).map_err(|err| match err {
            NetworkFileError::Parse { source, .. } => NetworkFileError::Parse {
                source,
                path: Some(path.to_path_buf()),
            },
            other => other,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, NetworkFileError> {
        serde_yaml::from_str(text).map_err(|source| NetworkFileError::Parse { source, path: None })
    }

    /// Declared name, or `unnamed` when the file has none.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Resolves parent names and builds the validated network.
    pub fn build(&self) -> Result<BayesianNetwork, NetworkFileError> {
        let ids: HashMap<&str, VariableId> = self
            .variables
            .iter()
            .enumerate()
            .map(|(index, spec)| (spec.name.as_str(), VariableId::new(index)))
            .collect();

        let mut variables = Vec::with_capacity(self.variables.len());
        let mut tables = Vec::with_capacity(self.variables.len());
        for (index, spec) in self.variables.iter().enumerate() {
            let mut domain = Vec::with_capacity(spec.values.len());
            for value in &spec.values {
                let label = scalar_label(value).ok_or_else(|| NetworkFileError::BadLabel {
                    variable: spec.name.clone(),
                })?;
                domain.push(label);
            }
            let mut parents = Vec::with_capacity(spec.parents.len());
            for parent in &spec.parents {
                let id = ids
                    .get(parent.as_str())
                    .copied()
                    .ok_or_else(|| NetworkFileError::UnknownParent {
                        variable: spec.name.clone(),
                        parent: parent.clone(),
                    })?;
                parents.push(id);
            }
            if let Some(rows) = spec.probabilities.as_ref() {
                let table =
                    ConditionalProbabilityTable::from_rows(VariableId::new(index), rows.clone())
                        .map_err(|source| NetworkFileError::Table {
                            variable: spec.name.clone(),
                            source,
                        })?;
                tables.push(table);
            }
            variables.push(Variable::new(spec.name.clone(), domain).with_parents(parents));
        }

        Ok(BayesianNetwork::new(variables, tables)?)
    }
}

/// Reads, parses and validates a network definition.
pub fn load_network(path: impl AsRef<Path>) -> Result<BayesianNetwork, NetworkFileError> {
    let path = path.as_ref();
    let file = NetworkFile::from_path(path)?;
    let network = file.build()?;
    debug!(
        path = %path.display(),
        name = file.label(),
        variables = network.len(),
        tables = network.tables().count(),
        "loaded network"
    );
    Ok(network)
}

/// Text form of a YAML scalar; booleans become `True`/`False`.
pub fn scalar_label(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Bool(true) => Some("True".to_string()),
        serde_yaml::Value::Bool(false) => Some("False".to_string()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum NetworkFileError {
    #[error("failed to read network {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse network definition: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: Option<PathBuf>,
    },
    #[error("variable '{variable}' names unknown parent '{parent}'")]
    UnknownParent { variable: String, parent: String },
    #[error("variable '{variable}' has a value that is not a string, number or boolean")]
    BadLabel { variable: String },
    #[error("variable '{variable}': {source}")]
    Table {
        variable: String,
        #[source]
        source: TableError,
    },
    #[error(transparent)]
    Network(#[from] NetworkError),
}
