//! Per-query observations.
//!
//! The network itself never changes between queries; a query's observed variables and their
//! values live here, so the same network can serve any number of independent queries.

use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    values: BTreeMap<VariableId, usize>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes `id` at the domain position `value`. A later observation of the same variable
    /// replaces the earlier one.
    pub fn observe(
        &mut self,
        network: &BayesianNetwork,
        id: VariableId,
        value: usize,
    ) -> Result<(), EvidenceError> {
        let var = network.variable(id).ok_or(EvidenceError::InvalidIndex {
            index: id.index(),
            count: network.len(),
        })?;
        if value >= var.cardinality() {
            return Err(EvidenceError::MalformedEvidence {
                variable: var.name().to_string(),
                value: value.to_string(),
            });
        }
        self.values.insert(id, value);
        Ok(())
    }

    /// Observes the variable called `name` at the value labelled `label`.
    pub fn observe_named(
        &mut self,
        network: &BayesianNetwork,
        name: &str,
        label: &str,
    ) -> Result<VariableId, EvidenceError> {
        let id = network
            .find(name)
            .ok_or_else(|| EvidenceError::UnknownVariable {
                name: name.to_string(),
            })?;
        self.observe_label(network, id, label)?;
        Ok(id)
    }

    /// Observes the variable at declaration position `index` at the value labelled `label`.
    pub fn observe_indexed(
        &mut self,
        network: &BayesianNetwork,
        index: usize,
        label: &str,
    ) -> Result<VariableId, EvidenceError> {
        let id = resolve_index(network, index)?;
        self.observe_label(network, id, label)?;
        Ok(id)
    }

    fn observe_label(
        &mut self,
        network: &BayesianNetwork,
        id: VariableId,
        label: &str,
    ) -> Result<(), EvidenceError> {
        let var = network.variable(id).ok_or(EvidenceError::InvalidIndex {
            index: id.index(),
            count: network.len(),
        })?;
        let value = var
            .value_index(label)
            .ok_or_else(|| EvidenceError::MalformedEvidence {
                variable: var.name().to_string(),
                value: label.to_string(),
            })?;
        self.values.insert(id, value);
        Ok(())
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.values.contains_key(&id)
    }

    /// Observed domain position of `id`, if it is observed.
    pub fn value(&self, id: VariableId) -> Option<usize> {
        self.values.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, usize)> + '_ {
        self.values.iter().map(|(id, value)| (*id, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Confirms every observation refers to a variable and value of `network`.
    pub fn validate(&self, network: &BayesianNetwork) -> Result<(), EvidenceError> {
        for (id, value) in self.iter() {
            let var = network.variable(id).ok_or(EvidenceError::InvalidIndex {
                index: id.index(),
                count: network.len(),
            })?;
            if value >= var.cardinality() {
                return Err(EvidenceError::MalformedEvidence {
                    variable: var.name().to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Resolves a declaration position to a variable id, rejecting out-of-range positions.
pub fn resolve_index(network: &BayesianNetwork, index: usize) -> Result<VariableId, EvidenceError> {
    if index < network.len() {
        Ok(VariableId::new(index))
    } else {
        Err(EvidenceError::InvalidIndex {
            index,
            count: network.len(),
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("index {index} is out of range; choose an index between 0 and {}", .count.saturating_sub(1))]
    InvalidIndex { index: usize, count: usize },
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },
    #[error("'{value}' is not a value of variable '{variable}'")]
    MalformedEvidence { variable: String, value: String },
}
