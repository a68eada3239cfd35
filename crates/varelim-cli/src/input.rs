//! Text forms accepted for evidence and the heuristic choice.

use thiserror::Error;
use varelim_core::order::ParseHeuristicError;
use varelim_core::{BayesianNetwork, Evidence, EvidenceError, HeuristicKind, VariableId};

/// Applies observations written as `index,value` pairs separated by `;`, for example
/// `2,True;3,False`. An empty string observes nothing.
pub fn parse_indexed_evidence(
    network: &BayesianNetwork,
    raw: &str,
    evidence: &mut Evidence,
) -> Result<Vec<VariableId>, InputError> {
    let mut observed = Vec::new();
    for pair in raw.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (index, value) = pair.split_once(',').ok_or_else(|| InputError::MissingComma {
            input: pair.to_string(),
        })?;
        let index = index.trim();
        let index = index.parse::<usize>().map_err(|_| InputError::NotANumber {
            input: index.to_string(),
        })?;
        observed.push(evidence.observe_indexed(network, index, value.trim())?);
    }
    Ok(observed)
}

/// Splits `NAME=VALUE` into its trimmed halves.
pub fn split_assignment(raw: &str) -> Result<(&str, &str), InputError> {
    let (name, value) = raw.split_once('=').ok_or_else(|| InputError::MissingEquals {
        input: raw.to_string(),
    })?;
    Ok((name.trim(), value.trim()))
}

/// Heuristic menu choice: `1`, `2`, a name, or empty for the random order.
pub fn parse_heuristic(raw: &str) -> Result<HeuristicKind, InputError> {
    Ok(raw.parse()?)
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("no query variable was chosen")]
    EmptyQuery,
    #[error("'{input}' is not a number")]
    NotANumber { input: String },
    #[error("'{input}' has no comma between the index and the value")]
    MissingComma { input: String },
    #[error("'{input}' is not of the form NAME=VALUE")]
    MissingEquals { input: String },
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error(transparent)]
    Heuristic(#[from] ParseHeuristicError),
}
