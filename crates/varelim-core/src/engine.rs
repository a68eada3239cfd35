//! Variable elimination driver.
//!
//! A run moves through four phases:
//! - collecting: one leaf factor per variable, observed roots skipped;
//! - ordering: the heuristic is asked once for the whole elimination sequence;
//! - eliminating: each variable in turn replaces the factors touching it with their merge;
//! - done: whatever remains is multiplied into a single factor over the query and normalized.
//!
//! The engine performs no I/O. Everything a presentation layer needs (the order and every merge)
//! is returned in [`Inference`].

use crate::evidence::{Evidence, EvidenceError};
use crate::factor::Factor;
use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;
use crate::order::{LeastIncoming, OrderingHeuristic};
use crate::posterior::Posterior;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

/// One merge performed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EliminationStep {
    /// Variable summed out, or `None` for the final collapse of the leftover factors.
    pub eliminated: Option<VariableId>,
    /// Scopes of the factors consumed by this step, in working-set order.
    pub merged: Vec<Vec<VariableId>>,
    /// Scope of the factor produced.
    pub result: Vec<VariableId>,
    /// Number of entries in the produced factor.
    pub result_size: usize,
}

/// Outcome of a run: the posterior plus the trace of how it was computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inference {
    pub query: VariableId,
    pub heuristic: &'static str,
    pub order: Vec<VariableId>,
    pub initial_factors: Vec<Vec<VariableId>>,
    pub steps: Vec<EliminationStep>,
    pub posterior: Posterior,
}

impl Inference {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Largest factor built during the run, in entries.
    pub fn peak_factor_size(&self) -> usize {
        self.steps
            .iter()
            .map(|step| step.result_size)
            .max()
            .unwrap_or(0)
    }
}

pub struct EliminationEngine<'a> {
    network: &'a BayesianNetwork,
    heuristic: Box<dyn OrderingHeuristic>,
}

impl<'a> EliminationEngine<'a> {
    /// Engine over `network` using the least-incoming order.
    pub fn new(network: &'a BayesianNetwork) -> Self {
        Self {
            network,
            heuristic: Box::new(LeastIncoming),
        }
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn OrderingHeuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Computes the posterior of `query` given `evidence`.
    pub fn run(&self, query: VariableId, evidence: &Evidence) -> Result<Inference, EngineError> {
        let network = self.network;
        let query_var = network
            .variable(query)
            .ok_or(EngineError::UnknownVariable { id: query })?;
        evidence.validate(network)?;
        if evidence.contains(query) {
            return Err(EngineError::ObservedQuery {
                query: query_var.name().to_string(),
            });
        }

        let mut factors = self.collect(evidence)?;
        let initial_factors = factors.iter().map(|f| f.scope().to_vec()).collect();

        let order = self.heuristic.order(network, query, evidence);
        log_order(network, self.heuristic.name(), &order);

        let mut steps = Vec::with_capacity(order.len() + 1);
        for &var in &order {
            let (touching, rest): (Vec<Factor>, Vec<Factor>) = factors
                .into_iter()
                .partition(|factor| factor.contains_variable(var));
            factors = rest;
            if touching.is_empty() {
                continue;
            }
            let merged = Factor::merge(&touching, Some(var));
            debug_assert!(merged.scope().iter().all(|v| !evidence.contains(*v)));
            log_step(network, Some(var), touching.len(), &merged);
            steps.push(step(Some(var), &touching, &merged));
            factors.push(merged);
        }

        let last = match factors.len() {
            1 => factors.remove(0),
            _ => {
                let merged = Factor::merge(&factors, None);
                log_step(network, None, factors.len(), &merged);
                steps.push(step(None, &factors, &merged));
                merged
            }
        };
        let posterior = last.to_answer(network, query)?;

        Ok(Inference {
            query,
            heuristic: self.heuristic.name(),
            order,
            initial_factors,
            steps,
            posterior,
        })
    }

    fn collect(&self, evidence: &Evidence) -> Result<Vec<Factor>, EngineError> {
        let mut factors = Vec::with_capacity(self.network.len());
        for id in self.network.ids() {
            if let Some(factor) = Factor::from_table(self.network, id, evidence)? {
                factors.push(factor);
            }
        }
        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "varelim_core::engine",
                Level::DEBUG,
                variables = self.network.len(),
                observed = evidence.len(),
                factors = factors.len(),
                "collected leaf factors"
            );
        }
        Ok(factors)
    }
}

/// Posterior of `query` under the default least-incoming order.
pub fn run_elimination(
    network: &BayesianNetwork,
    query: VariableId,
    evidence: &Evidence,
) -> Result<Posterior, EngineError> {
    EliminationEngine::new(network)
        .run(query, evidence)
        .map(|inference| inference.posterior)
}

fn step(eliminated: Option<VariableId>, inputs: &[Factor], merged: &Factor) -> EliminationStep {
    EliminationStep {
        eliminated,
        merged: inputs.iter().map(|f| f.scope().to_vec()).collect(),
        result: merged.scope().to_vec(),
        result_size: merged.size(),
    }
}

fn log_order(network: &BayesianNetwork, heuristic: &str, order: &[VariableId]) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let names = order
        .iter()
        .map(|id| network.name(*id))
        .collect::<Vec<_>>()
        .join(",");
    event!(
        target: "varelim_core::engine",
        Level::DEBUG,
        heuristic,
        length = order.len(),
        order = %names,
        "elimination order"
    );
}

fn log_step(network: &BayesianNetwork, eliminated: Option<VariableId>, inputs: usize, merged: &Factor) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let eliminated = eliminated.map_or("-", |id| network.name(id));
    event!(
        target: "varelim_core::engine",
        Level::DEBUG,
        eliminated,
        inputs,
        scope_width = merged.scope().len(),
        size = merged.size(),
        "merged factors"
    );
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("variable {id} is not part of the network")]
    UnknownVariable { id: VariableId },
    #[error("no probability table for variable '{variable}'")]
    MissingTable { variable: String },
    #[error("query variable '{query}' is observed")]
    ObservedQuery { query: String },
    #[error("evidence has probability zero; the posterior of '{query}' is undefined")]
    ImpossibleEvidence { query: String },
    #[error("final factor has scope {found:?}, expected {expected:?}")]
    ScopeMismatch {
        expected: Vec<VariableId>,
        found: Vec<VariableId>,
    },
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
}
