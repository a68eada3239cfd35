//! Elimination-order policies.
//!
//! The order never changes the posterior a query produces; it only changes how large the
//! intermediate factors grow, and so how long elimination takes.

mod fewest_factors;
mod least_incoming;
mod random;

pub use fewest_factors::FewestFactors;
pub use least_incoming::LeastIncoming;
pub use random::RandomOrder;

use crate::evidence::Evidence;
use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Produces the sequence in which variables are summed out.
pub trait OrderingHeuristic: Send + Sync {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Every variable that is neither `query` nor observed, each exactly once.
    fn order(
        &self,
        network: &BayesianNetwork,
        query: VariableId,
        evidence: &Evidence,
    ) -> Vec<VariableId>;
}

/// Variables eligible for elimination, in declaration order.
pub(crate) fn candidates<'a>(
    network: &'a BayesianNetwork,
    query: VariableId,
    evidence: &'a Evidence,
) -> impl Iterator<Item = VariableId> + 'a {
    network
        .ids()
        .filter(move |id| *id != query && !evidence.contains(*id))
}

/// Selectable heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicKind {
    #[default]
    LeastIncoming,
    FewestFactors,
    Random,
}

impl HeuristicKind {
    pub const ALL: [HeuristicKind; 3] = [
        HeuristicKind::LeastIncoming,
        HeuristicKind::FewestFactors,
        HeuristicKind::Random,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            HeuristicKind::LeastIncoming => "least-incoming",
            HeuristicKind::FewestFactors => "fewest-factors",
            HeuristicKind::Random => "random",
        }
    }

    /// Instantiates the policy. `seed` only matters for [`HeuristicKind::Random`].
    pub fn build(self, seed: Option<u64>) -> Box<dyn OrderingHeuristic> {
        match self {
            HeuristicKind::LeastIncoming => Box::new(LeastIncoming),
            HeuristicKind::FewestFactors => Box::new(FewestFactors),
            HeuristicKind::Random => Box::new(RandomOrder::new(seed.unwrap_or_default())),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeuristicKind {
    type Err = ParseHeuristicError;

    /// Accepts the names as well as the numeric menu choices `1` and `2`; an empty choice
    /// selects the random order.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "least-incoming" | "least_incoming" => Ok(HeuristicKind::LeastIncoming),
            "2" | "fewest-factors" | "fewest_factors" => Ok(HeuristicKind::FewestFactors),
            "" | "random" => Ok(HeuristicKind::Random),
            _ => Err(ParseHeuristicError {
                input: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("'{input}' is not a heuristic; use 1 (least-incoming), 2 (fewest-factors) or random")]
pub struct ParseHeuristicError {
    pub input: String,
}
