use super::{OrderingHeuristic, candidates};
use crate::evidence::Evidence;
use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;

/// Eliminates variables with the fewest parents first; ties keep declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastIncoming;

impl OrderingHeuristic for LeastIncoming {
    fn name(&self) -> &'static str {
        "least-incoming"
    }

    fn order(
        &self,
        network: &BayesianNetwork,
        query: VariableId,
        evidence: &Evidence,
    ) -> Vec<VariableId> {
        let mut order: Vec<VariableId> = candidates(network, query, evidence).collect();
        order.sort_by_key(|id| (network.variables()[id.index()].parent_count(), id.index()));
        order
    }
}
