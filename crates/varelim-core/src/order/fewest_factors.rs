use super::{OrderingHeuristic, candidates};
use crate::evidence::Evidence;
use crate::factor::Factor;
use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;

/// Greedy look-ahead over factor scopes.
///
/// Starting from the leaf scopes, repeatedly picks the variable whose elimination leaves the
/// fewest factors in the working set, i.e. the one touched by the most factors. Ties go to the
/// variable whose merged scope is narrowest, then to declaration order. Only scopes are
/// simulated; no table values are computed, and the full order is still produced up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestFactors;

impl OrderingHeuristic for FewestFactors {
    fn name(&self) -> &'static str {
        "fewest-factors"
    }

    fn order(
        &self,
        network: &BayesianNetwork,
        query: VariableId,
        evidence: &Evidence,
    ) -> Vec<VariableId> {
        let mut scopes: Vec<Vec<VariableId>> = network
            .ids()
            .filter_map(|id| Factor::leaf_scope(network, id, evidence))
            .collect();
        let mut remaining: Vec<VariableId> = candidates(network, query, evidence).collect();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let Some((position, _)) = remaining
                .iter()
                .enumerate()
                .map(|(position, var)| (position, score(&scopes, *var)))
                .min_by_key(|(_, key)| *key)
            else {
                break;
            };
            let var = remaining.remove(position);
            scopes = eliminate(scopes, var);
            order.push(var);
        }
        order
    }
}

/// (factors left afterwards, merged scope width, declaration index); lower is better.
fn score(scopes: &[Vec<VariableId>], var: VariableId) -> (usize, usize, usize) {
    let touching = scopes.iter().filter(|scope| scope.contains(&var)).count();
    let remaining = if touching == 0 {
        scopes.len()
    } else {
        scopes.len() - touching + 1
    };
    (remaining, merged_scope(scopes, var).len(), var.index())
}

fn merged_scope(scopes: &[Vec<VariableId>], var: VariableId) -> Vec<VariableId> {
    let mut merged = Vec::new();
    for scope in scopes.iter().filter(|scope| scope.contains(&var)) {
        for member in scope {
            if *member != var && !merged.contains(member) {
                merged.push(*member);
            }
        }
    }
    merged
}

fn eliminate(scopes: Vec<Vec<VariableId>>, var: VariableId) -> Vec<Vec<VariableId>> {
    let merged = merged_scope(&scopes, var);
    let (touching, mut rest): (Vec<_>, Vec<_>) =
        scopes.into_iter().partition(|scope| scope.contains(&var));
    if !touching.is_empty() {
        rest.push(merged);
    }
    rest
}
