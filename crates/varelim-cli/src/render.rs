//! Console text for a query run. Every function builds a `String`; printing is left to the
//! caller.

use varelim_core::{BayesianNetwork, EliminationStep, Evidence, Inference, Posterior, VariableId};

const PRODUCT: &str = "·";

/// Variables with their domains, then every table with one line per parent combination.
pub fn network_listing(network: &BayesianNetwork) -> String {
    let mut out = String::from("The variables:\n");
    for (index, var) in network.variables().iter().enumerate() {
        out.push_str(&format!(
            "{}) {} - {}\n",
            index + 1,
            var.name(),
            var.domain().join(", ")
        ));
    }

    out.push_str("\nThe probabilities:\n");
    for id in network.ids() {
        let Some(var) = network.variable(id) else {
            continue;
        };
        let parents: Vec<&str> = var.parents().iter().map(|p| network.name(*p)).collect();
        let heading = match parents.as_slice() {
            [] => format!("{} has no parents.\n", var.name()),
            [parent] => format!("{} has parent {}\n", var.name(), parent),
            _ => format!("{} has parents {}\n", var.name(), parents.join(" and ")),
        };
        out.push_str(&heading);
        match network.table(id) {
            Some(table) => {
                for (row, probabilities) in table.rows().enumerate() {
                    let condition = parent_labels(network, var.parents(), row);
                    let values = probabilities
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    let line = if condition.is_empty() {
                        format!("[{values}]\n")
                    } else {
                        format!("{condition} -> [{values}]\n")
                    };
                    out.push_str(&line);
                }
            }
            None => out.push_str("(no table)\n"),
        }
        out.push('\n');
    }
    out
}

/// Parent assignment of table row `row`, first parent most significant.
fn parent_labels(network: &BayesianNetwork, parents: &[VariableId], row: usize) -> String {
    let mut rest = row;
    let mut labels = vec![String::new(); parents.len()];
    for (slot, parent) in parents.iter().enumerate().rev() {
        let cardinality = network.cardinality(*parent).max(1);
        let value = rest % cardinality;
        rest /= cardinality;
        let label = network
            .variable(*parent)
            .and_then(|var| var.value_label(value))
            .unwrap_or("?");
        labels[slot] = format!("{}={}", network.name(*parent), label);
    }
    labels.join(", ")
}

pub fn query_and_observed(
    network: &BayesianNetwork,
    query: VariableId,
    evidence: &Evidence,
) -> String {
    let mut out = format!("The queried variable is: {}\n", network.name(query));
    if !evidence.is_empty() {
        out.push_str("The observed variables are:\n");
        for (id, value) in evidence.iter() {
            out.push_str(&format!(
                "{} has the value {}\n",
                network.name(id),
                value_label(network, id, value)
            ));
        }
    }
    out
}

/// The joint distribution as the product of each variable's table, observed values filled in.
pub fn product_formula(network: &BayesianNetwork, evidence: &Evidence) -> String {
    let terms: Vec<String> = network
        .ids()
        .filter_map(|id| {
            let var = network.variable(id)?;
            let mut term = format!("P({}", observed_name(network, id, evidence));
            if !var.parents().is_empty() {
                let parents: Vec<String> = var
                    .parents()
                    .iter()
                    .map(|p| observed_name(network, *p, evidence))
                    .collect();
                term.push('|');
                term.push_str(&parents.join(","));
            }
            term.push(')');
            Some(term)
        })
        .collect();
    format!(
        "The reduced formula based on the network structure:\n{}\n",
        terms.join(PRODUCT)
    )
}

/// Product of factors, named `f1`, `f2`, ... in working-set order.
pub fn factor_formula(network: &BayesianNetwork, scopes: &[Vec<VariableId>]) -> String {
    scopes
        .iter()
        .enumerate()
        .map(|(index, scope)| factor_term(network, index, scope))
        .collect::<Vec<_>>()
        .join(PRODUCT)
}

fn factor_term(network: &BayesianNetwork, index: usize, scope: &[VariableId]) -> String {
    let names: Vec<&str> = scope.iter().map(|id| network.name(*id)).collect();
    format!("f{}({})", index + 1, names.join(","))
}

fn factor_lines(network: &BayesianNetwork, scopes: &[Vec<VariableId>]) -> String {
    scopes
        .iter()
        .enumerate()
        .map(|(index, scope)| format!("{}\n", factor_term(network, index, scope)))
        .collect()
}

pub fn elimination_order(
    network: &BayesianNetwork,
    heuristic: &str,
    order: &[VariableId],
) -> String {
    let mut out = format!("The elimination order, based on {heuristic}:\n");
    if order.is_empty() {
        out.push_str("(nothing to eliminate)\n");
    }
    for (position, id) in order.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", position + 1, network.name(*id)));
    }
    out
}

/// Describes one merge.
pub fn step(network: &BayesianNetwork, step: &EliminationStep) -> String {
    let mut out = match (step.eliminated, step.merged.len()) {
        (Some(var), 1) => format!(
            "The following factor is safely ignored after summing out {}:\n",
            network.name(var)
        ),
        (Some(var), _) => format!(
            "Merging the following factors by eliminating {}\n",
            network.name(var)
        ),
        (None, _) => String::from("Merging last remaining factors:\n"),
    };
    out.push_str(&factor_lines(network, &step.merged));
    out
}

/// Every merge of a run, each followed by the working set it leaves behind.
pub fn steps(network: &BayesianNetwork, inference: &Inference) -> String {
    let mut out = format!(
        "The formula of the reduced factors:\n{}\n",
        factor_formula(network, &inference.initial_factors)
    );
    let mut working = inference.initial_factors.clone();
    for merge in &inference.steps {
        match merge.eliminated {
            Some(var) => working.retain(|scope| !scope.contains(&var)),
            None => working.clear(),
        }
        working.push(merge.result.clone());
        out.push_str(&format!(
            "\n{}Formula after the merge:\n{}\n",
            step(network, merge),
            factor_formula(network, &working)
        ));
    }
    out
}

/// One `P(query=value) = p` line per domain value.
pub fn answer(posterior: &Posterior) -> String {
    posterior
        .iter()
        .map(|(label, probability)| {
            format!("P({}={}) = {:.6}\n", posterior.variable(), label, probability)
        })
        .collect()
}

fn observed_name(network: &BayesianNetwork, id: VariableId, evidence: &Evidence) -> String {
    match evidence.value(id) {
        Some(value) => format!("{}={}", network.name(id), value_label(network, id, value)),
        None => network.name(id).to_string(),
    }
}

fn value_label(network: &BayesianNetwork, id: VariableId, value: usize) -> &str {
    network
        .variable(id)
        .and_then(|var| var.value_label(value))
        .unwrap_or("?")
}
