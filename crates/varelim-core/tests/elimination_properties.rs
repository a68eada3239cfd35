use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use varelim_core::{
    BayesianNetwork, ConditionalProbabilityTable, EliminationEngine, Evidence, Factor,
    FewestFactors, HeuristicKind, Inference, LeastIncoming, OrderingHeuristic, RandomOrder,
    Variable, VariableId,
};

const TOLERANCE: f64 = 1e-9;

fn random_row(rng: &mut SmallRng, cardinality: usize) -> Vec<f64> {
    let weights: Vec<f64> = (0..cardinality).map(|_| rng.gen_range(0.05..1.0)).collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| w / total).collect()
}

/// Random DAG: each variable draws up to two parents among the ones declared before it.
fn random_network(rng: &mut SmallRng, size: usize) -> BayesianNetwork {
    let mut variables: Vec<Variable> = Vec::with_capacity(size);
    let mut tables = Vec::with_capacity(size);
    for index in 0..size {
        let cardinality = rng.gen_range(2..=3);
        let parent_count = rng.gen_range(0..=index.min(2));
        let mut parents: Vec<usize> = (0..index).collect();
        parents.shuffle(rng);
        parents.truncate(parent_count);

        let row_count: usize = parents.iter().map(|p| variables[*p].cardinality()).product();
        let rows = (0..row_count)
            .map(|_| random_row(rng, cardinality))
            .collect();
        tables.push(ConditionalProbabilityTable::from_rows(VariableId::new(index), rows).unwrap());
        variables.push(
            Variable::new(
                format!("V{index}"),
                (0..cardinality).map(|value| format!("v{value}")),
            )
            .with_parents(parents.into_iter().map(VariableId::new)),
        );
    }
    BayesianNetwork::new(variables, tables).expect("random DAG is valid")
}

fn random_evidence(rng: &mut SmallRng, network: &BayesianNetwork, query: VariableId) -> Evidence {
    let mut evidence = Evidence::new();
    let observed = rng.gen_range(0..=2);
    let mut ids: Vec<VariableId> = network.ids().filter(|id| *id != query).collect();
    ids.shuffle(rng);
    for id in ids.into_iter().take(observed) {
        let value = rng.gen_range(0..network.cardinality(id));
        evidence.observe(network, id, value).unwrap();
    }
    evidence
}

/// Posterior by summing the full joint distribution.
fn brute_force(network: &BayesianNetwork, query: VariableId, evidence: &Evidence) -> Vec<f64> {
    let cards: Vec<usize> = network.variables().iter().map(Variable::cardinality).collect();
    let total: usize = cards.iter().product();
    let mut assignment = vec![0usize; cards.len()];
    let mut mass = vec![0.0; cards[query.index()]];

    for _ in 0..total {
        if evidence
            .iter()
            .all(|(id, value)| assignment[id.index()] == value)
        {
            let mut joint = 1.0;
            for id in network.ids() {
                let var = network.variable(id).unwrap();
                let parent_values: Vec<usize> =
                    var.parents().iter().map(|p| assignment[p.index()]).collect();
                let row = network.row_index(id, &parent_values);
                joint *= network.table(id).unwrap().probability(row, assignment[id.index()]);
            }
            mass[assignment[query.index()]] += joint;
        }
        for axis in (0..assignment.len()).rev() {
            assignment[axis] += 1;
            if assignment[axis] < cards[axis] {
                break;
            }
            assignment[axis] = 0;
        }
    }

    let sum: f64 = mass.iter().sum();
    mass.iter().map(|m| m / sum).collect()
}

fn run(
    network: &BayesianNetwork,
    heuristic: Box<dyn OrderingHeuristic>,
    query: VariableId,
    evidence: &Evidence,
) -> Inference {
    EliminationEngine::new(network)
        .with_heuristic(heuristic)
        .run(query, evidence)
        .expect("elimination succeeds")
}

#[test]
fn posteriors_match_full_joint_and_sum_to_one() {
    let mut rng = SmallRng::seed_from_u64(2024);
    for _ in 0..40 {
        let size = rng.gen_range(1..=7);
        let network = random_network(&mut rng, size);
        let query = VariableId::new(rng.gen_range(0..size));
        let evidence = random_evidence(&mut rng, &network, query);

        let inference = run(&network, Box::new(LeastIncoming), query, &evidence);
        let expected = brute_force(&network, query, &evidence);

        assert!((inference.posterior.total() - 1.0).abs() < TOLERANCE);
        for ((_, got), want) in inference.posterior.iter().zip(&expected) {
            assert!((got - want).abs() < TOLERANCE, "got {got}, want {want}");
        }
    }
}

#[test]
fn answer_does_not_depend_on_order() {
    let mut rng = SmallRng::seed_from_u64(77);
    for round in 0..25 {
        let network = random_network(&mut rng, 6);
        let query = VariableId::new(rng.gen_range(0..6));
        let evidence = random_evidence(&mut rng, &network, query);

        let base = run(&network, Box::new(LeastIncoming), query, &evidence);
        let heuristics: Vec<Box<dyn OrderingHeuristic>> = vec![
            Box::new(FewestFactors),
            Box::new(RandomOrder::new(round)),
            Box::new(RandomOrder::new(round + 1000)),
        ];
        for heuristic in heuristics {
            let other = run(&network, heuristic, query, &evidence);
            let mut sorted = other.order.clone();
            sorted.sort();
            let mut base_sorted = base.order.clone();
            base_sorted.sort();
            assert_eq!(sorted, base_sorted, "orders cover the same variables");
            for ((_, a), (_, b)) in base.posterior.iter().zip(other.posterior.iter()) {
                assert!((a - b).abs() < TOLERANCE);
            }
        }
    }
}

#[test]
fn observed_variables_never_enter_a_scope() {
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..25 {
        let network = random_network(&mut rng, 7);
        let query = VariableId::new(rng.gen_range(0..7));
        let evidence = random_evidence(&mut rng, &network, query);

        for kind in HeuristicKind::ALL {
            let inference = run(&network, kind.build(Some(9)), query, &evidence);
            let scopes = inference
                .initial_factors
                .iter()
                .chain(inference.steps.iter().flat_map(|s| s.merged.iter()))
                .chain(inference.steps.iter().map(|s| &s.result));
            for scope in scopes {
                assert!(scope.iter().all(|id| !evidence.contains(*id)));
            }
            assert!(inference.order.iter().all(|id| !evidence.contains(*id)));
            assert!(!inference.order.contains(&query));
        }
    }
}

#[test]
fn initial_working_set_skips_observed_roots_only() {
    let mut rng = SmallRng::seed_from_u64(31);
    for _ in 0..20 {
        let network = random_network(&mut rng, 6);
        let query = VariableId::new(rng.gen_range(0..6));
        let evidence = random_evidence(&mut rng, &network, query);
        let expected = network
            .ids()
            .filter(|id| {
                !evidence.contains(*id) || network.variable(*id).unwrap().parent_count() > 0
            })
            .count();
        let inference = run(&network, Box::new(LeastIncoming), query, &evidence);
        assert_eq!(inference.initial_factors.len(), expected);
    }
}

fn distinct_variables(working: &[Vec<VariableId>]) -> BTreeSet<VariableId> {
    working.iter().flatten().copied().collect()
}

#[test]
fn each_step_removes_one_variable_from_the_working_set() {
    let mut rng = SmallRng::seed_from_u64(404);
    for _ in 0..20 {
        let network = random_network(&mut rng, 7);
        let query = VariableId::new(rng.gen_range(0..7));
        let mut evidence = random_evidence(&mut rng, &network, query);
        if evidence.is_empty() {
            let observed = VariableId::new((query.index() + 1) % 7);
            evidence.observe(&network, observed, 0).unwrap();
        }

        for kind in HeuristicKind::ALL {
            let inference = run(&network, kind.build(Some(17)), query, &evidence);
            let mut working = inference.initial_factors.clone();
            let mut eliminated = Vec::new();

            for step in &inference.steps {
                let before = working.len();
                let variables_before = distinct_variables(&working);
                let (touching, rest): (Vec<_>, Vec<_>) = match step.eliminated {
                    Some(var) => working.into_iter().partition(|scope| scope.contains(&var)),
                    None => (working, Vec::new()),
                };
                assert_eq!(touching, step.merged, "{kind}: merged factors are the touching ones");
                working = rest;
                working.push(step.result.clone());
                assert_eq!(working.len(), before - step.merged.len() + 1, "{kind}");

                let variables_after = distinct_variables(&working);
                match step.eliminated {
                    Some(var) => {
                        eliminated.push(var);
                        assert!(variables_before.contains(&var));
                        assert!(!variables_after.contains(&var));
                        assert_eq!(variables_after.len(), variables_before.len() - 1, "{kind}");
                    }
                    None => assert_eq!(variables_after, variables_before, "{kind}"),
                }
            }

            assert_eq!(eliminated, inference.order, "{kind}: one step per ordered variable");
            assert_eq!(working, vec![vec![query]], "{kind}");
        }
    }
}

#[test]
fn merge_is_commutative_and_associative() {
    let mut rng = SmallRng::seed_from_u64(8);
    let ids: Vec<VariableId> = (0..4).map(VariableId::new).collect();
    let cards = [2usize, 3, 2, 2];
    let mut factor = |scope: &[usize]| {
        let cardinalities: Vec<usize> = scope.iter().map(|i| cards[*i]).collect();
        let size: usize = cardinalities.iter().product();
        let values = (0..size).map(|_| rng.gen_range(0.0..1.0)).collect();
        Factor::new(scope.iter().map(|i| ids[*i]).collect(), cardinalities, values).unwrap()
    };
    let f1 = factor(&[0, 1]);
    let f2 = factor(&[1, 2]);
    let f3 = factor(&[2, 0, 3]);
    let eliminate = Some(ids[1]);

    let flat = Factor::merge(&[f1.clone(), f2.clone(), f3.clone()], eliminate);
    let permuted = Factor::merge(&[f2.clone(), f3.clone(), f1.clone()], eliminate);
    let grouped = Factor::merge(&[Factor::merge(&[f3, f1], None), f2], eliminate);

    assert_eq!(flat.scope().len(), 3);
    for a in 0..cards[0] {
        for c in 0..cards[2] {
            for d in 0..cards[3] {
                let assignment = [(ids[0], a), (ids[2], c), (ids[3], d)];
                let x = flat.value_of(&assignment).unwrap();
                let y = permuted.value_of(&assignment).unwrap();
                let z = grouped.value_of(&assignment).unwrap();
                assert!((x - y).abs() < 1e-12);
                assert!((x - z).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn default_order_is_reproducible_and_breaks_ties_by_declaration() {
    let domain = ["t", "f"];
    let uniform = |index: usize, rows: usize| {
        ConditionalProbabilityTable::from_rows(VariableId::new(index), vec![vec![0.5, 0.5]; rows])
            .unwrap()
    };
    // R1 and R2 are roots; M and N have one parent each; Q (query) has two.
    let network = BayesianNetwork::new(
        vec![
            Variable::new("M", domain).with_parents([VariableId::new(2)]),
            Variable::new("R2", domain),
            Variable::new("R1", domain),
            Variable::new("N", domain).with_parents([VariableId::new(1)]),
            Variable::new("Q", domain).with_parents([VariableId::new(0), VariableId::new(3)]),
        ],
        vec![uniform(0, 2), uniform(1, 1), uniform(2, 1), uniform(3, 2), uniform(4, 4)],
    )
    .unwrap();

    let query = VariableId::new(4);
    let first = run(&network, Box::new(LeastIncoming), query, &Evidence::new());
    let second = run(&network, Box::new(LeastIncoming), query, &Evidence::new());
    assert_eq!(first.order, second.order);
    assert_eq!(
        first.order,
        [1, 2, 0, 3].map(VariableId::new).to_vec(),
        "roots first in declaration order, then single-parent variables"
    );
    assert_eq!(
        serde_json::to_string(&first.order).unwrap(),
        serde_json::to_string(&second.order).unwrap()
    );
}
