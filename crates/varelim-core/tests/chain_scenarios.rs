use varelim_core::{
    BayesianNetwork, ConditionalProbabilityTable, EliminationEngine, EngineError, Evidence,
    Variable, VariableId, run_elimination,
};

const TOLERANCE: f64 = 1e-9;

fn id(index: usize) -> VariableId {
    VariableId::new(index)
}

/// A -> B -> C over {True, False}.
fn chain() -> BayesianNetwork {
    let domain = ["True", "False"];
    BayesianNetwork::new(
        vec![
            Variable::new("A", domain),
            Variable::new("B", domain).with_parents([id(0)]),
            Variable::new("C", domain).with_parents([id(1)]),
        ],
        vec![
            ConditionalProbabilityTable::from_rows(id(0), vec![vec![0.6, 0.4]]).unwrap(),
            ConditionalProbabilityTable::from_rows(id(1), vec![vec![0.8, 0.2], vec![0.3, 0.7]])
                .unwrap(),
            ConditionalProbabilityTable::from_rows(id(2), vec![vec![0.9, 0.1], vec![0.2, 0.8]])
                .unwrap(),
        ],
    )
    .expect("chain network is valid")
}

#[test]
fn marginal_of_chain_tail_matches_manual_summation() {
    let network = chain();
    let posterior = run_elimination(&network, id(2), &Evidence::new()).expect("runs");

    let mut manual = 0.0;
    for (p_a, p_b_given_a) in [(0.6, 0.8), (0.4, 0.3)] {
        for (p_b, p_c_given_b) in [(p_b_given_a, 0.9), (1.0 - p_b_given_a, 0.2)] {
            manual += p_a * p_b * p_c_given_b;
        }
    }

    let got = posterior.probability("True").unwrap();
    assert!((got - manual).abs() < TOLERANCE, "got {got}, manual {manual}");
    assert!((got - 0.62).abs() < TOLERANCE);
    assert!((posterior.total() - 1.0).abs() < TOLERANCE);
}

#[test]
fn conditioning_on_chain_head() {
    let network = chain();
    let mut evidence = Evidence::new();
    evidence.observe_named(&network, "A", "True").unwrap();
    let inference = EliminationEngine::new(&network)
        .run(id(2), &evidence)
        .expect("runs");

    let manual = 0.8 * 0.9 + 0.2 * 0.2;
    let got = inference.posterior.probability("True").unwrap();
    assert!((got - manual).abs() < TOLERANCE, "got {got}, manual {manual}");
    assert!((got - 0.76).abs() < TOLERANCE);
    // Observed root A contributes no factor and is never eliminated.
    assert_eq!(inference.initial_factors.len(), 2);
    assert_eq!(inference.order, vec![id(1)]);
}

#[test]
fn isolated_variable_returns_its_own_table() {
    let network = BayesianNetwork::new(
        vec![Variable::new("Coin", ["Heads", "Tails", "Edge"])],
        vec![ConditionalProbabilityTable::from_rows(id(0), vec![vec![0.45, 0.5, 0.05]]).unwrap()],
    )
    .unwrap();
    let inference = EliminationEngine::new(&network)
        .run(id(0), &Evidence::new())
        .unwrap();
    assert!(inference.order.is_empty());
    assert!(inference.steps.is_empty());
    for ((_, got), expected) in inference.posterior.iter().zip([0.45, 0.5, 0.05]) {
        assert!((got - expected).abs() < 1e-12);
    }
}

#[test]
fn diagnostic_reasoning_up_the_chain() {
    // P(A=T | C=T) = P(A=T) P(C=T|A=T) / P(C=T) = 0.6 * 0.76 / 0.62
    let network = chain();
    let mut evidence = Evidence::new();
    evidence.observe_named(&network, "C", "True").unwrap();
    let posterior = run_elimination(&network, id(0), &evidence).unwrap();
    let expected = 0.6 * 0.76 / 0.62;
    assert!((posterior.probability("True").unwrap() - expected).abs() < TOLERANCE);
}

#[test]
fn middle_variable_with_both_neighbours_observed() {
    // P(B | A=F, C=F) ∝ P(B|A=F) P(C=F|B)
    let network = chain();
    let mut evidence = Evidence::new();
    evidence.observe_named(&network, "A", "False").unwrap();
    evidence.observe_named(&network, "C", "False").unwrap();
    let posterior = run_elimination(&network, id(1), &evidence).unwrap();
    let t = 0.3 * 0.1;
    let f = 0.7 * 0.8;
    assert!((posterior.probability("True").unwrap() - t / (t + f)).abs() < TOLERANCE);
}

#[test]
fn query_that_is_observed_is_rejected() {
    let network = chain();
    let mut evidence = Evidence::new();
    evidence.observe_named(&network, "C", "True").unwrap();
    let err = run_elimination(&network, id(2), &evidence).unwrap_err();
    assert!(matches!(err, EngineError::ObservedQuery { .. }));
}
