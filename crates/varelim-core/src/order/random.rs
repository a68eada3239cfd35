use super::{OrderingHeuristic, candidates};
use crate::evidence::Evidence;
use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// Shuffles the eligible variables with a seeded generator, so a seed always gives the same order.
#[derive(Debug, Clone, Copy)]
pub struct RandomOrder {
    seed: u64,
}

impl RandomOrder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl OrderingHeuristic for RandomOrder {
    fn name(&self) -> &'static str {
        "random"
    }

    fn order(
        &self,
        network: &BayesianNetwork,
        query: VariableId,
        evidence: &Evidence,
    ) -> Vec<VariableId> {
        let mut order: Vec<VariableId> = candidates(network, query, evidence).collect();
        let mut rng = SmallRng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);
        order
    }
}
