use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};
use varelim_core::evidence::resolve_index;
use varelim_core::{
    BayesianNetwork, EliminationEngine, EngineError, Evidence, HeuristicKind, Inference,
    VariableId,
};

use crate::config::QueryConfig;
use crate::input::{InputError, parse_indexed_evidence};
use crate::network_file::{NetworkFileError, load_network};
use crate::render;
use crate::report::{QueryReport, ReportError};

/// Loads a network and answers one query against it.
pub struct QueryRunner {
    config: QueryConfig,
    network: BayesianNetwork,
    query: VariableId,
    evidence: Evidence,
    seed: Option<u64>,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub inference: Inference,
    pub report: QueryReport,
    /// Console text, already assembled according to the output flags.
    pub text: String,
    pub json_path: Option<PathBuf>,
}

impl QueryRunner {
    /// Expects a configuration that has already passed [`QueryConfig::validate`].
    pub fn new(config: QueryConfig) -> Result<Self, RunnerError> {
        let network = load_network(&config.network)?;
        Self::with_network(config, network)
    }

    /// Like [`QueryRunner::new`] with the network already in memory.
    pub fn with_network(config: QueryConfig, network: BayesianNetwork) -> Result<Self, RunnerError> {
        let query = match (&config.query, config.query_index) {
            (Some(name), _) => network
                .find(name.trim())
                .ok_or_else(|| RunnerError::UnknownQuery { name: name.clone() })?,
            (None, Some(index)) => resolve_index(&network, index).map_err(InputError::from)?,
            (None, None) => return Err(RunnerError::Input(InputError::EmptyQuery)),
        };

        let mut evidence = Evidence::new();
        for (name, label) in config.evidence_labels() {
            evidence
                .observe_named(&network, &name, &label)
                .map_err(InputError::from)?;
        }
        if let Some(indexed) = config.evidence_indexed.as_deref() {
            parse_indexed_evidence(&network, indexed, &mut evidence)?;
        }

        let seed = match config.heuristic.kind {
            HeuristicKind::Random => Some(config.heuristic.seed.unwrap_or_else(rand::random)),
            _ => None,
        };

        Ok(Self {
            config,
            network,
            query,
            evidence,
            seed,
        })
    }

    pub fn network(&self) -> &BayesianNetwork {
        &self.network
    }

    pub fn query(&self) -> VariableId {
        self.query
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Seed of the random order, drawn once when the configuration leaves it open.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let kind = self.config.heuristic.kind;
        info!(
            run_id = %self.config.run_id,
            network = %self.config.network,
            query = self.network.name(self.query),
            observed = self.evidence.len(),
            heuristic = kind.as_str(),
            seed = ?self.seed,
            "starting query"
        );

        let engine =
            EliminationEngine::new(&self.network).with_heuristic(kind.build(self.seed));
        let inference = engine.run(self.query, &self.evidence).inspect_err(|err| {
            warn!(run_id = %self.config.run_id, error = %err, "query failed");
        })?;

        let report = QueryReport::new(
            &self.config.run_id,
            &self.config.network,
            &self.network,
            &self.evidence,
            &inference,
        );
        let json_path = self.config.resolved_json_output();
        if let Some(path) = json_path.as_ref() {
            report.write_json(path)?;
        }

        let most_likely = inference.posterior.most_likely().map(|(label, _)| label);
        info!(
            run_id = %self.config.run_id,
            most_likely = most_likely.unwrap_or("-"),
            eliminated = inference.order.len(),
            steps = inference.steps.len(),
            peak_factor_size = inference.peak_factor_size(),
            "query answered"
        );

        Ok(RunSummary {
            text: self.render(&inference),
            inference,
            report,
            json_path,
        })
    }

    fn render(&self, inference: &Inference) -> String {
        let output = &self.config.output;
        let mut text = String::new();
        if output.show_network {
            text.push_str(&render::network_listing(&self.network));
            text.push('\n');
        }
        text.push_str(&render::query_and_observed(
            &self.network,
            self.query,
            &self.evidence,
        ));
        if output.show_steps {
            text.push('\n');
            text.push_str(&render::product_formula(&self.network, &self.evidence));
            text.push('\n');
            text.push_str(&render::elimination_order(
                &self.network,
                inference.heuristic,
                &inference.order,
            ));
            text.push('\n');
            text.push_str(&render::steps(&self.network, inference));
        }
        text.push('\n');
        text.push_str(&render::answer(&inference.posterior));
        text
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Network(#[from] NetworkFileError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("query variable '{name}' is not in the network")]
    UnknownQuery { name: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_file::NetworkFile;

    const SPRINKLER: &str = r#"
variables:
  - name: Cloudy
    values: [True, False]
    probabilities:
      - [0.5, 0.5]
  - name: Sprinkler
    values: [True, False]
    parents: [Cloudy]
    probabilities:
      - [0.1, 0.9]
      - [0.5, 0.5]
  - name: Rain
    values: [True, False]
    parents: [Cloudy]
    probabilities:
      - [0.8, 0.2]
      - [0.2, 0.8]
  - name: WetGrass
    values: [True, False]
    parents: [Sprinkler, Rain]
    probabilities:
      - [0.99, 0.01]
      - [0.9, 0.1]
      - [0.9, 0.1]
      - [0.0, 1.0]
"#;

    fn network() -> BayesianNetwork {
        NetworkFile::from_yaml(SPRINKLER).unwrap().build().unwrap()
    }

    fn config(yaml: &str) -> QueryConfig {
        let mut cfg: QueryConfig = serde_yaml::from_str(yaml).unwrap();
        cfg.validate().unwrap();
        cfg
    }

    #[test]
    fn answers_named_query_with_yaml_evidence() {
        let cfg = config("network: sprinkler.yaml\nquery: Rain\nevidence:\n  WetGrass: True\n");
        let runner = QueryRunner::with_network(cfg, network()).unwrap();
        let summary = runner.run().unwrap();

        // P(Rain=T | WetGrass=T) for the classic sprinkler network.
        let rain = summary.inference.posterior.probability("True").unwrap();
        assert!((rain - 0.7079276773).abs() < 1e-6, "got {rain}");
        assert!(summary.text.contains("WetGrass has the value True"));
        assert!(summary.text.contains("P(Rain=True) = 0.707928"));
        assert!(summary.json_path.is_none());
        assert_eq!(summary.report.query, "Rain");
    }

    #[test]
    fn indexed_query_and_evidence() {
        let cfg = config(
            "network: sprinkler.yaml\nquery_index: 0\nevidence_indexed: \"1,True;3,True\"\noutput:\n  show_steps: true\n",
        );
        let runner = QueryRunner::with_network(cfg, network()).unwrap();
        assert_eq!(runner.query(), VariableId::new(0));
        assert_eq!(runner.evidence().len(), 2);
        let summary = runner.run().unwrap();
        assert!(summary.text.contains("The elimination order, based on least-incoming:\n1. Rain\n"));
        assert!((summary.inference.posterior.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn random_order_gets_a_seed() {
        let cfg = config("network: s.yaml\nquery: Rain\nheuristic:\n  kind: random\n");
        let runner = QueryRunner::with_network(cfg, network()).unwrap();
        assert!(runner.seed().is_some());

        let cfg = config("network: s.yaml\nquery: Rain\nheuristic:\n  kind: random\n  seed: 11\n");
        let runner = QueryRunner::with_network(cfg, network()).unwrap();
        assert_eq!(runner.seed(), Some(11));
        assert_eq!(runner.run().unwrap().inference.heuristic, "random");
    }

    #[test]
    fn unknown_query_is_reported() {
        let cfg = config("network: s.yaml\nquery: Fog\n");
        let err = QueryRunner::with_network(cfg, network()).err().unwrap();
        assert!(matches!(err, RunnerError::UnknownQuery { .. }));
    }

    #[test]
    fn bad_evidence_value_is_reported() {
        let cfg = config("network: s.yaml\nquery: Rain\nevidence:\n  Cloudy: Maybe\n");
        let err = QueryRunner::with_network(cfg, network()).err().unwrap();
        assert!(matches!(err, RunnerError::Input(InputError::Evidence(_))));
    }

    #[test]
    fn observed_query_fails_the_run() {
        let cfg = config("network: s.yaml\nquery: Rain\nevidence:\n  Rain: False\n");
        let runner = QueryRunner::with_network(cfg, network()).unwrap();
        assert!(matches!(
            runner.run(),
            Err(RunnerError::Engine(EngineError::ObservedQuery { .. }))
        ));
    }
}
