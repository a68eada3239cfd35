pub mod engine;
pub mod evidence;
pub mod factor;
pub mod model;
pub mod order;
pub mod posterior;

pub use engine::{EliminationEngine, EliminationStep, EngineError, Inference, run_elimination};
pub use evidence::{Evidence, EvidenceError};
pub use factor::Factor;
pub use model::network::{BayesianNetwork, NetworkError};
pub use model::table::{ConditionalProbabilityTable, TableError};
pub use model::variable::{Variable, VariableId};
pub use order::{FewestFactors, HeuristicKind, LeastIncoming, OrderingHeuristic, RandomOrder};
pub use posterior::Posterior;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "varelim"
    }

    pub const fn codename() -> &'static str {
        "Variable Elimination"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
