use core::fmt;
use serde::{Deserialize, Serialize};

/// Stable index of a variable in its network's declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(usize);

impl VariableId {
    pub const fn new(index: usize) -> Self {
        VariableId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A discrete network node: a name, an ordered domain and the parents its table is conditioned on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    domain: Vec<String>,
    #[serde(default)]
    parents: Vec<VariableId>,
}

impl Variable {
    pub fn new<N, I, S>(name: N, domain: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            domain: domain.into_iter().map(Into::into).collect(),
            parents: Vec::new(),
        }
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = VariableId>) -> Self {
        self.parents = parents.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Number of values in the domain.
    pub fn cardinality(&self) -> usize {
        self.domain.len()
    }

    pub fn parents(&self) -> &[VariableId] {
        &self.parents
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Position of `label` within the domain, if it is one of the declared values.
    pub fn value_index(&self, label: &str) -> Option<usize> {
        self.domain.iter().position(|value| value == label)
    }

    pub fn value_label(&self, index: usize) -> Option<&str> {
        self.domain.get(index).map(String::as_str)
    }

    pub fn is_value_of(&self, label: &str) -> bool {
        self.value_index(label).is_some()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
