use serde::{Deserialize, Serialize};

/// Normalized distribution of a query variable, in domain order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    variable: String,
    entries: Vec<(String, f64)>,
}

impl Posterior {
    pub fn new(variable: impl Into<String>, entries: Vec<(String, f64)>) -> Self {
        Self {
            variable: variable.into(),
            entries,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(label, probability)| (label.as_str(), *probability))
    }

    pub fn probability(&self, label: &str) -> Option<f64> {
        self.iter()
            .find(|(candidate, _)| *candidate == label)
            .map(|(_, probability)| probability)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, probability)| probability).sum()
    }

    /// Value with the highest probability; the first one wins ties.
    pub fn most_likely(&self) -> Option<(&str, f64)> {
        self.iter().fold(None, |best, (label, probability)| match best {
            Some((_, top)) if top >= probability => best,
            _ => Some((label, probability)),
        })
    }
}
