//! Conditional probability tables.
//!
//! A table is stored flat: one row per parent-value combination (parents in declaration order,
//! first parent most significant) and one column per value of the owning variable.

use super::variable::VariableId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum deviation from 1 tolerated when checking that a row is a distribution.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalProbabilityTable {
    variable: VariableId,
    cardinality: usize,
    values: Vec<f64>,
}

impl ConditionalProbabilityTable {
    /// Builds a table from explicit rows, checking every row is a probability distribution.
    pub fn from_rows(variable: VariableId, rows: Vec<Vec<f64>>) -> Result<Self, TableError> {
        let Some(first) = rows.first() else {
            return Err(TableError::Empty { variable });
        };
        let cardinality = first.len();
        if cardinality == 0 {
            return Err(TableError::Empty { variable });
        }

        let mut values = Vec::with_capacity(cardinality * rows.len());
        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != cardinality {
                return Err(TableError::RaggedRow {
                    variable,
                    row: row_index,
                    expected: cardinality,
                    found: row.len(),
                });
            }
            check_row(variable, row_index, &row)?;
            values.extend(row);
        }

        Ok(Self {
            variable,
            cardinality,
            values,
        })
    }

    /// Variable whose distribution this table holds.
    pub fn variable(&self) -> VariableId {
        self.variable
    }

    /// Width of every row: the owning variable's domain size.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn row_count(&self) -> usize {
        self.values.len() / self.cardinality
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let start = row.checked_mul(self.cardinality)?;
        self.values.get(start..start + self.cardinality)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.cardinality)
    }

    /// Probability of `value` given the parent combination encoded as `row`.
    pub fn probability(&self, row: usize, value: usize) -> f64 {
        self.values[row * self.cardinality + value]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

fn check_row(variable: VariableId, row_index: usize, row: &[f64]) -> Result<(), TableError> {
    if let Some(&bad) = row
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(TableError::OutOfRange {
            variable,
            row: row_index,
            value: bad,
        });
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        return Err(TableError::RowSum {
            variable,
            row: row_index,
            sum,
        });
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("table for variable {variable} has no entries")]
    Empty { variable: VariableId },
    #[error("table for variable {variable}: row {row} has {found} entries, expected {expected}")]
    RaggedRow {
        variable: VariableId,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("table for variable {variable}: row {row} holds {value}, outside [0, 1]")]
    OutOfRange {
        variable: VariableId,
        row: usize,
        value: f64,
    },
    #[error("table for variable {variable}: row {row} sums to {sum}, expected 1")]
    RowSum {
        variable: VariableId,
        row: usize,
        sum: f64,
    },
}
