//! Validated, immutable Bayesian network shared by every query.

use super::table::ConditionalProbabilityTable;
use super::variable::{Variable, VariableId};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct BayesianNetwork {
    variables: Vec<Variable>,
    tables: Vec<Option<ConditionalProbabilityTable>>,
    by_name: HashMap<String, VariableId>,
}

impl BayesianNetwork {
    /// Validates the variables and tables and assembles the network.
    ///
    /// A variable may lack a table here; elimination reports that as a missing table only when
    /// the variable would actually contribute a factor.
    pub fn new(
        variables: Vec<Variable>,
        tables: Vec<ConditionalProbabilityTable>,
    ) -> Result<Self, NetworkError> {
        if variables.is_empty() {
            return Err(NetworkError::Empty);
        }

        let mut by_name = HashMap::with_capacity(variables.len());
        for (index, var) in variables.iter().enumerate() {
            let id = VariableId::new(index);
            validate_variable(id, var, variables.len())?;
            if by_name.insert(var.name().to_string(), id).is_some() {
                return Err(NetworkError::DuplicateName {
                    name: var.name().to_string(),
                });
            }
        }
        check_acyclic(&variables)?;

        let mut slots: Vec<Option<ConditionalProbabilityTable>> = vec![None; variables.len()];
        for table in tables {
            let id = table.variable();
            let Some(var) = variables.get(id.index()) else {
                return Err(NetworkError::UnknownVariable { id });
            };
            if slots[id.index()].is_some() {
                return Err(NetworkError::DuplicateTable {
                    name: var.name().to_string(),
                });
            }
            let expected_rows: usize = var
                .parents()
                .iter()
                .map(|parent| variables[parent.index()].cardinality())
                .product();
            if table.cardinality() != var.cardinality() || table.row_count() != expected_rows {
                return Err(NetworkError::TableShape {
                    name: var.name().to_string(),
                    expected_rows,
                    expected_columns: var.cardinality(),
                    found_rows: table.row_count(),
                    found_columns: table.cardinality(),
                });
            }
            slots[id.index()] = Some(table);
        }

        Ok(Self {
            variables,
            tables: slots,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        (0..self.variables.len()).map(VariableId::new)
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    /// Resolves a variable by its unique name.
    pub fn find(&self, name: &str) -> Option<VariableId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: VariableId) -> &str {
        self.variables[id.index()].name()
    }

    pub fn cardinality(&self, id: VariableId) -> usize {
        self.variables[id.index()].cardinality()
    }

    pub fn table(&self, id: VariableId) -> Option<&ConditionalProbabilityTable> {
        self.tables.get(id.index()).and_then(Option::as_ref)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ConditionalProbabilityTable> {
        self.tables.iter().flatten()
    }

    /// Encodes a parent-value combination (in parent order) as a row of `id`'s table.
    pub fn row_index(&self, id: VariableId, parent_values: &[usize]) -> usize {
        self.variables[id.index()]
            .parents()
            .iter()
            .zip(parent_values)
            .fold(0, |row, (parent, value)| {
                row * self.cardinality(*parent) + value
            })
    }
}

fn validate_variable(id: VariableId, var: &Variable, count: usize) -> Result<(), NetworkError> {
    if var.name().trim().is_empty() {
        return Err(NetworkError::EmptyName { id });
    }
    if var.domain().is_empty() {
        return Err(NetworkError::EmptyDomain {
            name: var.name().to_string(),
        });
    }
    let mut seen = HashSet::new();
    for value in var.domain() {
        if !seen.insert(value.as_str()) {
            return Err(NetworkError::DuplicateValue {
                name: var.name().to_string(),
                value: value.clone(),
            });
        }
    }
    let mut parents = HashSet::new();
    for parent in var.parents() {
        if parent.index() >= count {
            return Err(NetworkError::UnknownVariable { id: *parent });
        }
        if *parent == id || !parents.insert(*parent) {
            return Err(NetworkError::InvalidParent {
                name: var.name().to_string(),
                parent: *parent,
            });
        }
    }
    Ok(())
}

fn check_acyclic(variables: &[Variable]) -> Result<(), NetworkError> {
    let mut indegree: Vec<usize> = variables.iter().map(Variable::parent_count).collect();
    let mut children = vec![Vec::new(); variables.len()];
    for (index, var) in variables.iter().enumerate() {
        for parent in var.parents() {
            children[parent.index()].push(index);
        }
    }

    let mut queue: VecDeque<usize> = (0..variables.len())
        .filter(|&index| indegree[index] == 0)
        .collect();
    let mut visited = 0usize;
    while let Some(index) = queue.pop_front() {
        visited += 1;
        for &child in &children[index] {
            indegree[child] -= 1;
            if indegree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if visited == variables.len() {
        return Ok(());
    }
    let name = indegree
        .iter()
        .position(|&degree| degree > 0)
        .map(|index| variables[index].name().to_string())
        .unwrap_or_default();
    Err(NetworkError::Cycle { name })
}

#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("network declares no variables")]
    Empty,
    #[error("variable {id} has an empty name")]
    EmptyName { id: VariableId },
    #[error("variable '{name}' is declared more than once")]
    DuplicateName { name: String },
    #[error("variable '{name}' has an empty domain")]
    EmptyDomain { name: String },
    #[error("variable '{name}' lists value '{value}' more than once")]
    DuplicateValue { name: String, value: String },
    #[error("reference to unknown variable {id}")]
    UnknownVariable { id: VariableId },
    #[error("variable '{name}' has invalid parent {parent}")]
    InvalidParent { name: String, parent: VariableId },
    #[error("network contains a directed cycle through '{name}'")]
    Cycle { name: String },
    #[error("variable '{name}' has more than one table")]
    DuplicateTable { name: String },
    #[error(
        "table for '{name}' is {found_rows}x{found_columns}, expected {expected_rows}x{expected_columns}"
    )]
    TableShape {
        name: String,
        expected_rows: usize,
        expected_columns: usize,
        found_rows: usize,
        found_columns: usize,
    },
}
