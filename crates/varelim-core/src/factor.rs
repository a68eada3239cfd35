//! Factors: non-negative potentials over a scope of variables.
//!
//! Values are stored flat in mixed-radix order over the scope, first scope axis most significant.
//! An empty scope holds a single scalar.

use crate::engine::EngineError;
use crate::evidence::Evidence;
use crate::model::network::BayesianNetwork;
use crate::model::variable::VariableId;
use crate::posterior::Posterior;
use std::iter;

#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    scope: Vec<VariableId>,
    cardinalities: Vec<usize>,
    values: Vec<f64>,
}

/// Where a table member's value comes from while a leaf factor is being filled.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Axis(usize),
    Clamped(usize),
}

impl Factor {
    /// Builds a factor from raw parts. Returns `None` when the scope repeats a variable, the
    /// value count does not match the cardinalities, or a value is negative or not finite.
    pub fn new(
        scope: Vec<VariableId>,
        cardinalities: Vec<usize>,
        values: Vec<f64>,
    ) -> Option<Self> {
        if scope.len() != cardinalities.len() {
            return None;
        }
        if scope
            .iter()
            .enumerate()
            .any(|(i, var)| scope[..i].contains(var))
        {
            return None;
        }
        if cardinalities.iter().product::<usize>() != values.len() {
            return None;
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        Some(Self {
            scope,
            cardinalities,
            values,
        })
    }

    /// Scope of the leaf factor `variable` would produce under `evidence`: the variable followed
    /// by its parents, with observed members removed. `None` for an observed root, which
    /// contributes no factor at all.
    pub fn leaf_scope(
        network: &BayesianNetwork,
        variable: VariableId,
        evidence: &Evidence,
    ) -> Option<Vec<VariableId>> {
        let var = network.variable(variable)?;
        if evidence.contains(variable) && var.parents().is_empty() {
            return None;
        }
        Some(
            iter::once(variable)
                .chain(var.parents().iter().copied())
                .filter(|member| !evidence.contains(*member))
                .collect(),
        )
    }

    /// Builds the leaf factor for `variable` from its table, clamping every observed member to
    /// its observed value.
    pub fn from_table(
        network: &BayesianNetwork,
        variable: VariableId,
        evidence: &Evidence,
    ) -> Result<Option<Factor>, EngineError> {
        let var = network
            .variable(variable)
            .ok_or(EngineError::UnknownVariable { id: variable })?;
        if evidence.contains(variable) && var.parents().is_empty() {
            return Ok(None);
        }
        let table = network
            .table(variable)
            .ok_or_else(|| EngineError::MissingTable {
                variable: var.name().to_string(),
            })?;

        // Unobserved members take the next axis, so the scope matches `leaf_scope`.
        let mut scope = Vec::with_capacity(var.parents().len() + 1);
        let mut slot_for = |member: VariableId| match evidence.value(member) {
            Some(value) => Slot::Clamped(value),
            None => {
                scope.push(member);
                Slot::Axis(scope.len() - 1)
            }
        };
        let own_slot = slot_for(variable);
        let parent_slots: Vec<Slot> = var.parents().iter().map(|p| slot_for(*p)).collect();
        debug_assert_eq!(
            Some(&scope),
            Self::leaf_scope(network, variable, evidence).as_ref()
        );

        let cardinalities: Vec<usize> = scope.iter().map(|v| network.cardinality(*v)).collect();
        let size: usize = cardinalities.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut assignment = vec![0usize; scope.len()];
        let mut parent_values = vec![0usize; parent_slots.len()];

        for _ in 0..size {
            let resolve = |slot: Slot| match slot {
                Slot::Axis(axis) => assignment[axis],
                Slot::Clamped(value) => value,
            };
            for (value, slot) in parent_values.iter_mut().zip(&parent_slots) {
                *value = resolve(*slot);
            }
            let row = network.row_index(variable, &parent_values);
            values.push(table.probability(row, resolve(own_slot)));
            advance(&mut assignment, &cardinalities);
        }

        Ok(Some(Self {
            scope,
            cardinalities,
            values,
        }))
    }

    pub fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries in the table.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn contains_variable(&self, variable: VariableId) -> bool {
        self.scope.contains(&variable)
    }

    /// Value for an assignment given in scope order.
    pub fn value_at(&self, assignment: &[usize]) -> Option<f64> {
        if assignment.len() != self.scope.len() {
            return None;
        }
        let mut offset = 0usize;
        for (value, card) in assignment.iter().zip(&self.cardinalities) {
            if value >= card {
                return None;
            }
            offset = offset * card + value;
        }
        self.values.get(offset).copied()
    }

    /// Value for an assignment keyed by variable; entries for variables outside the scope are
    /// ignored, so any axis order may be used.
    pub fn value_of(&self, assignment: &[(VariableId, usize)]) -> Option<f64> {
        let ordered = self
            .scope
            .iter()
            .map(|var| {
                assignment
                    .iter()
                    .find(|(candidate, _)| candidate == var)
                    .map(|(_, value)| *value)
            })
            .collect::<Option<Vec<_>>>()?;
        self.value_at(&ordered)
    }

    /// Multiplies `factors` over the union of their scopes and sums the product over every value
    /// of `eliminate`.
    ///
    /// A variable missing from an input's scope is broadcast: the input does not vary along that
    /// axis. When `eliminate` is `None` or appears in no input, the plain product is returned.
    /// The work is proportional to the product of the union scope's cardinalities.
    pub fn merge(factors: &[Factor], eliminate: Option<VariableId>) -> Factor {
        let mut union = Vec::new();
        let mut union_cards = Vec::new();
        for factor in factors {
            for (var, card) in factor.scope.iter().zip(&factor.cardinalities) {
                if !union.contains(var) {
                    union.push(*var);
                    union_cards.push(*card);
                }
            }
        }

        let input_strides: Vec<Vec<usize>> = factors
            .iter()
            .map(|factor| factor.strides_over(&union))
            .collect();

        let mut scope = Vec::with_capacity(union.len());
        let mut cardinalities = Vec::with_capacity(union.len());
        for (var, card) in union.iter().zip(&union_cards) {
            if Some(*var) != eliminate {
                scope.push(*var);
                cardinalities.push(*card);
            }
        }
        let result = Factor {
            values: vec![0.0; cardinalities.iter().product()],
            scope,
            cardinalities,
        };
        let result_strides = result.strides_over(&union);
        let mut values = result.values;

        let total: usize = union_cards.iter().product();
        let mut assignment = vec![0usize; union.len()];
        let mut offsets = vec![0usize; factors.len()];
        let mut result_offset = 0usize;

        for _ in 0..total {
            let product: f64 = factors
                .iter()
                .zip(&offsets)
                .map(|(factor, offset)| factor.values[*offset])
                .product();
            values[result_offset] += product;

            for axis in (0..union.len()).rev() {
                assignment[axis] += 1;
                if assignment[axis] < union_cards[axis] {
                    for (offset, strides) in offsets.iter_mut().zip(&input_strides) {
                        *offset += strides[axis];
                    }
                    result_offset += result_strides[axis];
                    break;
                }
                assignment[axis] = 0;
                let rewind = union_cards[axis] - 1;
                for (offset, strides) in offsets.iter_mut().zip(&input_strides) {
                    *offset -= strides[axis] * rewind;
                }
                result_offset -= result_strides[axis] * rewind;
            }
        }

        Factor {
            scope: result.scope,
            cardinalities: result.cardinalities,
            values,
        }
    }

    /// Normalizes a factor over exactly `[query]` into the query's posterior.
    ///
    /// Clamping evidence leaves the final table only proportional to the posterior, so every
    /// entry is divided by the total mass.
    pub fn to_answer(
        &self,
        network: &BayesianNetwork,
        query: VariableId,
    ) -> Result<Posterior, EngineError> {
        if self.scope != [query] {
            return Err(EngineError::ScopeMismatch {
                expected: vec![query],
                found: self.scope.clone(),
            });
        }
        let var = network
            .variable(query)
            .ok_or(EngineError::UnknownVariable { id: query })?;
        let total: f64 = self.values.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(EngineError::ImpossibleEvidence {
                query: var.name().to_string(),
            });
        }
        let entries = var
            .domain()
            .iter()
            .zip(&self.values)
            .map(|(label, value)| (label.clone(), value / total))
            .collect();
        Ok(Posterior::new(var.name(), entries))
    }

    /// Stride of each `axes` variable within this factor's flat table; zero for variables outside
    /// the scope.
    fn strides_over(&self, axes: &[VariableId]) -> Vec<usize> {
        let mut own = vec![1usize; self.scope.len()];
        for i in (0..self.scope.len().saturating_sub(1)).rev() {
            own[i] = own[i + 1] * self.cardinalities[i + 1];
        }
        axes.iter()
            .map(|var| {
                self.scope
                    .iter()
                    .position(|member| member == var)
                    .map_or(0, |i| own[i])
            })
            .collect()
    }
}

fn advance(assignment: &mut [usize], cardinalities: &[usize]) {
    for axis in (0..assignment.len()).rev() {
        assignment[axis] += 1;
        if assignment[axis] < cardinalities[axis] {
            return;
        }
        assignment[axis] = 0;
    }
}
