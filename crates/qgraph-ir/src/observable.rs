//! Measurement observables.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::operator::{Operator, OperatorKind};
use crate::wire::Wire;

/// What a device should return for an observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    /// Expectation value.
    Expectation,
    /// Variance.
    Variance,
    /// Samples drawn from the measurement.
    Sample,
    /// Computational basis probabilities.
    Probability,
}

impl ReturnType {
    /// Name of the measurement function producing this return type.
    pub fn function_name(self) -> &'static str {
        match self {
            ReturnType::Expectation => "expval",
            ReturnType::Variance => "var",
            ReturnType::Sample => "sample",
            ReturnType::Probability => "probs",
        }
    }
}

/// Tensor product of operators acting on disjoint wires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    factors: Vec<Operator>,
}

impl Tensor {
    /// Build a tensor product, rejecting an empty product and factors that
    /// share a wire.
    pub fn new(factors: impl IntoIterator<Item = Operator>) -> IrResult<Self> {
        let factors: Vec<Operator> = factors.into_iter().collect();
        if factors.is_empty() {
            return Err(IrError::EmptyTensor);
        }
        let mut seen = FxHashSet::default();
        for wire in factors.iter().flat_map(|f| f.wires.iter().copied()) {
            if !seen.insert(wire) {
                return Err(IrError::OverlappingTensor(wire));
            }
        }
        Ok(Self { factors })
    }

    /// The factors, in order.
    pub fn factors(&self) -> &[Operator] {
        &self.factors
    }

    /// Concatenated wires of all factors.
    pub fn wires(&self) -> Vec<Wire> {
        self.factors
            .iter()
            .flat_map(|f| f.wires.iter().copied())
            .collect()
    }

    /// Extend this product by another factor.
    pub fn with(mut self, factor: Operator) -> IrResult<Self> {
        if let Some(&wire) = factor
            .wires
            .iter()
            .find(|w| self.factors.iter().any(|f| f.wires.contains(w)))
        {
            return Err(IrError::OverlappingTensor(wire));
        }
        self.factors.push(factor);
        Ok(self)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.factors.iter().map(Operator::name).collect();
        write!(f, "{}", names.join(" @ "))
    }
}

impl Operator {
    /// Tensor product of this operator with another.
    pub fn tensor(self, other: Operator) -> IrResult<Tensor> {
        Tensor::new([self, other])
    }
}

/// The measured quantity: a single operator or a tensor product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservableTerm {
    /// A single operator.
    Single(Operator),
    /// A tensor product of operators.
    Tensor(Tensor),
}

impl ObservableTerm {
    /// Factors of the term; a single operator yields one factor.
    pub fn factors(&self) -> &[Operator] {
        match self {
            ObservableTerm::Single(op) => std::slice::from_ref(op),
            ObservableTerm::Tensor(t) => t.factors(),
        }
    }

    /// Wires the term acts on.
    pub fn wires(&self) -> Vec<Wire> {
        match self {
            ObservableTerm::Single(op) => op.wires.clone(),
            ObservableTerm::Tensor(t) => t.wires(),
        }
    }

    /// Display name, e.g. `PauliZ` or `PauliX @ PauliY`.
    pub fn name(&self) -> String {
        match self {
            ObservableTerm::Single(op) => op.name().to_string(),
            ObservableTerm::Tensor(t) => t.to_string(),
        }
    }

    /// The square of the term, if every factor has a closed-form square.
    ///
    /// Factors act on disjoint wires, so a product squares factor by factor.
    pub fn squared(&self) -> Option<ObservableTerm> {
        match self {
            ObservableTerm::Single(op) => op.squared().map(ObservableTerm::Single),
            ObservableTerm::Tensor(t) => {
                let factors: Option<Vec<Operator>> =
                    t.factors().iter().map(Operator::squared).collect();
                Tensor::new(factors?).ok().map(ObservableTerm::Tensor)
            }
        }
    }

    /// Whether every factor is the identity.
    pub fn is_identity(&self) -> bool {
        self.factors()
            .iter()
            .all(|f| f.kind == OperatorKind::Identity)
    }
}

impl From<Operator> for ObservableTerm {
    fn from(op: Operator) -> Self {
        ObservableTerm::Single(op)
    }
}

impl From<Tensor> for ObservableTerm {
    fn from(t: Tensor) -> Self {
        ObservableTerm::Tensor(t)
    }
}

/// A measurement request placed at the end of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    /// The measured term.
    pub term: ObservableTerm,
    /// What the device should return.
    pub return_type: ReturnType,
}

impl Observable {
    /// Wires the observable acts on.
    pub fn wires(&self) -> Vec<Wire> {
        self.term.wires()
    }

    /// Display name of the measured term.
    pub fn name(&self) -> String {
        self.term.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_tensor_wires() {
        let t = Operator::pauli_x(0).tensor(Operator::pauli_z(2)).unwrap();
        assert_eq!(t.wires(), vec![Wire(0), Wire(2)]);
        assert_eq!(t.to_string(), "PauliX @ PauliZ");

        let t = t.with(Operator::pauli_y(1)).unwrap();
        assert_eq!(t.factors().len(), 3);
    }

    #[test]
    fn test_overlapping_tensor() {
        let err = Operator::pauli_x(0).tensor(Operator::pauli_z(0)).unwrap_err();
        assert_eq!(err, IrError::OverlappingTensor(Wire(0)));

        let t = Tensor::new([Operator::pauli_x(0)]).unwrap();
        assert!(t.with(Operator::cnot(1, 0)).is_err());
    }

    #[test]
    fn test_empty_tensor_rejected() {
        assert_eq!(Tensor::new([]), Err(IrError::EmptyTensor));
    }

    #[test]
    fn test_squared_terms() {
        let tensor = Operator::pauli_x(0).tensor(Operator::hadamard(3)).unwrap();
        let term = ObservableTerm::from(tensor);
        let squared = term.squared().unwrap();
        assert!(squared.is_identity());
        assert_eq!(squared.wires(), term.wires());

        let two = Complex64::new(2.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let h = Operator::hermitian(vec![two, zero, zero, zero], [Wire(1)]).unwrap();
        let squared = ObservableTerm::from(h).squared().unwrap();
        assert!(!squared.is_identity());
        assert_eq!(
            squared.factors()[0].kind,
            OperatorKind::Hermitian(vec![Complex64::new(4.0, 0.0), zero, zero, zero])
        );

        assert!(ObservableTerm::from(Operator::number_operator(0)).squared().is_none());
    }

    #[test]
    fn test_return_type_function_names() {
        assert_eq!(ReturnType::Expectation.function_name(), "expval");
        assert_eq!(ReturnType::Probability.function_name(), "probs");
    }
}
