//! Pauli Hamiltonians.
//!
//! A Hamiltonian is represented as a sum of Pauli strings:
//! H = Σᵢ cᵢ Pᵢ
//! where each Pᵢ is a tensor product of Pauli operators. Every non-identity
//! term becomes one expectation value in a quantum function.

use qgraph_ir::{ObservableTerm, Operator, Tensor};
use qgraph_qnode::{QNodeResult, Tape};
use serde::{Deserialize, Serialize};

/// A single Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Pauli-X operator.
    X,
    /// Pauli-Y operator.
    Y,
    /// Pauli-Z operator.
    Z,
}

impl Pauli {
    /// Get the name of this Pauli operator.
    pub fn name(&self) -> &'static str {
        match self {
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        }
    }

    /// The observable on `wire`.
    pub fn operator(self, wire: u32) -> Operator {
        match self {
            Pauli::X => Operator::pauli_x(wire),
            Pauli::Y => Operator::pauli_y(wire),
            Pauli::Z => Operator::pauli_z(wire),
        }
    }
}

impl std::fmt::Display for Pauli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single term cᵢ (P₀ ⊗ P₁ ⊗ ...) of a Pauli Hamiltonian.
///
/// Only non-identity Paulis are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// The coefficient of this term.
    pub coefficient: f64,
    /// The non-identity Pauli operators, as (wire, pauli).
    /// Empty means identity on all wires.
    pub operators: Vec<(u32, Pauli)>,
}

impl PauliTerm {
    /// Create a new Pauli term.
    pub fn new(coefficient: f64, operators: Vec<(u32, Pauli)>) -> Self {
        Self {
            coefficient,
            operators,
        }
    }

    /// Create an identity term (scalar).
    pub fn identity(coefficient: f64) -> Self {
        Self::new(coefficient, vec![])
    }

    /// Create a single-wire X term.
    pub fn x(coefficient: f64, wire: u32) -> Self {
        Self::new(coefficient, vec![(wire, Pauli::X)])
    }

    /// Create a single-wire Y term.
    pub fn y(coefficient: f64, wire: u32) -> Self {
        Self::new(coefficient, vec![(wire, Pauli::Y)])
    }

    /// Create a single-wire Z term.
    pub fn z(coefficient: f64, wire: u32) -> Self {
        Self::new(coefficient, vec![(wire, Pauli::Z)])
    }

    /// Create a ZZ term.
    pub fn zz(coefficient: f64, wire1: u32, wire2: u32) -> Self {
        Self::new(coefficient, vec![(wire1, Pauli::Z), (wire2, Pauli::Z)])
    }

    /// Create an XX term.
    pub fn xx(coefficient: f64, wire1: u32, wire2: u32) -> Self {
        Self::new(coefficient, vec![(wire1, Pauli::X), (wire2, Pauli::X)])
    }

    /// Create a YY term.
    pub fn yy(coefficient: f64, wire1: u32, wire2: u32) -> Self {
        Self::new(coefficient, vec![(wire1, Pauli::Y), (wire2, Pauli::Y)])
    }

    /// Check if this is an identity term.
    pub fn is_identity(&self) -> bool {
        self.operators.is_empty()
    }

    /// Get the maximum wire index.
    pub fn max_wire(&self) -> Option<u32> {
        self.operators.iter().map(|(w, _)| *w).max()
    }

    /// The measured term, or `None` for the identity.
    pub fn observable(&self) -> QNodeResult<Option<ObservableTerm>> {
        let mut factors = self.operators.iter().map(|&(w, p)| p.operator(w));
        let Some(first) = factors.next() else {
            return Ok(None);
        };
        let term = match factors.next() {
            None => ObservableTerm::from(first),
            Some(second) => {
                let tensor = factors.try_fold(first.tensor(second)?, Tensor::with)?;
                ObservableTerm::from(tensor)
            }
        };
        Ok(Some(term))
    }
}

impl std::fmt::Display for PauliTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.coefficient >= 0.0 {
            write!(f, "+{:.4} ", self.coefficient)?;
        } else {
            write!(f, "{:.4} ", self.coefficient)?;
        }

        if self.operators.is_empty() {
            write!(f, "I")?;
        } else {
            for (i, (wire, pauli)) in self.operators.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{pauli}[{wire}]")?;
            }
        }
        Ok(())
    }
}

/// A Hamiltonian represented as a sum of Pauli terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliHamiltonian {
    /// The terms in the Hamiltonian.
    pub terms: Vec<PauliTerm>,
}

impl PauliHamiltonian {
    /// Create a new Hamiltonian from a list of terms.
    pub fn new(terms: Vec<PauliTerm>) -> Self {
        Self { terms }
    }

    /// Get the number of terms.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Get the number of wires needed.
    pub fn num_wires(&self) -> u32 {
        self.terms
            .iter()
            .filter_map(PauliTerm::max_wire)
            .max()
            .map_or(0, |m| m + 1)
    }

    /// Sum of the identity coefficients.
    pub fn identity_coefficient(&self) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.is_identity())
            .map(|t| t.coefficient)
            .sum()
    }

    /// Iterate over non-identity terms.
    pub fn non_identity_terms(&self) -> impl Iterator<Item = &PauliTerm> {
        self.terms.iter().filter(|t| !t.is_identity())
    }

    /// Record one expectation value per non-identity term, in order.
    pub fn measure(&self, tape: &mut Tape) -> QNodeResult<()> {
        for term in &self.terms {
            if let Some(observable) = term.observable()? {
                tape.expval(observable)?;
            }
        }
        Ok(())
    }

    /// Energy from the expectation values recorded by [`Self::measure`].
    pub fn energy(&self, expectations: &[f64]) -> f64 {
        self.identity_coefficient()
            + self
                .non_identity_terms()
                .zip(expectations)
                .map(|(t, e)| t.coefficient * e)
                .sum::<f64>()
    }

    /// Gradient of [`Self::energy`] from the jacobian of the expectation
    /// values.
    pub fn energy_gradient(&self, jacobian: &[Vec<f64>], num_args: usize) -> Vec<f64> {
        let mut grad = vec![0.0; num_args];
        for (term, row) in self.non_identity_terms().zip(jacobian) {
            for (g, d) in grad.iter_mut().zip(row) {
                *g += term.coefficient * d;
            }
        }
        grad
    }
}

impl std::fmt::Display for PauliHamiltonian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Hamiltonian ({} terms, {} wires):",
            self.num_terms(),
            self.num_wires()
        )?;
        for term in &self.terms {
            writeln!(f, "  {term}")?;
        }
        Ok(())
    }
}

/// Two-qubit model Hamiltonian
/// `-0.5 + 0.4 Z₀ − 0.4 Z₁ + 0.2 Z₀Z₁ + 0.18 (X₀X₁ + Y₀Y₁)`.
///
/// The hopping terms only mix |01⟩ and |10⟩; the ground state lies in that
/// block with energy `-0.7 − √(0.64 + 0.36²)`.
pub fn model_hamiltonian() -> PauliHamiltonian {
    PauliHamiltonian::new(vec![
        PauliTerm::identity(-0.5),
        PauliTerm::z(0.4, 0),
        PauliTerm::z(-0.4, 1),
        PauliTerm::zz(0.2, 0, 1),
        PauliTerm::xx(0.18, 0, 1),
        PauliTerm::yy(0.18, 0, 1),
    ])
}

/// Exact ground state energy of [`model_hamiltonian`].
pub fn model_ground_energy() -> f64 {
    -0.7 - (0.64f64 + 0.18 * 0.18 * 4.0).sqrt()
}
