//! Quantum operator kinds and their applications to wires.

use num_complex::Complex64;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::parameter::Parameter;
use crate::wire::Wire;

/// Tolerance used when checking matrix properties.
const MATRIX_TOLERANCE: f64 = 1e-8;

/// How the gradient with respect to an operator parameter is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradMethod {
    /// Two-term parameter-shift rule.
    Analytic,
    /// Central finite difference.
    FiniteDiff,
    /// Parameters of this operator cannot be differentiated.
    None,
}

/// The kind of a quantum operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperatorKind {
    // Qubit gates and observables
    /// Identity on any number of wires.
    Identity,
    /// Pauli-X.
    PauliX,
    /// Pauli-Y.
    PauliY,
    /// Pauli-Z.
    PauliZ,
    /// Hadamard.
    Hadamard,
    /// S gate (sqrt(Z)).
    S,
    /// T gate (fourth root of Z).
    T,
    /// Rotation around X.
    RX,
    /// Rotation around Y.
    RY,
    /// Rotation around Z.
    RZ,
    /// Phase shift on |1⟩.
    PhaseShift,
    /// Arbitrary rotation RZ(ω)·RY(θ)·RZ(φ).
    Rot,
    /// Controlled-NOT.
    CNOT,
    /// Controlled-Z.
    CZ,
    /// SWAP.
    SWAP,
    /// Controlled rotation around X.
    CRX,
    /// Controlled rotation around Y.
    CRY,
    /// Controlled rotation around Z.
    CRZ,
    /// Toffoli (CCX).
    Toffoli,
    /// Fredkin (controlled SWAP).
    CSWAP,
    /// Arbitrary unitary, row-major `2^n × 2^n`.
    QubitUnitary(Vec<Complex64>),
    /// State preparation from an amplitude vector of length `2^n`.
    QubitStateVector(Vec<Complex64>),
    /// Computational basis state preparation, one bit per wire.
    BasisState(Vec<u8>),
    /// Hermitian observable, row-major `2^n × 2^n`.
    Hermitian(Vec<Complex64>),

    // Continuous-variable gates and observables
    /// Phase space rotation.
    Rotation,
    /// Phase space displacement `(r, φ)`.
    Displacement,
    /// Squeezing `(r, φ)`.
    Squeezing,
    /// Beamsplitter `(θ, φ)`.
    Beamsplitter,
    /// Photon number observable.
    NumberOperator,
}

impl OperatorKind {
    /// Get the name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Identity => "Identity",
            OperatorKind::PauliX => "PauliX",
            OperatorKind::PauliY => "PauliY",
            OperatorKind::PauliZ => "PauliZ",
            OperatorKind::Hadamard => "Hadamard",
            OperatorKind::S => "S",
            OperatorKind::T => "T",
            OperatorKind::RX => "RX",
            OperatorKind::RY => "RY",
            OperatorKind::RZ => "RZ",
            OperatorKind::PhaseShift => "PhaseShift",
            OperatorKind::Rot => "Rot",
            OperatorKind::CNOT => "CNOT",
            OperatorKind::CZ => "CZ",
            OperatorKind::SWAP => "SWAP",
            OperatorKind::CRX => "CRX",
            OperatorKind::CRY => "CRY",
            OperatorKind::CRZ => "CRZ",
            OperatorKind::Toffoli => "Toffoli",
            OperatorKind::CSWAP => "CSWAP",
            OperatorKind::QubitUnitary(_) => "QubitUnitary",
            OperatorKind::QubitStateVector(_) => "QubitStateVector",
            OperatorKind::BasisState(_) => "BasisState",
            OperatorKind::Hermitian(_) => "Hermitian",
            OperatorKind::Rotation => "Rotation",
            OperatorKind::Displacement => "Displacement",
            OperatorKind::Squeezing => "Squeezing",
            OperatorKind::Beamsplitter => "Beamsplitter",
            OperatorKind::NumberOperator => "NumberOperator",
        }
    }

    /// Number of gate parameters this operator takes.
    pub fn num_params(&self) -> usize {
        match self {
            OperatorKind::RX
            | OperatorKind::RY
            | OperatorKind::RZ
            | OperatorKind::PhaseShift
            | OperatorKind::CRX
            | OperatorKind::CRY
            | OperatorKind::CRZ
            | OperatorKind::Rotation => 1,

            OperatorKind::Displacement | OperatorKind::Squeezing | OperatorKind::Beamsplitter => 2,

            OperatorKind::Rot => 3,

            _ => 0,
        }
    }

    /// Number of wires this operator acts on, or `None` if any count is allowed.
    ///
    /// Matrix-valued kinds derive the count from their data and return `None`
    /// when the data has an invalid size.
    pub fn num_wires(&self) -> Option<usize> {
        match self {
            OperatorKind::Identity => None,

            OperatorKind::PauliX
            | OperatorKind::PauliY
            | OperatorKind::PauliZ
            | OperatorKind::Hadamard
            | OperatorKind::S
            | OperatorKind::T
            | OperatorKind::RX
            | OperatorKind::RY
            | OperatorKind::RZ
            | OperatorKind::PhaseShift
            | OperatorKind::Rot
            | OperatorKind::Rotation
            | OperatorKind::Displacement
            | OperatorKind::Squeezing
            | OperatorKind::NumberOperator => Some(1),

            OperatorKind::CNOT
            | OperatorKind::CZ
            | OperatorKind::SWAP
            | OperatorKind::CRX
            | OperatorKind::CRY
            | OperatorKind::CRZ
            | OperatorKind::Beamsplitter => Some(2),

            OperatorKind::Toffoli | OperatorKind::CSWAP => Some(3),

            OperatorKind::QubitUnitary(m) | OperatorKind::Hermitian(m) => {
                square_dimension(m.len()).and_then(log2_exact)
            }
            OperatorKind::QubitStateVector(v) => log2_exact(v.len()),
            OperatorKind::BasisState(bits) => Some(bits.len()),
        }
    }

    /// Whether the operator may be measured.
    pub fn is_observable(&self) -> bool {
        matches!(
            self,
            OperatorKind::Identity
                | OperatorKind::PauliX
                | OperatorKind::PauliY
                | OperatorKind::PauliZ
                | OperatorKind::Hadamard
                | OperatorKind::Hermitian(_)
                | OperatorKind::NumberOperator
        )
    }

    /// Whether the operator acts on continuous-variable modes.
    pub fn is_cv(&self) -> bool {
        matches!(
            self,
            OperatorKind::Rotation
                | OperatorKind::Displacement
                | OperatorKind::Squeezing
                | OperatorKind::Beamsplitter
                | OperatorKind::NumberOperator
        )
    }

    /// Gradient recipe for this operator's parameters.
    pub fn grad_method(&self) -> GradMethod {
        match self {
            OperatorKind::RX
            | OperatorKind::RY
            | OperatorKind::RZ
            | OperatorKind::PhaseShift
            | OperatorKind::Rot
            | OperatorKind::Rotation
            | OperatorKind::Beamsplitter => GradMethod::Analytic,

            // Controlled rotations have four distinct generator eigenvalues,
            // so the two-term rule is not exact for them.
            OperatorKind::CRX
            | OperatorKind::CRY
            | OperatorKind::CRZ
            | OperatorKind::Displacement
            | OperatorKind::Squeezing => GradMethod::FiniteDiff,

            _ => GradMethod::None,
        }
    }

    /// Check matrix-valued data for shape and, for observables, hermiticity.
    fn validate_data(&self) -> IrResult<()> {
        let invalid = |reason: String| IrError::InvalidMatrix {
            name: self.name().to_string(),
            reason,
        };
        match self {
            OperatorKind::QubitUnitary(m) | OperatorKind::Hermitian(m) => {
                let dim = square_dimension(m.len())
                    .ok_or_else(|| invalid(format!("{} entries is not a square matrix", m.len())))?;
                if log2_exact(dim).is_none() || dim < 2 {
                    return Err(invalid(format!("dimension {dim} is not a power of two")));
                }
                if let OperatorKind::Hermitian(_) = self {
                    for row in 0..dim {
                        for col in row..dim {
                            let a = m[row * dim + col];
                            let b = m[col * dim + row].conj();
                            if (a - b).norm() > MATRIX_TOLERANCE {
                                return Err(invalid(format!(
                                    "entry ({row}, {col}) breaks hermiticity"
                                )));
                            }
                        }
                    }
                }
                Ok(())
            }
            OperatorKind::QubitStateVector(v) => {
                if log2_exact(v.len()).is_none() || v.len() < 2 {
                    return Err(invalid(format!("length {} is not a power of two", v.len())));
                }
                let norm: f64 = v.iter().map(Complex64::norm_sqr).sum();
                if (norm - 1.0).abs() > 1e-6 {
                    return Err(invalid(format!("state is not normalised (norm² = {norm})")));
                }
                Ok(())
            }
            OperatorKind::BasisState(bits) => match bits.iter().find(|&&b| b > 1) {
                Some(b) => Err(invalid(format!("basis state entries must be 0 or 1, got {b}"))),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

/// `n` such that `n * n == len`.
fn square_dimension(len: usize) -> Option<usize> {
    let n = (len as f64).sqrt().round() as usize;
    (n * n == len).then_some(n)
}

/// `k` such that `2^k == n`.
fn log2_exact(n: usize) -> Option<usize> {
    n.is_power_of_two().then(|| n.trailing_zeros() as usize)
}

/// An operator applied to an ordered list of wires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    /// The kind of operator.
    pub kind: OperatorKind,
    /// Wires the operator acts on, in order.
    pub wires: Vec<Wire>,
    /// Gate parameters, in order.
    pub params: Vec<Parameter>,
}

impl Operator {
    /// Create an operator without validation.
    pub fn new(
        kind: OperatorKind,
        wires: impl IntoIterator<Item = Wire>,
        params: impl IntoIterator<Item = Parameter>,
    ) -> Self {
        Self {
            kind,
            wires: wires.into_iter().collect(),
            params: params.into_iter().collect(),
        }
    }

    /// Get the name of this operator.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Check parameter count, wire count, duplicate wires and matrix data.
    pub fn validate(&self) -> IrResult<()> {
        let expected = self.kind.num_params();
        if self.params.len() != expected {
            return Err(IrError::ParameterCountMismatch {
                name: self.name().to_string(),
                expected,
                got: self.params.len(),
            });
        }

        self.kind.validate_data()?;

        match self.kind.num_wires() {
            Some(expected) if expected != self.wires.len() => {
                return Err(IrError::WireCountMismatch {
                    name: self.name().to_string(),
                    expected,
                    got: self.wires.len(),
                });
            }
            None if self.wires.is_empty() => {
                return Err(IrError::WireCountMismatch {
                    name: self.name().to_string(),
                    expected: 1,
                    got: 0,
                });
            }
            _ => {}
        }

        let mut seen = FxHashSet::default();
        for &wire in &self.wires {
            if !seen.insert(wire) {
                return Err(IrError::DuplicateWire {
                    wire,
                    name: Some(self.name().to_string()),
                });
            }
        }

        Ok(())
    }

    /// Whether any parameter depends on a free variable.
    pub fn is_parameterized(&self) -> bool {
        self.params.iter().any(Parameter::is_free)
    }

    /// Evaluate all parameters for the given arguments.
    pub fn evaluate_params(&self, args: &[f64]) -> IrResult<Vec<f64>> {
        self.params.iter().map(|p| p.evaluate(args)).collect()
    }

    /// The square of this observable, if it has a closed form.
    ///
    /// Involutory observables square to the identity on their wires and
    /// Hermitian matrices to their matrix product.
    pub fn squared(&self) -> Option<Operator> {
        match &self.kind {
            OperatorKind::Identity
            | OperatorKind::PauliX
            | OperatorKind::PauliY
            | OperatorKind::PauliZ
            | OperatorKind::Hadamard => Some(Operator::identity(self.wires.iter().copied())),
            OperatorKind::Hermitian(m) => {
                let dim = square_dimension(m.len())?;
                let mut product = vec![Complex64::new(0.0, 0.0); m.len()];
                for row in 0..dim {
                    for k in 0..dim {
                        let a = m[row * dim + k];
                        for col in 0..dim {
                            product[row * dim + col] += a * m[k * dim + col];
                        }
                    }
                }
                Some(Operator::new(
                    OperatorKind::Hermitian(product),
                    self.wires.iter().copied(),
                    [],
                ))
            }
            _ => None,
        }
    }

    /// A copy of this operator with parameter `slot` offset by `shift`.
    #[must_use]
    pub fn with_shifted_param(&self, slot: usize, shift: f64) -> Self {
        let mut shifted = self.clone();
        if let Some(param) = shifted.params.get_mut(slot) {
            *param = param.shifted(shift);
        }
        shifted
    }

    // =========================================================================
    // Qubit constructors
    // =========================================================================

    /// Identity on the given wires.
    pub fn identity(wires: impl IntoIterator<Item = Wire>) -> Self {
        Self::new(OperatorKind::Identity, wires, [])
    }

    /// Pauli-X on a wire.
    pub fn pauli_x(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::PauliX, [wire.into()], [])
    }

    /// Pauli-Y on a wire.
    pub fn pauli_y(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::PauliY, [wire.into()], [])
    }

    /// Pauli-Z on a wire.
    pub fn pauli_z(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::PauliZ, [wire.into()], [])
    }

    /// Hadamard on a wire.
    pub fn hadamard(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::Hadamard, [wire.into()], [])
    }

    /// S gate on a wire.
    pub fn s(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::S, [wire.into()], [])
    }

    /// T gate on a wire.
    pub fn t(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::T, [wire.into()], [])
    }

    /// RX rotation.
    pub fn rx(theta: impl Into<Parameter>, wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::RX, [wire.into()], [theta.into()])
    }

    /// RY rotation.
    pub fn ry(theta: impl Into<Parameter>, wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::RY, [wire.into()], [theta.into()])
    }

    /// RZ rotation.
    pub fn rz(theta: impl Into<Parameter>, wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::RZ, [wire.into()], [theta.into()])
    }

    /// Phase shift.
    pub fn phase_shift(phi: impl Into<Parameter>, wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::PhaseShift, [wire.into()], [phi.into()])
    }

    /// Arbitrary single-qubit rotation `Rot(φ, θ, ω)`.
    pub fn rot(
        phi: impl Into<Parameter>,
        theta: impl Into<Parameter>,
        omega: impl Into<Parameter>,
        wire: impl Into<Wire>,
    ) -> Self {
        Self::new(
            OperatorKind::Rot,
            [wire.into()],
            [phi.into(), theta.into(), omega.into()],
        )
    }

    /// CNOT with control and target.
    pub fn cnot(control: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::CNOT, [control.into(), target.into()], [])
    }

    /// Controlled-Z.
    pub fn cz(control: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::CZ, [control.into(), target.into()], [])
    }

    /// SWAP.
    pub fn swap(a: impl Into<Wire>, b: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::SWAP, [a.into(), b.into()], [])
    }

    /// Controlled RX.
    pub fn crx(theta: impl Into<Parameter>, control: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::CRX, [control.into(), target.into()], [theta.into()])
    }

    /// Controlled RY.
    pub fn cry(theta: impl Into<Parameter>, control: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::CRY, [control.into(), target.into()], [theta.into()])
    }

    /// Controlled RZ.
    pub fn crz(theta: impl Into<Parameter>, control: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::CRZ, [control.into(), target.into()], [theta.into()])
    }

    /// Toffoli with two controls and a target.
    pub fn toffoli(c1: impl Into<Wire>, c2: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::Toffoli, [c1.into(), c2.into(), target.into()], [])
    }

    /// Controlled SWAP.
    pub fn cswap(control: impl Into<Wire>, a: impl Into<Wire>, b: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::CSWAP, [control.into(), a.into(), b.into()], [])
    }

    /// Arbitrary unitary on the given wires.
    pub fn qubit_unitary(
        matrix: Vec<Complex64>,
        wires: impl IntoIterator<Item = Wire>,
    ) -> IrResult<Self> {
        let op = Self::new(OperatorKind::QubitUnitary(matrix), wires, []);
        op.validate()?;
        Ok(op)
    }

    /// State preparation from amplitudes.
    pub fn qubit_state_vector(
        state: Vec<Complex64>,
        wires: impl IntoIterator<Item = Wire>,
    ) -> IrResult<Self> {
        let op = Self::new(OperatorKind::QubitStateVector(state), wires, []);
        op.validate()?;
        Ok(op)
    }

    /// Computational basis state preparation.
    pub fn basis_state(bits: Vec<u8>, wires: impl IntoIterator<Item = Wire>) -> IrResult<Self> {
        let op = Self::new(OperatorKind::BasisState(bits), wires, []);
        op.validate()?;
        Ok(op)
    }

    /// Hermitian observable on the given wires.
    pub fn hermitian(
        matrix: Vec<Complex64>,
        wires: impl IntoIterator<Item = Wire>,
    ) -> IrResult<Self> {
        let op = Self::new(OperatorKind::Hermitian(matrix), wires, []);
        op.validate()?;
        Ok(op)
    }

    // =========================================================================
    // Continuous-variable constructors
    // =========================================================================

    /// Phase space rotation.
    pub fn rotation(phi: impl Into<Parameter>, wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::Rotation, [wire.into()], [phi.into()])
    }

    /// Displacement.
    pub fn displacement(
        r: impl Into<Parameter>,
        phi: impl Into<Parameter>,
        wire: impl Into<Wire>,
    ) -> Self {
        Self::new(OperatorKind::Displacement, [wire.into()], [r.into(), phi.into()])
    }

    /// Squeezing.
    pub fn squeezing(
        r: impl Into<Parameter>,
        phi: impl Into<Parameter>,
        wire: impl Into<Wire>,
    ) -> Self {
        Self::new(OperatorKind::Squeezing, [wire.into()], [r.into(), phi.into()])
    }

    /// Beamsplitter between two modes.
    pub fn beamsplitter(
        theta: impl Into<Parameter>,
        phi: impl Into<Parameter>,
        a: impl Into<Wire>,
        b: impl Into<Wire>,
    ) -> Self {
        Self::new(
            OperatorKind::Beamsplitter,
            [a.into(), b.into()],
            [theta.into(), phi.into()],
        )
    }

    /// Photon number observable.
    pub fn number_operator(wire: impl Into<Wire>) -> Self {
        Self::new(OperatorKind::NumberOperator, [wire.into()], [])
    }
}

/// Identity matrix of dimension `dim`, row-major.
pub fn identity_matrix(dim: usize) -> Vec<Complex64> {
    let mut m = vec![Complex64::new(0.0, 0.0); dim * dim];
    for i in 0..dim {
        m[i * dim + i] = Complex64::new(1.0, 0.0);
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_properties() {
        assert_eq!(OperatorKind::Hadamard.num_wires(), Some(1));
        assert_eq!(OperatorKind::CNOT.num_wires(), Some(2));
        assert_eq!(OperatorKind::CSWAP.num_wires(), Some(3));
        assert_eq!(OperatorKind::Rot.num_params(), 3);
        assert_eq!(OperatorKind::Beamsplitter.num_params(), 2);
        assert_eq!(
            OperatorKind::Hermitian(identity_matrix(4)).num_wires(),
            Some(2)
        );
        assert_eq!(OperatorKind::Identity.num_wires(), None);

        assert!(OperatorKind::PauliZ.is_observable());
        assert!(!OperatorKind::RX.is_observable());
        assert!(OperatorKind::NumberOperator.is_cv());
    }

    #[test]
    fn test_grad_methods() {
        assert_eq!(OperatorKind::RY.grad_method(), GradMethod::Analytic);
        assert_eq!(OperatorKind::CRX.grad_method(), GradMethod::FiniteDiff);
        assert_eq!(OperatorKind::CNOT.grad_method(), GradMethod::None);
    }

    #[test]
    fn test_validate_parameter_count() {
        let op = Operator::new(OperatorKind::RX, [Wire(0)], []);
        assert_eq!(
            op.validate(),
            Err(IrError::ParameterCountMismatch {
                name: "RX".into(),
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn test_validate_wire_count() {
        let op = Operator::new(OperatorKind::CNOT, [Wire(0)], []);
        assert!(matches!(
            op.validate(),
            Err(IrError::WireCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_wire() {
        let op = Operator::cnot(0, 0);
        assert!(matches!(
            op.validate(),
            Err(IrError::DuplicateWire { wire: Wire(0), .. })
        ));
    }

    #[test]
    fn test_hermitian_validation() {
        assert!(Operator::hermitian(identity_matrix(4), [Wire(1), Wire(2)]).is_ok());

        let mut not_hermitian = identity_matrix(2);
        not_hermitian[1] = Complex64::new(0.0, 1.0);
        assert!(matches!(
            Operator::hermitian(not_hermitian, [Wire(0)]),
            Err(IrError::InvalidMatrix { .. })
        ));

        assert!(matches!(
            Operator::hermitian(identity_matrix(4), [Wire(0)]),
            Err(IrError::WireCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_state_vector_validation() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let plus = vec![Complex64::new(s, 0.0), Complex64::new(s, 0.0)];
        assert!(Operator::qubit_state_vector(plus, [Wire(0)]).is_ok());

        let unnormalised = vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];
        assert!(Operator::qubit_state_vector(unnormalised, [Wire(0)]).is_err());
    }

    #[test]
    fn test_shifted_param() {
        let op = Operator::rx(Parameter::variable(0), 0);
        let shifted = op.with_shifted_param(0, 0.5);
        assert_eq!(shifted.evaluate_params(&[1.0]).unwrap(), vec![1.5]);
        assert_eq!(op.evaluate_params(&[1.0]).unwrap(), vec![1.0]);
        assert!(op.is_parameterized());
        assert!(!Operator::rx(0.3, 0).is_parameterized());
    }
}
