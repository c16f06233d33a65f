//! Dense state-vector device.
//!
//! Simulates qubit circuits by applying each gate matrix to the full state.
//! Wire 0 is the most significant bit of a basis state index.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

use num_complex::Complex64;
use qgraph_ir::{CircuitGraph, Observable, Operator, OperatorKind, ReturnType, identity_matrix};
use qgraph_qnode::{Device, DeviceCapabilities, DeviceError, DeviceResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Operations the device can apply.
pub const OPERATIONS: &[&str] = &[
    "Identity",
    "PauliX",
    "PauliY",
    "PauliZ",
    "Hadamard",
    "S",
    "T",
    "RX",
    "RY",
    "RZ",
    "PhaseShift",
    "Rot",
    "CNOT",
    "CZ",
    "SWAP",
    "CRX",
    "CRY",
    "CRZ",
    "Toffoli",
    "CSWAP",
    "QubitUnitary",
    "QubitStateVector",
    "BasisState",
];

/// Observables the device can measure.
pub const OBSERVABLES: &[&str] = &["Identity", "PauliX", "PauliY", "PauliZ", "Hadamard", "Hermitian"];

/// Exact state-vector simulator.
///
/// Expectation values and variances are exact. Samples need a shot count and
/// are only available for observables with eigenvalues ±1; the device
/// returns their mean.
#[derive(Debug)]
pub struct StateVectorDevice {
    caps: DeviceCapabilities,
    rng: StdRng,
}

impl StateVectorDevice {
    /// Create a device with `num_wires` qubits.
    pub fn new(num_wires: u32) -> Self {
        Self {
            caps: DeviceCapabilities::new("default.qubit", num_wires)
                .with_operations(OPERATIONS.iter().copied())
                .with_observables(OBSERVABLES.iter().copied()),
            rng: StdRng::from_entropy(),
        }
    }

    /// Set the number of shots used for sampled observables.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.caps = self.caps.with_shots(shots);
        self
    }

    /// Seed the sampler.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn num_wires(&self) -> usize {
        self.caps.num_wires as usize
    }

    /// Final state of the circuit's operations for the given arguments.
    pub fn state(&self, circuit: &CircuitGraph, args: &[f64]) -> DeviceResult<Vec<Complex64>> {
        let n = self.num_wires();
        let mut state = vec![ZERO; 1 << n];
        state[0] = ONE;

        for (position, op) in circuit.operations().into_iter().enumerate() {
            let wires = self.wire_positions(op)?;
            match &op.kind {
                OperatorKind::QubitStateVector(amplitudes) => {
                    ensure_first(op, position)?;
                    state.fill(ZERO);
                    for (offset, amp) in offsets(n, &wires).into_iter().zip(amplitudes) {
                        state[offset] = *amp;
                    }
                }
                OperatorKind::BasisState(bits) => {
                    ensure_first(op, position)?;
                    state.fill(ZERO);
                    let index: usize = wires
                        .iter()
                        .zip(bits)
                        .filter(|(_, bit)| **bit == 1)
                        .map(|(&w, _)| mask(n, w))
                        .sum();
                    state[index] = ONE;
                }
                kind => {
                    let params = op.evaluate_params(args)?;
                    let matrix = gate_matrix(kind, &params, wires.len())?;
                    apply(&mut state, n, &matrix, &wires);
                }
            }
            trace!(op = op.name(), "applied operation");
        }

        Ok(state)
    }

    fn wire_positions(&self, op: &Operator) -> DeviceResult<Vec<usize>> {
        op.wires
            .iter()
            .map(|w| {
                if w.index() < self.num_wires() {
                    Ok(w.index())
                } else {
                    Err(DeviceError::InvalidCircuit(format!(
                        "{} acts on wire {w}, device has {} wires",
                        op.name(),
                        self.num_wires()
                    )))
                }
            })
            .collect()
    }

    /// `O|ψ⟩` for every factor of the observable.
    fn apply_observable(&self, obs: &Observable, state: &[Complex64]) -> DeviceResult<Vec<Complex64>> {
        let n = self.num_wires();
        let mut result = state.to_vec();
        for factor in obs.term.factors() {
            let wires = self.wire_positions(factor)?;
            let matrix = gate_matrix(&factor.kind, &[], wires.len())?;
            apply(&mut result, n, &matrix, &wires);
        }
        Ok(result)
    }

    fn measure(&mut self, obs: &Observable, state: &[Complex64]) -> DeviceResult<f64> {
        let transformed = self.apply_observable(obs, state)?;
        let expectation = inner(state, &transformed).re;

        match obs.return_type {
            ReturnType::Expectation => Ok(expectation),
            ReturnType::Variance => {
                let second_moment: f64 = transformed.iter().map(Complex64::norm_sqr).sum();
                Ok(second_moment - expectation * expectation)
            }
            ReturnType::Sample => {
                let shots = self.caps.shots.ok_or_else(|| {
                    DeviceError::Unsupported("sampling requires a shot count".to_string())
                })?;
                let involutory = obs.term.factors().iter().all(|f| {
                    matches!(
                        f.kind,
                        OperatorKind::Identity
                            | OperatorKind::PauliX
                            | OperatorKind::PauliY
                            | OperatorKind::PauliZ
                            | OperatorKind::Hadamard
                    )
                });
                if !involutory {
                    return Err(DeviceError::Unsupported(format!(
                        "cannot sample {}",
                        obs.name()
                    )));
                }
                let p_plus = ((1.0 + expectation) / 2.0).clamp(0.0, 1.0);
                let plus = (0..shots).filter(|_| self.rng.gen_bool(p_plus)).count() as f64;
                Ok((2.0 * plus - f64::from(shots)) / f64::from(shots))
            }
            ReturnType::Probability => Err(DeviceError::Unsupported(
                "probabilities are not a single value".to_string(),
            )),
        }
    }
}

impl Device for StateVectorDevice {
    fn name(&self) -> &str {
        &self.caps.name
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    fn execute(&mut self, circuit: &CircuitGraph, args: &[f64]) -> DeviceResult<Vec<f64>> {
        let state = self.state(circuit, args)?;
        circuit
            .observables()
            .into_iter()
            .map(|obs| self.measure(obs, &state))
            .collect()
    }
}

fn ensure_first(op: &Operator, position: usize) -> DeviceResult<()> {
    if position == 0 {
        Ok(())
    } else {
        Err(DeviceError::InvalidCircuit(format!(
            "{} must be the first operation",
            op.name()
        )))
    }
}

/// Bit of wire `w` in a basis state index.
fn mask(num_wires: usize, w: usize) -> usize {
    1 << (num_wires - 1 - w)
}

/// Global index offsets of the local basis states on `wires`.
fn offsets(num_wires: usize, wires: &[usize]) -> Vec<usize> {
    let k = wires.len();
    (0..1usize << k)
        .map(|local| {
            wires
                .iter()
                .enumerate()
                .filter(|(j, _)| (local >> (k - 1 - j)) & 1 == 1)
                .map(|(_, &w)| mask(num_wires, w))
                .sum()
        })
        .collect()
}

/// Apply a row-major `2^k × 2^k` matrix to the given wires.
fn apply(state: &mut [Complex64], num_wires: usize, matrix: &[Complex64], wires: &[usize]) {
    let offsets = offsets(num_wires, wires);
    let dim = offsets.len();
    let touched: usize = wires.iter().map(|&w| mask(num_wires, w)).sum();
    let mut amps = vec![ZERO; dim];

    for base in (0..state.len()).filter(|i| i & touched == 0) {
        for (amp, &offset) in amps.iter_mut().zip(&offsets) {
            *amp = state[base | offset];
        }
        for (row, &offset) in offsets.iter().enumerate() {
            state[base | offset] = matrix[row * dim..(row + 1) * dim]
                .iter()
                .zip(&amps)
                .map(|(m, a)| m * a)
                .sum();
        }
    }
}

fn inner(a: &[Complex64], b: &[Complex64]) -> Complex64 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

fn matmul(a: &[Complex64], b: &[Complex64], dim: usize) -> Vec<Complex64> {
    let mut out = vec![ZERO; dim * dim];
    for row in 0..dim {
        for col in 0..dim {
            out[row * dim + col] = (0..dim).map(|k| a[row * dim + k] * b[k * dim + col]).sum();
        }
    }
    out
}

/// `|0⟩⟨0| ⊗ 1 + |1⟩⟨1| ⊗ U`
fn controlled(u: &[Complex64]) -> Vec<Complex64> {
    let d = (u.len() as f64).sqrt().round() as usize;
    let dim = 2 * d;
    let mut out = identity_matrix(dim);
    for row in 0..d {
        for col in 0..d {
            out[(d + row) * dim + d + col] = u[row * d + col];
        }
    }
    out
}

fn real(v: f64) -> Complex64 {
    Complex64::new(v, 0.0)
}

fn pauli_x() -> Vec<Complex64> {
    vec![ZERO, ONE, ONE, ZERO]
}

fn swap() -> Vec<Complex64> {
    let mut m = vec![ZERO; 16];
    m[0] = ONE;
    m[6] = ONE;
    m[9] = ONE;
    m[15] = ONE;
    m
}

fn rx(theta: f64) -> Vec<Complex64> {
    let (s, c) = (theta / 2.0).sin_cos();
    vec![real(c), -I * s, -I * s, real(c)]
}

fn ry(theta: f64) -> Vec<Complex64> {
    let (s, c) = (theta / 2.0).sin_cos();
    vec![real(c), real(-s), real(s), real(c)]
}

fn rz(theta: f64) -> Vec<Complex64> {
    vec![
        Complex64::from_polar(1.0, -theta / 2.0),
        ZERO,
        ZERO,
        Complex64::from_polar(1.0, theta / 2.0),
    ]
}

/// Matrix of a gate or observable on `num_wires` wires.
fn gate_matrix(kind: &OperatorKind, params: &[f64], num_wires: usize) -> DeviceResult<Vec<Complex64>> {
    let angle = |slot: usize| {
        params.get(slot).copied().ok_or_else(|| {
            DeviceError::InvalidCircuit(format!("{} is missing parameter {slot}", kind.name()))
        })
    };

    let matrix = match kind {
        OperatorKind::Identity => identity_matrix(1 << num_wires),
        OperatorKind::PauliX => pauli_x(),
        OperatorKind::PauliY => vec![ZERO, -I, I, ZERO],
        OperatorKind::PauliZ => vec![ONE, ZERO, ZERO, -ONE],
        OperatorKind::Hadamard => {
            let h = real(FRAC_1_SQRT_2);
            vec![h, h, h, -h]
        }
        OperatorKind::S => vec![ONE, ZERO, ZERO, I],
        OperatorKind::T => vec![ONE, ZERO, ZERO, Complex64::from_polar(1.0, FRAC_PI_4)],
        OperatorKind::RX => rx(angle(0)?),
        OperatorKind::RY => ry(angle(0)?),
        OperatorKind::RZ => rz(angle(0)?),
        OperatorKind::PhaseShift => vec![ONE, ZERO, ZERO, Complex64::from_polar(1.0, angle(0)?)],
        // RZ(ω) RY(θ) RZ(φ)
        OperatorKind::Rot => matmul(
            &rz(angle(2)?),
            &matmul(&ry(angle(1)?), &rz(angle(0)?), 2),
            2,
        ),
        OperatorKind::CNOT => controlled(&pauli_x()),
        OperatorKind::CZ => controlled(&[ONE, ZERO, ZERO, -ONE]),
        OperatorKind::SWAP => swap(),
        OperatorKind::CRX => controlled(&rx(angle(0)?)),
        OperatorKind::CRY => controlled(&ry(angle(0)?)),
        OperatorKind::CRZ => controlled(&rz(angle(0)?)),
        OperatorKind::Toffoli => controlled(&controlled(&pauli_x())),
        OperatorKind::CSWAP => controlled(&swap()),
        OperatorKind::QubitUnitary(m) | OperatorKind::Hermitian(m) => m.clone(),
        other => {
            return Err(DeviceError::Unsupported(format!(
                "{} is not a qubit gate",
                other.name()
            )));
        }
    };

    Ok(matrix)
}
