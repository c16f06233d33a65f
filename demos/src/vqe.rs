//! Variational quantum eigensolver runners.
//!
//! [`LearnHamiltonianRunner`] keeps a fixed circuit and trains the classical
//! weights of the measured Hamiltonian. [`VqeRunner`] trains the rotation
//! angles of a hardware-efficient ansatz against a [`PauliHamiltonian`] with
//! parameter-shift gradients.

use num_complex::Complex64;
use qgraph_ir::{Operator, Parameter, wires};
use qgraph_qnode::{
    GradientDescent, GradientOptions, MomentumOptimizer, OptimizationResult, Optimizer, QNode,
    QNodeResult, QuantumFunctionError, Tape,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::device::StateVectorDevice;
use crate::hamiltonian::{Pauli, PauliHamiltonian};

/// Result of training the Hamiltonian weights.
#[derive(Debug, Clone, Serialize)]
pub struct LearnResult {
    /// Starting weights.
    pub initial_weights: Vec<f64>,
    /// Weights after training.
    pub weights: Vec<f64>,
    /// ⟨X⟩, ⟨Y⟩ and ⟨Z⟩ on wire 1 after the ansatz.
    pub expectations: [f64; 3],
    /// Cost after every step.
    pub history: Vec<f64>,
}

/// Prepare `(|00⟩ + |01⟩ + |11⟩)/√3`, rotate wire 0 and entangle.
pub fn fixed_ansatz(tape: &mut Tape) -> QNodeResult<()> {
    let amp = Complex64::new(1.0 / 3f64.sqrt(), 0.0);
    let zero = Complex64::new(0.0, 0.0);
    tape.apply(Operator::qubit_state_vector(
        vec![amp, amp, zero, amp],
        wires([0u32, 1]),
    )?)?;
    tape.apply(Operator::rot(0.4, 0.3, 1.3, 0))?;
    tape.apply(Operator::cnot(0, 1))?;
    Ok(())
}

/// Trains the weights of `w₀ X₁ + w₁ Y₁ − w₂ Z₁` on a fixed circuit.
///
/// The cost is linear in the weights, so gradient descent moves them along
/// `(⟨X⟩, ⟨Y⟩, −⟨Z⟩)` for the configured number of steps.
#[derive(Debug, Clone)]
pub struct LearnHamiltonianRunner {
    /// Gradient descent step size.
    pub stepsize: f64,
    /// Number of steps.
    pub max_steps: usize,
    /// Seed for the initial weights.
    pub seed: u64,
}

impl Default for LearnHamiltonianRunner {
    fn default() -> Self {
        Self {
            stepsize: 0.1,
            max_steps: 100,
            seed: 42,
        }
    }
}

impl LearnHamiltonianRunner {
    /// Create a runner with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step size.
    pub fn with_stepsize(mut self, stepsize: f64) -> Self {
        self.stepsize = stepsize;
        self
    }

    /// Set the number of steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the seed of the initial weights.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Expectation values ⟨X₁⟩, ⟨Y₁⟩, ⟨Z₁⟩ after [`fixed_ansatz`], one
    /// quantum node per observable.
    pub fn expectations(&self) -> QNodeResult<[f64; 3]> {
        let mut values = [0.0; 3];
        for (value, pauli) in values.iter_mut().zip([Pauli::X, Pauli::Y, Pauli::Z]) {
            let mut node = QNode::new(StateVectorDevice::new(2), move |tape, _| {
                fixed_ansatz(tape)?;
                tape.expval(pauli.operator(1))?;
                Ok(())
            });
            *value = node.evaluate(&[])?[0];
        }
        Ok(values)
    }

    /// Train from random initial weights.
    pub fn run(&self) -> QNodeResult<LearnResult> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let initial: Vec<f64> = (0..3).map(|_| rng.gen_range(-1.0..1.0)).collect();
        self.run_with_weights(initial)
    }

    /// Train from the given initial weights.
    pub fn run_with_weights(&self, initial_weights: Vec<f64>) -> QNodeResult<LearnResult> {
        let expectations = self.expectations()?;
        let [x, y, z] = expectations;
        let grad = vec![x, y, -z];

        // Never converges on a linear cost; runs the configured steps.
        let mut optimizer = GradientDescent::new(self.stepsize)
            .with_max_steps(self.max_steps)
            .with_tol(0.0);
        let result = optimizer.minimize(
            |w| Ok((w[0] * x + w[1] * y - w[2] * z, grad.clone())),
            initial_weights.clone(),
        )?;

        info!(
            steps = result.num_iterations,
            cost = result.optimal_value,
            "trained hamiltonian weights"
        );

        Ok(LearnResult {
            initial_weights,
            weights: result.optimal_params,
            expectations,
            history: result.history,
        })
    }
}

/// Optimizer used by [`VqeRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VqeOptimizer {
    /// Plain gradient descent.
    GradientDescent,
    /// Gradient descent with momentum 0.9.
    Momentum,
}

/// Result of a VQE run.
#[derive(Debug, Clone, Serialize)]
pub struct VqeResult {
    /// Optimal energy found.
    pub optimal_energy: f64,
    /// Optimal parameters.
    pub optimal_params: Vec<f64>,
    /// Number of iterations.
    pub iterations: usize,
    /// Number of energy and gradient evaluations.
    pub evaluations: usize,
    /// Energy history during optimization.
    pub energy_history: Vec<f64>,
    /// Whether optimization converged.
    pub converged: bool,
}

impl VqeResult {
    fn from_optimization(result: OptimizationResult, evaluations: usize) -> Self {
        Self {
            optimal_energy: result.optimal_value,
            optimal_params: result.optimal_params,
            iterations: result.num_iterations,
            evaluations,
            energy_history: result.history,
            converged: result.converged,
        }
    }
}

/// VQE runner configuration.
#[derive(Debug, Clone)]
pub struct VqeRunner {
    /// The Hamiltonian to minimize.
    pub hamiltonian: PauliHamiltonian,
    /// Number of wires.
    pub num_wires: u32,
    /// Number of entangling layers.
    pub reps: usize,
    /// Step size.
    pub stepsize: f64,
    /// Maximum optimization steps.
    pub max_steps: usize,
    /// Convergence tolerance on the energy change.
    pub tol: f64,
    /// Optimizer.
    pub optimizer: VqeOptimizer,
    /// Gradient method and step sizes.
    pub gradient: GradientOptions,
}

impl VqeRunner {
    /// Create a new VQE runner.
    pub fn new(hamiltonian: PauliHamiltonian) -> Self {
        let num_wires = hamiltonian.num_wires();
        Self {
            hamiltonian,
            num_wires,
            reps: 1,
            stepsize: 0.2,
            max_steps: 200,
            tol: 1e-8,
            optimizer: VqeOptimizer::GradientDescent,
            gradient: GradientOptions::default(),
        }
    }

    /// Set the number of entangling layers.
    pub fn with_reps(mut self, reps: usize) -> Self {
        self.reps = reps;
        self
    }

    /// Set the step size.
    pub fn with_stepsize(mut self, stepsize: f64) -> Self {
        self.stepsize = stepsize;
        self
    }

    /// Set maximum steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the optimizer.
    pub fn with_optimizer(mut self, optimizer: VqeOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Set the gradient options.
    pub fn with_gradient(mut self, gradient: GradientOptions) -> Self {
        self.gradient = gradient;
        self
    }

    /// Number of ansatz parameters: one RY angle per wire and layer.
    pub fn num_parameters(&self) -> usize {
        self.num_wires as usize * (self.reps + 1)
    }

    /// Quantum node evaluating every non-identity Hamiltonian term.
    pub fn qnode(&self) -> QNode<StateVectorDevice> {
        let hamiltonian = self.hamiltonian.clone();
        let (num_wires, reps) = (self.num_wires, self.reps);
        QNode::new(StateVectorDevice::new(num_wires), move |tape, x| {
            ry_ansatz(tape, x, num_wires, reps)?;
            hamiltonian.measure(tape)
        })
        .with_options(self.gradient)
    }

    /// Run VQE from seeded random initial parameters in `[-π/2, π/2)`.
    pub fn run(&self, seed: u64) -> QNodeResult<VqeResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        let half_pi = std::f64::consts::FRAC_PI_2;
        let initial: Vec<f64> = (0..self.num_parameters())
            .map(|_| rng.gen_range(-half_pi..half_pi))
            .collect();
        self.run_with_params(initial)
    }

    /// Run VQE from the given initial parameters.
    pub fn run_with_params(&self, initial_params: Vec<f64>) -> QNodeResult<VqeResult> {
        let mut node = self.qnode();
        let mut evaluations = 0;
        let hamiltonian = &self.hamiltonian;
        let objective = |params: &[f64]| -> QNodeResult<(f64, Vec<f64>)> {
            evaluations += 1;
            let energy = hamiltonian.energy(&node.evaluate(params)?);
            let jac = node.jacobian(params)?;
            Ok((energy, hamiltonian.energy_gradient(&jac, params.len())))
        };

        let result = match self.optimizer {
            VqeOptimizer::GradientDescent => GradientDescent::new(self.stepsize)
                .with_max_steps(self.max_steps)
                .with_tol(self.tol)
                .minimize(objective, initial_params)?,
            VqeOptimizer::Momentum => MomentumOptimizer::new(self.stepsize, 0.9)
                .with_max_steps(self.max_steps)
                .with_tol(self.tol)
                .minimize(objective, initial_params)?,
        };

        info!(
            energy = result.optimal_value,
            iterations = result.num_iterations,
            "vqe finished"
        );
        Ok(VqeResult::from_optimization(result, evaluations))
    }
}

/// Layers of RY rotations separated by a CNOT chain.
///
/// Uses `x[layer * num_wires + wire]` as the angle on each wire.
pub fn ry_ansatz(tape: &mut Tape, x: &[Parameter], num_wires: u32, reps: usize) -> QNodeResult<()> {
    let width = num_wires as usize;
    let expected = width * (reps + 1);
    if x.len() < expected {
        return Err(QuantumFunctionError::ArgumentCountMismatch {
            expected,
            got: x.len(),
        });
    }
    for layer in 0..=reps {
        if layer > 0 {
            for wire in 1..num_wires {
                tape.apply(Operator::cnot(wire - 1, wire))?;
            }
        }
        for wire in 0..num_wires {
            tape.apply(Operator::ry(&x[layer * width + wire as usize], wire))?;
        }
    }
    Ok(())
}
