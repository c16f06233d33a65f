//! Integration tests for the demo suite.
//!
//! These run the variational workflows end to end on the state-vector
//! device.

use approx::assert_relative_eq;
use num_complex::Complex64;
use qgraph_demos::device::StateVectorDevice;
use qgraph_demos::hamiltonian::{PauliHamiltonian, PauliTerm, model_ground_energy, model_hamiltonian};
use qgraph_demos::vqe::{LearnHamiltonianRunner, VqeOptimizer, VqeRunner};
use qgraph_ir::{Operator, Wire};
use qgraph_qnode::{DiffMethod, GradientOptions, QNode, QuantumFunctionError};

/// The weights move against the constant gradient `(⟨X⟩, ⟨Y⟩, −⟨Z⟩)`.
#[test]
fn test_learn_hamiltonian_weights() {
    let runner = LearnHamiltonianRunner::new()
        .with_stepsize(0.1)
        .with_max_steps(25);
    let result = runner.run_with_weights(vec![0.5, -0.2, 0.1]).unwrap();
    let [x, y, z] = result.expectations;

    for value in result.expectations {
        assert!((-1.0..=1.0).contains(&value));
    }
    assert_eq!(result.history.len(), 26);

    let grad = [x, y, -z];
    for (i, g) in grad.iter().enumerate() {
        assert_relative_eq!(
            result.weights[i],
            result.initial_weights[i] - 25.0 * 0.1 * g,
            epsilon = 1e-10
        );
    }

    // Each step lowers the cost by η |∇|².
    let drop = 0.1 * (x * x + y * y + z * z);
    for pair in result.history.windows(2) {
        assert_relative_eq!(pair[0] - pair[1], drop, epsilon = 1e-10);
    }
}

#[test]
fn test_learn_is_seeded() {
    let a = LearnHamiltonianRunner::new().with_seed(3).with_max_steps(2).run().unwrap();
    let b = LearnHamiltonianRunner::new().with_seed(3).with_max_steps(2).run().unwrap();
    assert_eq!(a.initial_weights, b.initial_weights);
}

/// Parameter-shift energy gradients agree with a finite difference of the
/// energy itself.
#[test]
fn test_energy_gradient_matches_finite_difference() {
    let hamiltonian = model_hamiltonian();
    let runner = VqeRunner::new(hamiltonian.clone()).with_reps(1);
    let mut node = runner.qnode();
    let params = vec![0.3, -1.2, 0.8, 0.1];

    let jac = node.jacobian(&params).unwrap();
    let grad = hamiltonian.energy_gradient(&jac, params.len());

    let h = 1e-5;
    for i in 0..params.len() {
        let mut plus = params.clone();
        let mut minus = params.clone();
        plus[i] += h;
        minus[i] -= h;
        let e_plus = hamiltonian.energy(&node.evaluate(&plus).unwrap());
        let e_minus = hamiltonian.energy(&node.evaluate(&minus).unwrap());
        assert_relative_eq!(grad[i], (e_plus - e_minus) / (2.0 * h), epsilon = 1e-6);
    }
}

#[test]
fn test_vqe_lowers_energy() {
    for optimizer in [VqeOptimizer::GradientDescent, VqeOptimizer::Momentum] {
        let result = VqeRunner::new(model_hamiltonian())
            .with_stepsize(0.1)
            .with_max_steps(150)
            .with_optimizer(optimizer)
            .run(11)
            .unwrap();

        assert!(result.optimal_energy <= result.energy_history[0]);
        // Variational bound.
        assert!(result.optimal_energy >= model_ground_energy() - 1e-9);
        assert_eq!(result.energy_history.len(), result.iterations + 1);
    }
}

#[test]
fn test_vqe_finite_difference_gradients() {
    let h = PauliHamiltonian::new(vec![PauliTerm::identity(0.5), PauliTerm::x(1.0, 0)]);
    let result = VqeRunner::new(h)
        .with_reps(0)
        .with_stepsize(0.5)
        .with_max_steps(300)
        .with_gradient(GradientOptions {
            method: DiffMethod::FiniteDiff,
            ..GradientOptions::default()
        })
        .run_with_params(vec![0.2])
        .unwrap();

    // 0.5 + sin θ
    assert_relative_eq!(result.optimal_energy, -0.5, epsilon = 1e-6);
}

#[test]
fn test_device_rejects_cv_operations() {
    let mut node = QNode::new(StateVectorDevice::new(1), |tape, x| {
        tape.apply(Operator::displacement(&x[0], 0.0, 0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    });
    assert!(matches!(
        node.evaluate(&[0.1]),
        Err(QuantumFunctionError::UnsupportedOperation { ref name, .. }) if name == "Displacement"
    ));
}

/// Variances oscillate at twice the gate frequency; the default gradient
/// must still be exact.
#[test]
fn test_variance_gradient_default_method() {
    let mut node = QNode::new(StateVectorDevice::new(1), |tape, x| {
        tape.apply(Operator::ry(&x[0], 0))?;
        tape.var(Operator::pauli_z(0))?;
        Ok(())
    });
    let x: f64 = 0.3;
    let jac = node.jacobian(&[x]).unwrap();
    // var = sin² x
    assert_relative_eq!(jac[0][0], (2.0 * x).sin(), epsilon = 1e-10);
}

#[test]
fn test_hermitian_variance_gradient() {
    let two = Complex64::new(2.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    let mut node = QNode::new(StateVectorDevice::new(2), move |tape, x| {
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.apply(Operator::cnot(0, 1))?;
        tape.apply(Operator::ry(&x[1], 1))?;
        tape.var(Operator::hermitian(vec![two, zero, zero, zero], [Wire(1)])?)?;
        tape.expval(Operator::pauli_x(0))?;
        Ok(())
    });
    let params = vec![0.7, -0.4];
    let jac = node.jacobian(&params).unwrap();

    let h = 1e-6;
    for i in 0..params.len() {
        let mut plus = params.clone();
        let mut minus = params.clone();
        plus[i] += h;
        minus[i] -= h;
        let (f, b) = (node.evaluate(&plus).unwrap(), node.evaluate(&minus).unwrap());
        for row in 0..2 {
            assert_relative_eq!(jac[row][i], (f[row] - b[row]) / (2.0 * h), epsilon = 1e-6);
        }
    }
}
