//! End-to-end tests for quantum nodes with a closed-form device.

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use qgraph_ir::{
    CircuitGraph, CircuitNode, Operator, OperatorKind, Parameter, ReturnType, Wire, measure,
};
use qgraph_qnode::{
    Device, DeviceCapabilities, DeviceError, DeviceResult, DiffMethod, GradientDescent,
    GradientOptions, Optimizer, QNode, QNodeConfig, QNodeResult, QuantumFunctionError, Tape,
    jacobian,
};

/// Each observable on wire `w` evaluates to the product of `cos θ` over the
/// first parameter of every gate whose last wire is `w`. Variances return
/// `1 − ⟨·⟩²`.
struct CosineDevice {
    caps: DeviceCapabilities,
    executions: usize,
}

impl CosineDevice {
    fn new(num_wires: u32) -> Self {
        Self {
            caps: DeviceCapabilities::new("cosine", num_wires),
            executions: 0,
        }
    }
}

impl Device for CosineDevice {
    fn name(&self) -> &str {
        &self.caps.name
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    fn execute(&mut self, circuit: &CircuitGraph, args: &[f64]) -> DeviceResult<Vec<f64>> {
        self.executions += 1;
        circuit
            .observables()
            .into_iter()
            .map(|obs| -> DeviceResult<f64> {
                let wire = *obs
                    .term
                    .wires()
                    .first()
                    .ok_or_else(|| DeviceError::InvalidCircuit("observable without wires".into()))?;
                let mut value = 1.0;
                for op in circuit.operations() {
                    if op.wires.last() == Some(&wire) && !op.params.is_empty() {
                        value *= op.params[0].evaluate(args)?.cos();
                    }
                }
                Ok(match obs.return_type {
                    ReturnType::Variance => 1.0 - value * value,
                    _ => value,
                })
            })
            .collect()
    }
}

fn two_wire_node() -> QNode<CosineDevice> {
    QNode::new(CosineDevice::new(2), |tape, x| {
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.apply(Operator::ry(&x[1], 1))?;
        tape.apply(Operator::ry(&x[2], 0))?;
        tape.expval(Operator::pauli_z(0))?;
        tape.expval(Operator::pauli_z(1))?;
        Ok(())
    })
}

#[test]
fn test_evaluate() {
    let mut node = two_wire_node();
    let args = [0.1, 0.2, 0.3];
    let values = node.evaluate(&args).unwrap();

    assert_relative_eq!(values[0], 0.1f64.cos() * 0.3f64.cos(), epsilon = 1e-12);
    assert_relative_eq!(values[1], 0.2f64.cos(), epsilon = 1e-12);
}

#[test]
fn test_jacobian_matches_analytic() {
    let mut node = two_wire_node();
    let (a, b, c): (f64, f64, f64) = (0.4, -0.7, 1.1);
    let jac = node.jacobian(&[a, b, c]).unwrap();

    assert_eq!(jac.len(), 2);
    assert_relative_eq!(jac[0][0], -a.sin() * c.cos(), epsilon = 1e-10);
    assert_relative_eq!(jac[0][1], 0.0);
    assert_relative_eq!(jac[0][2], -a.cos() * c.sin(), epsilon = 1e-10);
    assert_relative_eq!(jac[1][0], 0.0);
    assert_relative_eq!(jac[1][1], -b.sin(), epsilon = 1e-10);
    assert_relative_eq!(jac[1][2], 0.0);
}

#[test]
fn test_jacobian_wrt_subset() {
    let mut node = two_wire_node();
    let jac = node.jacobian_wrt(&[0.4, -0.7, 1.1], &[1]).unwrap();

    assert_eq!(jac[0], vec![0.0, 0.0, 0.0]);
    assert_relative_eq!(jac[1][1], 0.7f64.sin(), epsilon = 1e-10);
}

#[test]
fn test_chain_rule_through_expression() {
    let mut node = QNode::new(CosineDevice::new(1), |tape, x| {
        tape.apply(Operator::rx(4.0 * x[0].clone(), 0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    });
    let x: f64 = 0.25;
    let jac = node.jacobian(&[x]).unwrap();
    assert_relative_eq!(jac[0][0], -4.0 * (4.0 * x).sin(), epsilon = 1e-10);
}

#[test]
fn test_variable_used_twice() {
    let mut node = QNode::new(CosineDevice::new(1), |tape, x| {
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.apply(Operator::ry(&x[0], 0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    });
    // f = cos² x
    let x: f64 = 0.6;
    let jac = node.jacobian(&[x]).unwrap();
    assert_relative_eq!(jac[0][0], -2.0 * x.cos() * x.sin(), epsilon = 1e-10);
}

#[test]
fn test_finite_difference_gate() {
    let qfunc = |tape: &mut Tape, x: &[Parameter]| -> QNodeResult<()> {
        tape.apply(Operator::hadamard(0))?;
        tape.apply(Operator::crx(&x[0], 0, 1))?;
        tape.expval(Operator::pauli_z(1))?;
        Ok(())
    };
    let x: f64 = 0.9;

    for method in [DiffMethod::Best, DiffMethod::ParameterShift, DiffMethod::FiniteDiff] {
        let options = GradientOptions {
            method,
            ..GradientOptions::default()
        };
        let mut node = QNode::new(CosineDevice::new(2), qfunc).with_options(options);
        let jac = node.jacobian(&[x]).unwrap();
        assert_relative_eq!(jac[0][0], -x.sin(), epsilon = 1e-6);
    }
}

#[test]
fn test_variance_gradient() {
    let qfunc = |tape: &mut Tape, x: &[Parameter]| -> QNodeResult<()> {
        tape.apply(Operator::ry(&x[0], 0))?;
        tape.var(Operator::pauli_z(0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    };
    let x: f64 = 0.3;

    // var = sin² x
    for method in [DiffMethod::Best, DiffMethod::ParameterShift, DiffMethod::FiniteDiff] {
        let options = GradientOptions {
            method,
            ..GradientOptions::default()
        };
        let mut node = QNode::new(CosineDevice::new(1), qfunc).with_options(options);
        let jac = node.jacobian(&[x]).unwrap();
        assert_relative_eq!(jac[0][0], (2.0 * x).sin(), epsilon = 1e-6);
        assert_relative_eq!(jac[1][0], -x.sin(), epsilon = 1e-6);
    }
}

#[test]
fn test_variance_without_square_uses_finite_differences() {
    let mut node = QNode::new(CosineDevice::new(1), |tape, x| {
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.var(Operator::number_operator(0))?;
        Ok(())
    });
    let x: f64 = 0.8;
    let jac = node.jacobian(&[x]).unwrap();
    assert_relative_eq!(jac[0][0], (2.0 * x).sin(), epsilon = 1e-6);
}

#[test]
fn test_unaffected_observable_skips_executions() {
    let mut node = QNode::new(CosineDevice::new(2), |tape, x| {
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.expval(Operator::pauli_z(1))?;
        Ok(())
    });
    let jac = node.jacobian(&[0.5]).unwrap();
    assert_eq!(jac, vec![vec![0.0]]);
    assert_eq!(node.device().executions, 0);
}

#[test]
fn test_not_differentiable() {
    let circuit = CircuitGraph::from_queue([
        CircuitNode::from(Operator::new(
            OperatorKind::Hadamard,
            [Wire(0)],
            [Parameter::variable(0)],
        )),
        measure::expval(Operator::pauli_z(0)).unwrap().into(),
    ]);
    let mut device = CosineDevice::new(1);
    let err = jacobian(&mut device, &circuit, &[0.1], &[0], &GradientOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        QuantumFunctionError::NotDifferentiable { ref name, index: 0 } if name == "Hadamard"
    ));
}

#[test]
fn test_argument_count_mismatch() {
    let mut node = QNode::new(CosineDevice::new(1), |tape, _x| {
        tape.apply(Operator::rx(Parameter::variable(2), 0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    });
    let err = node.evaluate(&[0.1]).unwrap_err();
    assert!(matches!(
        err,
        QuantumFunctionError::ArgumentCountMismatch { expected: 3, got: 1 }
    ));
}

#[test]
fn test_circuit_is_cached() {
    let recordings = Rc::new(Cell::new(0));
    let counter = Rc::clone(&recordings);
    let mut node = QNode::new(CosineDevice::new(1), move |tape, x| {
        counter.set(counter.get() + 1);
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    });

    node.evaluate(&[0.1]).unwrap();
    node.evaluate(&[0.2]).unwrap();
    node.jacobian(&[0.3]).unwrap();
    assert_eq!(recordings.get(), 1);

    node.evaluate(&[0.1, 0.2]).unwrap();
    assert_eq!(recordings.get(), 2);
}

#[test]
fn test_device_rejects_wire() {
    let mut node = QNode::new(CosineDevice::new(1), |tape, x| {
        tape.apply(Operator::rx(&x[0], 3))?;
        tape.expval(Operator::pauli_z(3))?;
        Ok(())
    });
    assert!(matches!(
        node.evaluate(&[0.1]),
        Err(QuantumFunctionError::WireOutOfRange { num_wires: 1, .. })
    ));
    assert!(node.circuit().is_none());
}

#[test]
fn test_draw_requires_construction() {
    let mut node = two_wire_node();
    assert!(matches!(node.draw(None), Err(QuantumFunctionError::NotConstructed)));

    node.construct(3).unwrap();
    let drawing = node.draw(Some([0.1, 0.2, 0.3].as_slice())).unwrap();
    assert!(drawing.contains("RX(0.100)"));
    assert!(drawing.contains("⟨Z⟩"));
}

#[test]
fn test_with_config() {
    let config = QNodeConfig::from_yaml("diff_method: finite_diff\nfinite_diff_step: 1.0e-6\n")
        .unwrap();
    let mut node = two_wire_node().with_config(&config);
    assert_eq!(node.options().method, DiffMethod::FiniteDiff);

    let jac = node.jacobian(&[0.4, -0.7, 1.1]).unwrap();
    assert_relative_eq!(jac[1][1], 0.7f64.sin(), epsilon = 1e-6);
}

#[test]
fn test_optimize_qnode() {
    let mut node = QNode::new(CosineDevice::new(1), |tape, x| {
        tape.apply(Operator::rx(&x[0], 0))?;
        tape.expval(Operator::pauli_z(0))?;
        Ok(())
    });

    // Minimizing cos x from x = 0.5 drives x towards π.
    let mut optimizer = GradientDescent::new(0.4).with_max_steps(200).with_tol(1e-12);
    let result = optimizer
        .minimize(
            |params| {
                let value = node.evaluate(params)?[0];
                let grad = node.jacobian(params)?.remove(0);
                Ok((value, grad))
            },
            vec![0.5],
        )
        .unwrap();

    assert_relative_eq!(result.optimal_value, -1.0, epsilon = 1e-6);
    assert_relative_eq!(result.optimal_params[0], std::f64::consts::PI, epsilon = 1e-2);
}
