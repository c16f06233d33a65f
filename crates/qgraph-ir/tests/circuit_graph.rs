//! Integration tests for circuit graph construction and queries.

use std::collections::BTreeSet;

use qgraph_ir::{
    CircuitGraph, CircuitNode, IrError, LayerView, Operator, Parameter, ParameterDependency,
    VariableDeps, Wire, identity_matrix, measure,
};

/// Operations that depend on previous operations, followed by two
/// observables.
fn queue() -> Vec<CircuitNode> {
    vec![
        Operator::rx(0.43, 0).into(),
        Operator::ry(0.35, 1).into(),
        Operator::rz(0.35, 2).into(),
        Operator::cnot(0, 1).into(),
        Operator::hadamard(2).into(),
        Operator::cnot(2, 0).into(),
        Operator::pauli_x(1).into(),
        measure::expval(Operator::pauli_x(0)).unwrap().into(),
        measure::expval(Operator::hermitian(identity_matrix(4), [Wire(1), Wire(2)]).unwrap())
            .unwrap()
            .into(),
    ]
}

fn circuit() -> CircuitGraph {
    CircuitGraph::new(queue(), VariableDeps::new())
}

/// Continuous-variable circuit of six arguments `a..f`.
fn parameterized_cv_circuit() -> CircuitGraph {
    let x = |i| Parameter::variable(i);
    let queue: Vec<CircuitNode> = vec![
        Operator::rotation(x(0), 0).into(),
        Operator::rotation(x(1), 1).into(),
        Operator::rotation(x(2), 2).into(),
        Operator::beamsplitter(x(3), 1.0, 0, 1).into(),
        Operator::rotation(1.0, 0).into(),
        Operator::rotation(x(4), 1).into(),
        Operator::rotation(x(5), 2).into(),
        measure::expval(Operator::number_operator(0)).unwrap().into(),
        measure::expval(Operator::number_operator(1)).unwrap().into(),
        measure::expval(Operator::number_operator(2)).unwrap().into(),
    ];
    CircuitGraph::from_queue(queue)
}

/// Qubit circuit mixing scaled variables, constants and multi-wire gates.
fn parameterized_qubit_circuit() -> CircuitGraph {
    let x = |i| Parameter::variable(i);
    let queue: Vec<CircuitNode> = vec![
        Operator::rx(x(0), 0).into(),
        Operator::rx(x(1), 1).into(),
        Operator::pauli_z(1).into(),
        Operator::cnot(0, 1).into(),
        Operator::cry(x(1), 3, 1).into(),
        Operator::rx(x(3), 0).into(),
        Operator::rx(4.0 * x(4), 1).into(),
        Operator::ry(17.0 / 9.0 * x(2), 2).into(),
        Operator::rz(x(1), 3).into(),
        Operator::rx(x(5), 2).into(),
        Operator::cry(0.3589, 3, 1).into(),
        Operator::qubit_unitary(identity_matrix(2), [Wire(2)])
            .unwrap()
            .into(),
        Operator::toffoli(0, 2, 1).into(),
        Operator::cz(0, 1).into(),
        Operator::cz(0, 2).into(),
        Operator::cnot(2, 1).into(),
        Operator::cnot(0, 2).into(),
        Operator::swap(0, 2).into(),
        Operator::cnot(1, 3).into(),
        Operator::rz(x(1), 3).into(),
        Operator::cswap(4, 0, 1).into(),
        measure::expval(Operator::pauli_y(0)).unwrap().into(),
        measure::var(Operator::hadamard(1)).unwrap().into(),
        measure::sample(Operator::pauli_x(2)).unwrap().into(),
        measure::expval(Operator::hermitian(identity_matrix(4), [Wire(3), Wire(4)]).unwrap())
            .unwrap()
            .into(),
    ];
    CircuitGraph::from_queue(queue)
}

#[test]
fn test_no_dependence() {
    let circuit = CircuitGraph::from_queue([
        CircuitNode::from(Operator::rx(0.43, 0)),
        CircuitNode::from(Operator::ry(0.35, 1)),
    ]);
    assert_eq!(circuit.num_nodes(), 2);
    assert_eq!(circuit.num_edges(), 0);
}

#[test]
fn test_dependence() {
    let circuit = circuit();
    assert_eq!(circuit.num_nodes(), 9);
    assert_eq!(circuit.num_edges(), 9);

    for (index, node) in queue().iter().enumerate() {
        assert_eq!(circuit.node(index), Some(node));
    }

    assert_eq!(
        circuit.edges(),
        vec![
            (0, 3),
            (1, 3),
            (2, 4),
            (3, 5),
            (3, 6),
            (4, 5),
            (5, 7),
            (5, 8),
            (6, 8)
        ]
    );
}

#[test]
fn test_ancestors_and_descendants() {
    let circuit = circuit();
    assert_eq!(circuit.ancestors(&[6]), BTreeSet::from([0, 1, 3]));
    assert_eq!(circuit.descendants(&[6]), BTreeSet::from([8]));
}

#[test]
fn test_update_node() {
    let mut circuit = circuit();
    let edges = circuit.edges();

    circuit.update_node(0, Operator::rx(0.1, 0)).unwrap();
    assert_eq!(circuit.operations()[0], &Operator::rx(0.1, 0));
    assert_eq!(circuit.edges(), edges);
}

#[test]
fn test_update_node_rejects_other_wires() {
    let mut circuit = circuit();
    let err = circuit.update_node(0, Operator::rx(0.1, 1)).unwrap_err();
    assert_eq!(
        err,
        IrError::WireMismatch {
            index: 0,
            expected: vec![Wire(0)],
            got: vec![Wire(1)],
        }
    );
}

#[test]
fn test_observables_and_operations() {
    let circuit = circuit();
    let queue = queue();

    let expected_ops: Vec<_> = queue.iter().filter_map(CircuitNode::operation).collect();
    let expected_obs: Vec<_> = queue.iter().filter_map(CircuitNode::observable).collect();
    assert_eq!(circuit.operations(), expected_ops);
    assert_eq!(circuit.observables(), expected_obs);
}

#[test]
fn test_wire_indices() {
    let circuit = circuit();
    assert_eq!(circuit.wire_indices(0), &[0, 3, 5, 7]);
    assert_eq!(circuit.wire_indices(1), &[1, 3, 6, 8]);
    assert_eq!(circuit.wire_indices(2), &[2, 4, 5, 8]);
}

#[test]
fn test_layers() {
    let circuit = parameterized_cv_circuit();
    let layers = circuit.layers();

    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0].ops, vec![0, 1, 2]);
    assert_eq!(layers[0].param_indices, vec![0, 1, 2]);
    assert_eq!(layers[1].ops, vec![3]);
    assert_eq!(layers[1].param_indices, vec![3]);
    // The constant rotation shares a layer with the last two rotations.
    assert_eq!(layers[2].ops, vec![4, 5, 6]);
    assert_eq!(layers[2].param_indices, vec![4, 5]);
}

#[test]
fn test_iterate_layers() {
    let circuit = parameterized_cv_circuit();
    let result: Vec<LayerView> = circuit.iterate_layers().collect();

    assert_eq!(result.len(), 3);

    assert!(result[0].preceding.is_empty());
    assert_eq!(result[0].ops, vec![0, 1, 2]);
    assert_eq!(result[0].param_indices, vec![0, 1, 2]);
    assert_eq!(result[0].following, vec![3, 4, 5, 6, 7, 8, 9]);

    assert_eq!(result[1].preceding, vec![0, 1]);
    assert_eq!(result[1].ops, vec![3]);
    assert_eq!(result[1].param_indices, vec![3]);
    assert_eq!(result[1].following, vec![4, 5, 7, 8]);

    assert_eq!(result[2].preceding, vec![0, 1, 2, 3]);
    assert_eq!(result[2].ops, vec![4, 5, 6]);
    assert_eq!(result[2].param_indices, vec![4, 5]);
    assert_eq!(result[2].following, vec![7, 8, 9]);
}

#[test]
fn test_scaled_variable_dependencies() {
    let circuit = parameterized_qubit_circuit();
    let deps = circuit.variable_deps();

    assert_eq!(
        deps[&4],
        vec![ParameterDependency {
            op_index: 6,
            param_slot: 0
        }]
    );
    let uses_of_b: Vec<usize> = deps[&1].iter().map(|d| d.op_index).collect();
    assert_eq!(uses_of_b, vec![1, 4, 8, 19]);
    assert_eq!(circuit.num_variables(), 6);
}

#[test]
fn test_layers_cover_every_operation_once() {
    let circuit = parameterized_qubit_circuit();
    let flattened: Vec<usize> = circuit.layers().into_iter().flat_map(|l| l.ops).collect();
    assert_eq!(flattened, circuit.operation_indices());
}

#[test]
fn test_render_qubit_circuit() {
    let circuit = parameterized_qubit_circuit();

    let symbolic = circuit.render(None).unwrap();
    assert_eq!(symbolic.lines().count(), 5);
    assert!(symbolic.contains("RX((4 * x[4]))"));
    assert!(symbolic.contains("Var[H]"));
    assert!(symbolic.contains("Sample[X]"));

    let numeric = circuit
        .render(Some(&[0.1, 0.2, 0.3, 47.0 / 17.0, 0.5, 0.6]))
        .unwrap();
    assert!(numeric.contains("RX(2.000)"));
    assert!(numeric.contains("RX(2.765)"));
}

#[test]
fn test_queue_serializes_to_json() {
    let nodes = vec![
        CircuitNode::from(Operator::rx(2.0 * Parameter::variable(0), 0)),
        CircuitNode::from(Operator::cnot(0, 1)),
        CircuitNode::from(measure::var(Operator::pauli_z(1)).unwrap()),
    ];

    let json = serde_json::to_string(&nodes).unwrap();
    let back: Vec<CircuitNode> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, nodes);

    let graph = CircuitGraph::new(back, qgraph_ir::variable_deps(&nodes));
    assert_eq!(graph.wire_indices(1u32), &[1, 2]);
}
