//! Property-based tests for circuit graph invariants.

use proptest::prelude::*;
use qgraph_ir::{CircuitGraph, CircuitNode, Operator, Parameter, Wire, measure};

const MAX_WIRES: u32 = 5;

/// Gate operations used to build random circuits.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    RX(usize, u32),
    RY(f64, u32),
    CNOT(u32, u32),
    CRZ(usize, u32, u32),
    Toffoli(u32, u32, u32),
}

impl GateOp {
    fn into_node(self) -> CircuitNode {
        match self {
            GateOp::H(w) => Operator::hadamard(w),
            GateOp::RX(v, w) => Operator::rx(Parameter::variable(v), w),
            GateOp::RY(theta, w) => Operator::ry(theta, w),
            GateOp::CNOT(c, t) => Operator::cnot(c, t),
            GateOp::CRZ(v, c, t) => Operator::crz(2.0 * Parameter::variable(v), c, t),
            GateOp::Toffoli(a, b, t) => Operator::toffoli(a, b, t),
        }
        .into()
    }
}

fn arb_distinct_pair() -> impl Strategy<Value = (u32, u32)> {
    (0..MAX_WIRES, 1..MAX_WIRES).prop_map(|(a, offset)| (a, (a + offset) % MAX_WIRES))
}

fn arb_gate_op() -> impl Strategy<Value = GateOp> {
    prop_oneof![
        (0..MAX_WIRES).prop_map(GateOp::H),
        (0_usize..4, 0..MAX_WIRES).prop_map(|(v, w)| GateOp::RX(v, w)),
        (-3.0_f64..3.0, 0..MAX_WIRES).prop_map(|(t, w)| GateOp::RY(t, w)),
        arb_distinct_pair().prop_map(|(c, t)| GateOp::CNOT(c, t)),
        (0_usize..4, arb_distinct_pair()).prop_map(|(v, (c, t))| GateOp::CRZ(v, c, t)),
        Just(GateOp::Toffoli(0, 1, 2)),
    ]
}

/// Random operations followed by one expectation per measured wire.
fn arb_circuit() -> impl Strategy<Value = CircuitGraph> {
    (
        prop::collection::vec(arb_gate_op(), 0..=25),
        prop::collection::vec(any::<bool>(), MAX_WIRES as usize),
    )
        .prop_map(|(ops, measured)| {
            let mut queue: Vec<CircuitNode> = ops.into_iter().map(GateOp::into_node).collect();
            for (w, _) in (0..MAX_WIRES).zip(measured).filter(|(_, m)| *m) {
                queue.push(measure::expval(Operator::pauli_z(w)).unwrap().into());
            }
            CircuitGraph::from_queue(queue)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Operations on pairwise disjoint wires never depend on each other.
    #[test]
    fn disjoint_wires_have_no_edges(n in 1_u32..20) {
        let queue: Vec<CircuitNode> = (0..n).map(|w| Operator::hadamard(w).into()).collect();
        let circuit = CircuitGraph::from_queue(queue);
        prop_assert_eq!(circuit.num_edges(), 0);
        prop_assert_eq!(circuit.layers().len(), 1);
    }

    /// Edges only point forward, so no node reaches itself.
    #[test]
    fn no_node_is_its_own_ancestor(circuit in arb_circuit()) {
        for n in 0..circuit.num_nodes() {
            prop_assert!(!circuit.ancestors(&[n]).contains(&n));
            prop_assert!(!circuit.descendants(&[n]).contains(&n));

            let descendants: Vec<usize> = circuit.descendants(&[n]).into_iter().collect();
            if !descendants.is_empty() {
                prop_assert!(circuit.ancestors(&descendants).contains(&n));
            }
        }
        for (source, target) in circuit.edges() {
            prop_assert!(source < target);
        }
    }

    /// `wire_indices` lists exactly the nodes touching the wire, in order.
    #[test]
    fn wire_indices_match_node_wires(circuit in arb_circuit()) {
        for w in 0..MAX_WIRES {
            let expected: Vec<usize> = circuit
                .nodes()
                .enumerate()
                .filter(|(_, node)| node.wires().contains(&Wire(w)))
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(circuit.wire_indices(w), expected.as_slice());
        }
    }

    /// Concatenated layers reproduce the operation list exactly once each,
    /// and no layer contains an internal dependency.
    #[test]
    fn layers_partition_operations(circuit in arb_circuit()) {
        let layers = circuit.layers();
        let flattened: Vec<usize> = layers.iter().flat_map(|l| l.ops.iter().copied()).collect();
        prop_assert_eq!(flattened, circuit.operation_indices());

        for layer in &layers {
            let ancestors = circuit.ancestors(&layer.ops);
            prop_assert!(layer.ops.iter().all(|op| !ancestors.contains(op)));
        }

        let views: Vec<_> = circuit.iterate_layers().collect();
        prop_assert_eq!(views.len(), layers.len());
        for (view, layer) in views.iter().zip(&layers) {
            prop_assert_eq!(&view.ops, &layer.ops);
            prop_assert!(view.preceding.iter().all(|p| !view.following.contains(p)));
        }
    }

    /// Replacing a node keeps every incident edge.
    #[test]
    fn update_node_preserves_edges(circuit in arb_circuit()) {
        let mut circuit = circuit;
        let edges = circuit.edges();
        let wire_map: Vec<Vec<usize>> = (0..MAX_WIRES)
            .map(|w| circuit.wire_indices(w).to_vec())
            .collect();

        for index in circuit.operation_indices() {
            let Some(op) = circuit.node(index).and_then(CircuitNode::operation) else {
                continue;
            };
            let replacement = op.with_shifted_param(0, 0.5);
            circuit.update_node(index, replacement).unwrap();
        }

        prop_assert_eq!(circuit.edges(), edges);
        for w in 0..MAX_WIRES {
            prop_assert_eq!(circuit.wire_indices(w), wire_map[w as usize].as_slice());
        }
    }
}
