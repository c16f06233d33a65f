//! qgraph Circuit Graph
//!
//! This crate provides the data structures for recording a quantum function
//! and compiling it into a dependency graph that drives evaluation and
//! gradient computation.
//!
//! # Overview
//!
//! A quantum function is recorded once, with symbolic arguments `x[0]..`,
//! into an ordered queue of operations followed by observables. The queue is
//! turned into a [`CircuitGraph`]: one node per queue entry, with an edge from
//! every node to the next node acting on the same wire.
//!
//! # Core Components
//!
//! - **Wires**: [`Wire`] identifies a qubit or continuous-variable mode
//! - **Parameters**: [`Parameter`] for constant and symbolic gate parameters
//! - **Operators**: [`Operator`] and [`OperatorKind`] with per-kind arity and
//!   gradient recipe
//! - **Observables**: [`Observable`] built with [`measure::expval`],
//!   [`measure::var`], [`measure::sample`] and [`measure::probs`]
//! - **Graph**: [`CircuitGraph`] with ancestor/descendant queries, per-wire
//!   indices, in-place node updates, layering and text rendering
//!
//! # Example: Ancestors and Layers
//!
//! ```rust
//! use qgraph_ir::{measure, CircuitGraph, CircuitNode, Operator, Parameter};
//!
//! let queue: Vec<CircuitNode> = vec![
//!     Operator::rx(Parameter::variable(0), 0).into(),
//!     Operator::ry(Parameter::variable(1), 1).into(),
//!     Operator::cnot(0, 1).into(),
//!     measure::expval(Operator::pauli_z(1)).unwrap().into(),
//! ];
//! let circuit = CircuitGraph::from_queue(queue);
//!
//! assert_eq!(circuit.ancestors(&[3]).into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
//! assert_eq!(circuit.wire_indices(1), &[1, 2, 3]);
//!
//! let layers = circuit.layers();
//! assert_eq!(layers.len(), 2);
//! assert_eq!(layers[0].param_indices, vec![0, 1]);
//! ```

pub mod error;
pub mod graph;
pub mod measure;
pub mod observable;
pub mod operator;
pub mod parameter;
pub mod render;
pub mod wire;

pub use error::{IrError, IrResult};
pub use graph::{
    CircuitGraph, CircuitNode, Layer, LayerView, NodeIndex, ParameterDependency, VariableDeps,
    variable_deps,
};
pub use observable::{Observable, ObservableTerm, ReturnType, Tensor};
pub use operator::{GradMethod, Operator, OperatorKind, identity_matrix};
pub use parameter::Parameter;
pub use wire::{Wire, wires};
