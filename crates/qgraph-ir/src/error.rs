//! Error types for the IR crate.

use crate::wire::Wire;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operator received the wrong number of parameters.
    #[error("Operator '{name}' takes {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the operator.
        name: String,
        /// Expected number of parameters.
        expected: usize,
        /// Actual number of parameters provided.
        got: usize,
    },

    /// Operator received the wrong number of wires.
    #[error("Operator '{name}' acts on {expected} wires, got {got}")]
    WireCountMismatch {
        /// Name of the operator.
        name: String,
        /// Expected number of wires.
        expected: usize,
        /// Actual number of wires provided.
        got: usize,
    },

    /// The same wire appears twice in one operator.
    #[error("Duplicate wire {wire} in operator{}", format_op_context(.name))]
    DuplicateWire {
        /// The duplicate wire.
        wire: Wire,
        /// Optional operator name for context.
        name: Option<String>,
    },

    /// A free variable refers past the end of the argument list.
    #[error("Variable x[{index}] is unbound: {available} arguments supplied")]
    UnboundVariable {
        /// Index of the variable.
        index: usize,
        /// Number of arguments that were supplied.
        available: usize,
    },

    /// A parameter expression could not be evaluated.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A matrix argument has the wrong shape or properties.
    #[error("Invalid matrix for '{name}': {reason}")]
    InvalidMatrix {
        /// Name of the operator.
        name: String,
        /// Why the matrix was rejected.
        reason: String,
    },

    /// No node with this queue index exists in the graph.
    #[error("Invalid node index {0}")]
    InvalidNode(usize),

    /// Replacement node is not of the same class as the node it replaces.
    #[error("Node {index} is an {expected}, cannot replace it with an {got}")]
    NodeKindMismatch {
        /// Queue index of the node.
        index: usize,
        /// Class of the existing node.
        expected: &'static str,
        /// Class of the replacement.
        got: &'static str,
    },

    /// Replacement node acts on different wires.
    #[error("Replacement for node {index} must act on wires {expected:?}, got {got:?}")]
    WireMismatch {
        /// Queue index of the node.
        index: usize,
        /// Wires of the existing node.
        expected: Vec<Wire>,
        /// Wires of the replacement.
        got: Vec<Wire>,
    },

    /// Operator cannot be measured.
    #[error("{name} is not an observable: cannot be used with {function}")]
    NotAnObservable {
        /// Name of the operator.
        name: String,
        /// Measurement function that rejected it.
        function: &'static str,
    },

    /// Tensor product factors share a wire.
    #[error("Tensor product factors overlap on wire {0}")]
    OverlappingTensor(Wire),

    /// Tensor product without any factor.
    #[error("Tensor product needs at least one factor")]
    EmptyTensor,
}

/// Helper function to format optional operator context.
#[allow(clippy::ref_option)]
fn format_op_context(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" (operator: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
