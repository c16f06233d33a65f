//! Error types for quantum nodes and devices.

use qgraph_ir::{IrError, Wire};
use thiserror::Error;

/// Errors raised while recording, evaluating or differentiating a quantum
/// function.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuantumFunctionError {
    /// Invalid operator, observable or graph operation.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// An operation was recorded after the first observable.
    #[error("Operation '{name}' cannot be applied after an observable has been measured")]
    OperationAfterObservable {
        /// Name of the operation.
        name: String,
    },

    /// The quantum function measured nothing.
    #[error("A quantum function must return at least one observable")]
    NoObservables,

    /// The quantum function has not been recorded yet.
    #[error("Quantum function has not been constructed")]
    NotConstructed,

    /// A gate depending on a requested variable has no gradient recipe.
    #[error("Operation '{name}' at index {index} is not differentiable")]
    NotDifferentiable {
        /// Name of the operation.
        name: String,
        /// Queue index of the operation.
        index: usize,
    },

    /// A node acts on a wire the device does not have.
    #[error("Wire {wire} is out of range for a device with {num_wires} wires")]
    WireOutOfRange {
        /// The offending wire.
        wire: Wire,
        /// Number of wires on the device.
        num_wires: u32,
    },

    /// The device cannot apply this operation.
    #[error("Device '{device}' does not support operation '{name}'")]
    UnsupportedOperation {
        /// Name of the operation.
        name: String,
        /// Name of the device.
        device: String,
    },

    /// The device cannot measure this observable.
    #[error("Device '{device}' does not support observable '{name}'")]
    UnsupportedObservable {
        /// Name of the observable.
        name: String,
        /// Name of the device.
        device: String,
    },

    /// Fewer arguments than the circuit refers to.
    #[error("Circuit uses {expected} arguments, got {got}")]
    ArgumentCountMismatch {
        /// Number of variables the circuit refers to.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// An objective returned a gradient of the wrong length.
    #[error("Gradient has {got} entries for {expected} parameters")]
    GradientLengthMismatch {
        /// Number of parameters.
        expected: usize,
        /// Number of gradient entries.
        got: usize,
    },

    /// The device returned the wrong number of results.
    #[error("Device returned {got} results for {expected} observables")]
    ResultCountMismatch {
        /// Number of observables in the circuit.
        expected: usize,
        /// Number of values returned.
        got: usize,
    },

    /// Error raised by the device.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors reported by device implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeviceError {
    /// The circuit contains something the device cannot handle.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The circuit is malformed for this device.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Execution failed.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Parameter evaluation failed.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for quantum node operations.
pub type QNodeResult<T> = Result<T, QuantumFunctionError>;

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
