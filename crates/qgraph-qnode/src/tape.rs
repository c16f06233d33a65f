//! Recording of quantum functions.
//!
//! A quantum function receives a [`Tape`] and symbolic arguments and records
//! operators on it, followed by at least one measurement:
//!
//! ```
//! use qgraph_ir::{Operator, Parameter};
//! use qgraph_qnode::{QNodeResult, Tape};
//!
//! fn circuit(tape: &mut Tape, x: &[Parameter]) -> QNodeResult<()> {
//!     tape.apply(Operator::rx(&x[0], 0))?;
//!     tape.apply(Operator::cnot(0, 1))?;
//!     tape.expval(Operator::pauli_z(1))?;
//!     Ok(())
//! }
//!
//! let mut tape = Tape::new();
//! circuit(&mut tape, &Tape::variables(1)).unwrap();
//! let graph = tape.into_graph().unwrap();
//! assert_eq!(graph.num_nodes(), 3);
//! ```

use qgraph_ir::{
    CircuitGraph, CircuitNode, Observable, ObservableTerm, Operator, Parameter, Wire, measure,
};
use tracing::trace;

use crate::error::{QNodeResult, QuantumFunctionError};

/// Ordered record of the operations and observables of a quantum function.
#[derive(Debug, Clone, Default)]
pub struct Tape {
    queue: Vec<CircuitNode>,
    num_observables: usize,
}

impl Tape {
    /// Create an empty tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbolic arguments `x[0]..x[n-1]`.
    pub fn variables(n: usize) -> Vec<Parameter> {
        (0..n).map(Parameter::variable).collect()
    }

    /// Record an operation.
    pub fn apply(&mut self, op: Operator) -> QNodeResult<&mut Self> {
        if self.num_observables > 0 {
            return Err(QuantumFunctionError::OperationAfterObservable {
                name: op.name().to_string(),
            });
        }
        op.validate()?;
        trace!(op = op.name(), wires = ?op.wires, "recorded operation");
        self.queue.push(op.into());
        Ok(self)
    }

    /// Record a measurement.
    pub fn measure(&mut self, obs: Observable) -> QNodeResult<&mut Self> {
        for factor in obs.term.factors() {
            factor.validate()?;
        }
        trace!(obs = %obs.name(), return_type = ?obs.return_type, "recorded observable");
        self.queue.push(obs.into());
        self.num_observables += 1;
        Ok(self)
    }

    /// Record the expectation value of an observable.
    pub fn expval(&mut self, op: impl Into<ObservableTerm>) -> QNodeResult<&mut Self> {
        self.measure(measure::expval(op)?)
    }

    /// Record the variance of an observable.
    pub fn var(&mut self, op: impl Into<ObservableTerm>) -> QNodeResult<&mut Self> {
        self.measure(measure::var(op)?)
    }

    /// Record samples of an observable.
    pub fn sample(&mut self, op: impl Into<ObservableTerm>) -> QNodeResult<&mut Self> {
        self.measure(measure::sample(op)?)
    }

    /// Record the basis state probabilities of some wires.
    pub fn probs(&mut self, wires: impl IntoIterator<Item = Wire>) -> QNodeResult<&mut Self> {
        self.measure(measure::probs(wires)?)
    }

    /// The recorded queue.
    pub fn queue(&self) -> &[CircuitNode] {
        &self.queue
    }

    /// Number of recorded operations.
    pub fn num_operations(&self) -> usize {
        self.queue.len() - self.num_observables
    }

    /// Number of recorded observables.
    pub fn num_observables(&self) -> usize {
        self.num_observables
    }

    /// Build the circuit graph of the recording.
    pub fn into_graph(self) -> QNodeResult<CircuitGraph> {
        if self.num_observables == 0 {
            return Err(QuantumFunctionError::NoObservables);
        }
        Ok(CircuitGraph::from_queue(self.queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgraph_ir::IrError;

    #[test]
    fn test_records_in_order() {
        let x = Tape::variables(2);
        let mut tape = Tape::new();
        tape.apply(Operator::rx(&x[0], 0))
            .unwrap()
            .apply(Operator::ry(&x[1], 1))
            .unwrap();
        tape.expval(Operator::pauli_z(0)).unwrap();
        tape.var(Operator::pauli_x(1)).unwrap();

        assert_eq!(tape.num_operations(), 2);
        assert_eq!(tape.num_observables(), 2);
        assert!(tape.queue()[3].is_observable());
    }

    #[test]
    fn test_operation_after_observable() {
        let mut tape = Tape::new();
        tape.expval(Operator::pauli_z(0)).unwrap();
        let err = tape.apply(Operator::hadamard(0)).unwrap_err();
        assert!(matches!(
            err,
            QuantumFunctionError::OperationAfterObservable { ref name } if name == "Hadamard"
        ));
    }

    #[test]
    fn test_no_observables() {
        let mut tape = Tape::new();
        tape.apply(Operator::hadamard(0)).unwrap();
        assert!(matches!(
            tape.into_graph(),
            Err(QuantumFunctionError::NoObservables)
        ));
    }

    #[test]
    fn test_invalid_operation_rejected() {
        let mut tape = Tape::new();
        let err = tape.apply(Operator::cnot(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            QuantumFunctionError::Ir(IrError::DuplicateWire { .. })
        ));
        assert!(tape.queue().is_empty());
    }

    #[test]
    fn test_non_observable_measurement() {
        let mut tape = Tape::new();
        let err = tape.expval(Operator::rx(0.1, 0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "RX is not an observable: cannot be used with expval"
        );
    }
}
