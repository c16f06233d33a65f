//! Measurement functions that turn operators into observables.
//!
//! ```
//! use qgraph_ir::{measure, Operator, ReturnType};
//!
//! let obs = measure::expval(Operator::pauli_z(0)).unwrap();
//! assert_eq!(obs.return_type, ReturnType::Expectation);
//!
//! assert!(measure::expval(Operator::rx(0.1, 0)).is_err());
//! ```

use crate::error::{IrError, IrResult};
use crate::observable::{Observable, ObservableTerm, ReturnType};
use crate::operator::Operator;
use crate::wire::Wire;

fn measure(term: ObservableTerm, return_type: ReturnType) -> IrResult<Observable> {
    if let Some(op) = term.factors().iter().find(|op| !op.kind.is_observable()) {
        return Err(IrError::NotAnObservable {
            name: op.name().to_string(),
            function: return_type.function_name(),
        });
    }
    Ok(Observable { term, return_type })
}

/// Expectation value of the supplied observable.
pub fn expval(op: impl Into<ObservableTerm>) -> IrResult<Observable> {
    measure(op.into(), ReturnType::Expectation)
}

/// Variance of the supplied observable.
pub fn var(op: impl Into<ObservableTerm>) -> IrResult<Observable> {
    measure(op.into(), ReturnType::Variance)
}

/// Samples of the supplied observable.
pub fn sample(op: impl Into<ObservableTerm>) -> IrResult<Observable> {
    measure(op.into(), ReturnType::Sample)
}

/// Probabilities of each computational basis state on `wires`.
pub fn probs(wires: impl IntoIterator<Item = Wire>) -> IrResult<Observable> {
    let op = Operator::identity(wires);
    op.validate()?;
    measure(op.into(), ReturnType::Probability)
}
