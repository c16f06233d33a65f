//! Quantum nodes: a quantum function bound to a device.

use std::fmt;

use qgraph_ir::{CircuitGraph, Parameter};
use tracing::{debug, info, instrument};

use crate::config::QNodeConfig;
use crate::device::Device;
use crate::error::{QNodeResult, QuantumFunctionError};
use crate::gradient::{self, GradientOptions};
use crate::tape::Tape;

/// Signature of a quantum function: records onto the tape using the
/// symbolic arguments.
pub type QuantumFunction = dyn Fn(&mut Tape, &[Parameter]) -> QNodeResult<()>;

/// A quantum function together with the device that evaluates it.
///
/// The function is recorded once per argument count into a cached
/// [`CircuitGraph`]; evaluation and differentiation only substitute
/// argument values.
pub struct QNode<D: Device> {
    device: D,
    qfunc: Box<QuantumFunction>,
    circuit: Option<CircuitGraph>,
    num_args: usize,
    options: GradientOptions,
}

impl<D: Device> QNode<D> {
    /// Bind a quantum function to a device.
    pub fn new<F>(device: D, qfunc: F) -> Self
    where
        F: Fn(&mut Tape, &[Parameter]) -> QNodeResult<()> + 'static,
    {
        Self {
            device,
            qfunc: Box::new(qfunc),
            circuit: None,
            num_args: 0,
            options: GradientOptions::default(),
        }
    }

    /// Set the gradient options.
    #[must_use]
    pub fn with_options(mut self, options: GradientOptions) -> Self {
        self.options = options;
        self
    }

    /// Take the gradient options from a configuration.
    #[must_use]
    pub fn with_config(self, config: &QNodeConfig) -> Self {
        self.with_options(config.gradient_options())
    }

    /// Get the gradient options.
    pub fn options(&self) -> &GradientOptions {
        &self.options
    }

    /// Get the device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Get the device mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The recorded circuit, if constructed.
    pub fn circuit(&self) -> Option<&CircuitGraph> {
        self.circuit.as_ref()
    }

    /// Record the quantum function with `num_args` symbolic arguments.
    ///
    /// The circuit is cached and only re-recorded when the argument count
    /// changes.
    pub fn construct(&mut self, num_args: usize) -> QNodeResult<&CircuitGraph> {
        let circuit = match self.circuit.take() {
            Some(circuit) if self.num_args == num_args => circuit,
            _ => self.record(num_args)?,
        };
        self.num_args = num_args;
        Ok(self.circuit.insert(circuit))
    }

    #[instrument(skip(self), fields(device = self.device.name()))]
    fn record(&self, num_args: usize) -> QNodeResult<CircuitGraph> {
        let mut tape = Tape::new();
        (self.qfunc)(&mut tape, &Tape::variables(num_args))?;
        let circuit = tape.into_graph()?;
        self.device.check(&circuit)?;

        debug!(
            operations = circuit.operation_indices().len(),
            observables = circuit.observable_indices().len(),
            depth = circuit.depth(),
            "constructed circuit"
        );
        Ok(circuit)
    }

    /// Run `f` on the circuit constructed for `args` and the device.
    fn with_circuit<T>(
        &mut self,
        args: &[f64],
        f: impl FnOnce(&mut D, &CircuitGraph, &GradientOptions) -> QNodeResult<T>,
    ) -> QNodeResult<T> {
        let expected = self.construct(args.len())?.num_variables();
        if expected > args.len() {
            return Err(QuantumFunctionError::ArgumentCountMismatch {
                expected,
                got: args.len(),
            });
        }

        let Self {
            device,
            circuit: Some(circuit),
            options,
            ..
        } = self
        else {
            return Err(QuantumFunctionError::NotConstructed);
        };
        f(device, circuit, options)
    }

    /// Evaluate the observables for the given arguments.
    pub fn evaluate(&mut self, args: &[f64]) -> QNodeResult<Vec<f64>> {
        self.with_circuit(args, |device, circuit, _| {
            gradient::execute(device, circuit, args)
        })
    }

    /// Jacobian of the observables with respect to all arguments, as a
    /// `num_observables × args.len()` matrix.
    pub fn jacobian(&mut self, args: &[f64]) -> QNodeResult<Vec<Vec<f64>>> {
        let wrt: Vec<usize> = (0..args.len()).collect();
        self.jacobian_wrt(args, &wrt)
    }

    /// Jacobian with respect to the arguments in `wrt` only; other columns
    /// are zero.
    pub fn jacobian_wrt(&mut self, args: &[f64], wrt: &[usize]) -> QNodeResult<Vec<Vec<f64>>> {
        let jac = self.with_circuit(args, |device, circuit, options| {
            gradient::jacobian(device, circuit, args, wrt, options)
        })?;
        info!(
            observables = jac.len(),
            arguments = args.len(),
            "evaluated jacobian"
        );
        Ok(jac)
    }

    /// Draw the recorded circuit; see [`CircuitGraph::render`].
    pub fn draw(&self, args: Option<&[f64]>) -> QNodeResult<String> {
        let circuit = self
            .circuit
            .as_ref()
            .ok_or(QuantumFunctionError::NotConstructed)?;
        Ok(circuit.render(args)?)
    }
}

impl<D: Device> fmt::Debug for QNode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QNode")
            .field("device", &self.device.name())
            .field("circuit", &self.circuit)
            .field("num_args", &self.num_args)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
