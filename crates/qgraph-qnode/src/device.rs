//! Device interface.
//!
//! A device executes a [`CircuitGraph`] for concrete arguments and returns
//! one value per observable. Devices may keep internal state between
//! executions (a simulator's state vector, a hardware session), which is
//! why [`Device::execute`] takes `&mut self`.

use qgraph_ir::{CircuitGraph, CircuitNode};
use serde::{Deserialize, Serialize};

use crate::error::{DeviceResult, QNodeResult, QuantumFunctionError};

/// What a device can execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Name of the device.
    pub name: String,
    /// Number of wires; valid wires are `0..num_wires`.
    pub num_wires: u32,
    /// Number of shots for sampled results, `None` for exact results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<u32>,
    /// Supported operation names. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
    /// Supported observable names. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observables: Vec<String>,
}

impl DeviceCapabilities {
    /// Create unrestricted capabilities for `num_wires` wires.
    pub fn new(name: impl Into<String>, num_wires: u32) -> Self {
        Self {
            name: name.into(),
            num_wires,
            shots: None,
            operations: Vec::new(),
            observables: Vec::new(),
        }
    }

    /// Restrict the supported operations.
    #[must_use]
    pub fn with_operations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations = names.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the supported observables.
    #[must_use]
    pub fn with_observables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observables = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of shots.
    #[must_use]
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Whether results are exact rather than estimated from samples.
    #[inline]
    pub fn is_analytic(&self) -> bool {
        self.shots.is_none()
    }

    /// Check if an operation is supported.
    pub fn supports_operation(&self, name: &str) -> bool {
        self.operations.is_empty() || self.operations.iter().any(|o| o == name)
    }

    /// Check if an observable is supported.
    pub fn supports_observable(&self, name: &str) -> bool {
        self.observables.is_empty() || self.observables.iter().any(|o| o == name)
    }
}

/// A backend that can execute circuit graphs.
pub trait Device {
    /// Get the name of this device.
    fn name(&self) -> &str;

    /// Get the device capabilities.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Execute the circuit for the given arguments.
    ///
    /// Returns one value per observable, in queue order.
    fn execute(&mut self, circuit: &CircuitGraph, args: &[f64]) -> DeviceResult<Vec<f64>>;

    /// Check a circuit against the device capabilities.
    fn check(&self, circuit: &CircuitGraph) -> QNodeResult<()> {
        let caps = self.capabilities();

        if let Some(&wire) = circuit.wires().iter().find(|w| w.0 >= caps.num_wires) {
            return Err(QuantumFunctionError::WireOutOfRange {
                wire,
                num_wires: caps.num_wires,
            });
        }

        for node in circuit.nodes() {
            match node {
                CircuitNode::Operation(op) => {
                    if !caps.supports_operation(op.name()) {
                        return Err(QuantumFunctionError::UnsupportedOperation {
                            name: op.name().to_string(),
                            device: self.name().to_string(),
                        });
                    }
                }
                CircuitNode::Observable(obs) => {
                    if let Some(factor) = obs
                        .term
                        .factors()
                        .iter()
                        .find(|f| !caps.supports_observable(f.name()))
                    {
                        return Err(QuantumFunctionError::UnsupportedObservable {
                            name: factor.name().to_string(),
                            device: self.name().to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        (**self).capabilities()
    }

    fn execute(&mut self, circuit: &CircuitGraph, args: &[f64]) -> DeviceResult<Vec<f64>> {
        (**self).execute(circuit, args)
    }
}
