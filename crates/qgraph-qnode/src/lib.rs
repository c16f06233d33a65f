//! qgraph Quantum Nodes
//!
//! A quantum node binds a quantum function to a [`Device`]. The function is
//! recorded once onto a [`Tape`] with symbolic arguments, compiled into a
//! [`CircuitGraph`](qgraph_ir::CircuitGraph), and then evaluated and
//! differentiated for concrete argument values.
//!
//! # Gradients
//!
//! [`QNode::jacobian`] walks the layers of the circuit graph and applies the
//! parameter-shift rule to gates with an analytic recipe and a central
//! finite difference to the rest. Gate parameters built from arithmetic on
//! the arguments are handled with the chain rule. See [`gradient`].
//!
//! # Example
//!
//! ```rust
//! use qgraph_ir::{CircuitGraph, Operator};
//! use qgraph_qnode::{Device, DeviceCapabilities, DeviceResult, QNode};
//!
//! /// ⟨Z⟩ after RX(θ) on |0⟩ is cos θ.
//! struct Cosine(DeviceCapabilities);
//!
//! impl Device for Cosine {
//!     fn name(&self) -> &str {
//!         &self.0.name
//!     }
//!
//!     fn capabilities(&self) -> &DeviceCapabilities {
//!         &self.0
//!     }
//!
//!     fn execute(&mut self, circuit: &CircuitGraph, args: &[f64]) -> DeviceResult<Vec<f64>> {
//!         let mut value = 1.0;
//!         for op in circuit.operations() {
//!             value *= op.evaluate_params(args)?[0].cos();
//!         }
//!         Ok(vec![value])
//!     }
//! }
//!
//! let device = Cosine(DeviceCapabilities::new("cosine", 1));
//! let mut node = QNode::new(device, |tape, x| {
//!     tape.apply(Operator::rx(&x[0], 0))?;
//!     tape.expval(Operator::pauli_z(0))?;
//!     Ok(())
//! });
//!
//! let value = node.evaluate(&[0.3]).unwrap();
//! let jac = node.jacobian(&[0.3]).unwrap();
//! assert!((value[0] - 0.3f64.cos()).abs() < 1e-12);
//! assert!((jac[0][0] + 0.3f64.sin()).abs() < 1e-9);
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod gradient;
pub mod logging;
pub mod optimizer;
pub mod qnode;
pub mod tape;

pub use config::{ConfigError, LoggingConfig, QNodeConfig};
pub use device::{Device, DeviceCapabilities};
pub use error::{DeviceError, DeviceResult, QNodeResult, QuantumFunctionError};
pub use gradient::{DiffMethod, GradientOptions, jacobian};
pub use logging::{TracingFormat, init_tracing};
pub use optimizer::{GradientDescent, MomentumOptimizer, OptimizationResult, Optimizer};
pub use qnode::{QNode, QuantumFunction};
pub use tape::Tape;
