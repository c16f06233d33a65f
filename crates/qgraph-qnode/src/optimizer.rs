//! Gradient-based optimizers for variational circuits.

use tracing::{debug, info};

use crate::error::{QNodeResult, QuantumFunctionError};

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Optimal parameter values.
    pub optimal_params: Vec<f64>,
    /// Optimal objective value.
    pub optimal_value: f64,
    /// Number of iterations.
    pub num_iterations: usize,
    /// History of objective values, one per evaluated point.
    pub history: Vec<f64>,
    /// Whether the optimization converged.
    pub converged: bool,
}

/// A first-order optimizer.
pub trait Optimizer {
    /// New parameters after one update with gradient `grad` at `params`.
    ///
    /// `grad` must have one entry per parameter.
    fn apply_grad(&mut self, params: &[f64], grad: &[f64]) -> Vec<f64>;

    /// Maximum number of steps taken by [`Optimizer::minimize`].
    fn max_steps(&self) -> usize;

    /// Convergence tolerance on the change of the objective.
    fn tol(&self) -> f64;

    /// Forget accumulated state such as momentum.
    fn reset(&mut self) {}

    /// Evaluate the gradient at `params` and take one step.
    fn step<G>(&mut self, mut grad_fn: G, params: &[f64]) -> QNodeResult<Vec<f64>>
    where
        G: FnMut(&[f64]) -> QNodeResult<Vec<f64>>,
    {
        let grad = grad_fn(params)?;
        Ok(self.apply_grad(params, &grad))
    }

    /// Minimize an objective returning `(value, gradient)`.
    ///
    /// Stops after [`Optimizer::max_steps`] steps or when the objective
    /// changes by less than [`Optimizer::tol`]. A gradient whose length
    /// differs from the parameters is an error.
    fn minimize<F>(&mut self, objective: F, initial_params: Vec<f64>) -> QNodeResult<OptimizationResult>
    where
        F: FnMut(&[f64]) -> QNodeResult<(f64, Vec<f64>)>,
    {
        self.reset();
        let mut objective = checked(objective);
        let mut params = initial_params;
        let (mut value, mut grad) = objective(&params)?;
        let mut history = vec![value];
        let mut best = (value, params.clone());
        let mut converged = false;
        let mut num_iterations = 0;

        while num_iterations < self.max_steps() {
            params = self.apply_grad(&params, &grad);
            num_iterations += 1;

            let previous = value;
            (value, grad) = objective(&params)?;
            history.push(value);
            if value < best.0 {
                best = (value, params.clone());
            }

            debug!(iteration = num_iterations, value, "optimizer step");

            if (previous - value).abs() < self.tol() {
                converged = true;
                break;
            }
        }

        info!(
            iterations = num_iterations,
            value = best.0,
            converged,
            "optimization finished"
        );

        Ok(OptimizationResult {
            optimal_params: best.1,
            optimal_value: best.0,
            num_iterations,
            history,
            converged,
        })
    }
}

/// Wrap an objective so that gradients of the wrong length are rejected.
fn checked<F>(mut objective: F) -> impl FnMut(&[f64]) -> QNodeResult<(f64, Vec<f64>)>
where
    F: FnMut(&[f64]) -> QNodeResult<(f64, Vec<f64>)>,
{
    move |params: &[f64]| {
        let (value, grad) = objective(params)?;
        if grad.len() != params.len() {
            return Err(QuantumFunctionError::GradientLengthMismatch {
                expected: params.len(),
                got: grad.len(),
            });
        }
        Ok((value, grad))
    }
}

/// Plain gradient descent `x ← x − η ∇f(x)`.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    /// Step size η.
    pub stepsize: f64,
    /// Maximum number of steps.
    pub max_steps: usize,
    /// Convergence tolerance.
    pub tol: f64,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            stepsize: 0.01,
            max_steps: 100,
            tol: 1e-6,
        }
    }
}

impl GradientDescent {
    /// Create a gradient descent optimizer with the given step size.
    pub fn new(stepsize: f64) -> Self {
        Self {
            stepsize,
            ..Self::default()
        }
    }

    /// Set maximum number of steps.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

impl Optimizer for GradientDescent {
    fn apply_grad(&mut self, params: &[f64], grad: &[f64]) -> Vec<f64> {
        debug_assert_eq!(params.len(), grad.len(), "gradient length must match parameters");
        params
            .iter()
            .zip(grad)
            .map(|(x, g)| x - self.stepsize * g)
            .collect()
    }

    fn max_steps(&self) -> usize {
        self.max_steps
    }

    fn tol(&self) -> f64 {
        self.tol
    }
}

/// Gradient descent with momentum:
///
/// ```text
/// a ← m a + η ∇f(x)
/// x ← x − a
/// ```
#[derive(Debug, Clone)]
pub struct MomentumOptimizer {
    /// Step size η.
    pub stepsize: f64,
    /// Momentum coefficient m.
    pub momentum: f64,
    /// Maximum number of steps.
    pub max_steps: usize,
    /// Convergence tolerance.
    pub tol: f64,
    accumulation: Vec<f64>,
}

impl Default for MomentumOptimizer {
    fn default() -> Self {
        Self {
            stepsize: 0.01,
            momentum: 0.9,
            max_steps: 100,
            tol: 1e-6,
            accumulation: Vec::new(),
        }
    }
}

impl MomentumOptimizer {
    /// Create a momentum optimizer.
    pub fn new(stepsize: f64, momentum: f64) -> Self {
        Self {
            stepsize,
            momentum,
            ..Self::default()
        }
    }

    /// Set maximum number of steps.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

impl Optimizer for MomentumOptimizer {
    fn apply_grad(&mut self, params: &[f64], grad: &[f64]) -> Vec<f64> {
        debug_assert_eq!(params.len(), grad.len(), "gradient length must match parameters");
        if self.accumulation.len() != params.len() {
            self.accumulation = vec![0.0; params.len()];
        }
        for (a, g) in self.accumulation.iter_mut().zip(grad) {
            *a = self.momentum * *a + self.stepsize * g;
        }
        params
            .iter()
            .zip(&self.accumulation)
            .map(|(x, a)| x - a)
            .collect()
    }

    fn max_steps(&self) -> usize {
        self.max_steps
    }

    fn tol(&self) -> f64 {
        self.tol
    }

    fn reset(&mut self) {
        self.accumulation.clear();
    }
}
