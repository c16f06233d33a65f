//! Jacobians of quantum circuits.
//!
//! Gradients are computed layer by layer: for every layer that depends on
//! requested variables, each dependent gate parameter is shifted in place
//! with [`CircuitGraph::update_node`] on a copy of the graph and the circuit
//! is executed twice. The partial derivative with respect to the gate
//! parameter is then scaled by `∂param/∂x[i]` (the chain rule through the
//! parameter expression).
//!
//! Analytic gates use the two-term parameter-shift rule
//!
//! ```text
//! ∂f/∂θ = [f(θ + s) − f(θ − s)] / (2 sin s)
//! ```
//!
//! and every other differentiable gate a central finite difference.
//!
//! A variance is quadratic in the state, so the two-term rule does not apply
//! to it directly. Shifted gates are instead evaluated on copies of the
//! circuit measuring `⟨A⟩` and `⟨A²⟩`, and combined as
//!
//! ```text
//! ∂var(A) = ∂⟨A²⟩ − 2 ⟨A⟩ ∂⟨A⟩
//! ```
//!
//! Observables without a closed-form square fall back to finite differences.

use std::f64::consts::FRAC_PI_2;

use qgraph_ir::{CircuitGraph, GradMethod, Observable, Operator, ParameterDependency, ReturnType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::device::Device;
use crate::error::{QNodeResult, QuantumFunctionError};

/// Default shift of the parameter-shift rule.
pub const DEFAULT_SHIFT: f64 = FRAC_PI_2;

/// Default step of the finite difference.
pub const DEFAULT_FINITE_DIFF_STEP: f64 = 1e-7;

/// How gradients are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMethod {
    /// Parameter shift where available, finite difference elsewhere.
    #[default]
    Best,
    /// Parameter shift; gates without an analytic recipe fall back to
    /// finite differences with a warning.
    ParameterShift,
    /// Finite differences for every gate.
    FiniteDiff,
}

impl std::str::FromStr for DiffMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(DiffMethod::Best),
            "parameter_shift" => Ok(DiffMethod::ParameterShift),
            "finite_diff" => Ok(DiffMethod::FiniteDiff),
            other => Err(format!("Unknown diff method: {other}")),
        }
    }
}

/// Options of the gradient computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientOptions {
    /// Gradient method.
    pub method: DiffMethod,
    /// Shift of the parameter-shift rule.
    pub shift: f64,
    /// Step of the central finite difference.
    pub finite_diff_step: f64,
}

impl Default for GradientOptions {
    fn default() -> Self {
        Self {
            method: DiffMethod::default(),
            shift: DEFAULT_SHIFT,
            finite_diff_step: DEFAULT_FINITE_DIFF_STEP,
        }
    }
}

/// Recipe chosen for one gate parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Recipe {
    Shift(f64),
    Central(f64),
}

impl Recipe {
    fn offset(self) -> f64 {
        match self {
            Recipe::Shift(s) | Recipe::Central(s) => s,
        }
    }

    fn denominator(self) -> f64 {
        match self {
            Recipe::Shift(s) => 2.0 * s.sin(),
            Recipe::Central(h) => 2.0 * h,
        }
    }
}

/// Copies of a circuit used for the analytic derivative of variances.
#[derive(Debug, Clone)]
struct VarianceCircuits {
    /// Variances replaced by expectations of `A`.
    mean: CircuitGraph,
    /// Variances replaced by expectations of `A²`; `None` when every square
    /// is the identity, whose derivative vanishes.
    square: Option<CircuitGraph>,
    /// Rows measuring a variance.
    rows: Vec<bool>,
    /// Unshifted `⟨A⟩` per row, filled on first use.
    means: Option<Vec<f64>>,
}

/// Outcome of preparing variance circuits.
#[derive(Debug, Clone)]
enum VariancePlan {
    /// No variance is measured.
    Absent,
    /// Every variance has a closed-form square.
    Analytic(VarianceCircuits),
    /// A variance of an observable without a closed-form square.
    Unavailable(String),
}

impl VariancePlan {
    fn new(circuit: &CircuitGraph) -> QNodeResult<Self> {
        let observables = circuit.observable_indices();
        let rows: Vec<bool> = observables
            .iter()
            .map(|&i| {
                circuit
                    .node(i)
                    .and_then(|n| n.observable())
                    .is_some_and(|o| o.return_type == ReturnType::Variance)
            })
            .collect();
        if !rows.iter().any(|&v| v) {
            return Ok(VariancePlan::Absent);
        }

        let mut mean = circuit.clone();
        let mut square = circuit.clone();
        let mut needs_square = false;
        for (&index, _) in observables.iter().zip(&rows).filter(|(_, v)| **v) {
            let Some(obs) = circuit.node(index).and_then(|n| n.observable()) else {
                continue;
            };
            let Some(squared) = obs.term.squared() else {
                return Ok(VariancePlan::Unavailable(obs.name()));
            };
            needs_square |= !squared.is_identity();
            mean.update_node(index, Observable {
                term: obs.term.clone(),
                return_type: ReturnType::Expectation,
            })?;
            square.update_node(index, Observable {
                term: squared,
                return_type: ReturnType::Expectation,
            })?;
        }

        Ok(VariancePlan::Analytic(VarianceCircuits {
            mean,
            square: needs_square.then_some(square),
            rows,
            means: None,
        }))
    }
}

/// Run `circuit` with parameter `slot` of operation `index` moved by
/// `±recipe.offset()` and return the scaled difference per observable.
#[allow(clippy::too_many_arguments)]
fn shifted_difference<D: Device + ?Sized>(
    device: &mut D,
    circuit: &CircuitGraph,
    index: usize,
    op: &Operator,
    slot: usize,
    recipe: Recipe,
    args: &[f64],
    executions: &mut usize,
) -> QNodeResult<Vec<f64>> {
    let offset = recipe.offset();
    let mut shifted = circuit.clone();
    shifted.update_node(index, op.with_shifted_param(slot, offset))?;
    let forward = execute(device, &shifted, args)?;
    shifted.update_node(index, op.with_shifted_param(slot, -offset))?;
    let backward = execute(device, &shifted, args)?;
    *executions += 2;

    let denominator = recipe.denominator();
    Ok(forward
        .iter()
        .zip(&backward)
        .map(|(f, b)| (f - b) / denominator)
        .collect())
}

/// Execute a circuit and check the number of results.
pub(crate) fn execute<D: Device + ?Sized>(
    device: &mut D,
    circuit: &CircuitGraph,
    args: &[f64],
) -> QNodeResult<Vec<f64>> {
    let expected = circuit.observable_indices().len();
    let results = device.execute(circuit, args)?;
    if results.len() != expected {
        return Err(QuantumFunctionError::ResultCountMismatch {
            expected,
            got: results.len(),
        });
    }
    Ok(results)
}

/// Jacobian `∂f_o/∂x[i]` for every observable `o` and every variable `i` in
/// `wrt`. Columns of variables not in `wrt` are zero.
///
/// Returns a `num_observables × args.len()` matrix.
#[instrument(skip(device, circuit, args), fields(device = device.name()))]
pub fn jacobian<D: Device + ?Sized>(
    device: &mut D,
    circuit: &CircuitGraph,
    args: &[f64],
    wrt: &[usize],
    options: &GradientOptions,
) -> QNodeResult<Vec<Vec<f64>>> {
    let observables = circuit.observable_indices();
    let mut jac = vec![vec![0.0; args.len()]; observables.len()];
    // Derivatives with respect to a gate parameter, shared by every
    // variable the parameter depends on.
    let mut partials: FxHashMap<ParameterDependency, Vec<f64>> = FxHashMap::default();
    let mut executions = 0usize;
    let mut variance = VariancePlan::new(circuit)?;

    for view in circuit.iterate_layers() {
        let variables: Vec<usize> = view
            .param_indices
            .iter()
            .copied()
            .filter(|v| wrt.contains(v) && *v < args.len())
            .collect();
        if variables.is_empty() {
            continue;
        }

        // Observables downstream of the layer; the others do not depend on it.
        let affected: Vec<bool> = observables
            .iter()
            .map(|o| view.following.contains(o))
            .collect();
        if !affected.iter().any(|&a| a) {
            continue;
        }

        for &variable in &variables {
            let uses = circuit
                .variable_deps()
                .get(&variable)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for &dep in uses.iter().filter(|d| view.ops.contains(&d.op_index)) {
                let Some(op) = circuit.node(dep.op_index).and_then(|n| n.operation()) else {
                    continue;
                };
                let Some(param) = op.params.get(dep.param_slot) else {
                    continue;
                };

                let chain = param.derivative(variable, args)?;
                if chain == 0.0 {
                    continue;
                }

                if !partials.contains_key(&dep) {
                    let mut recipe = match (options.method, op.kind.grad_method()) {
                        (_, GradMethod::None) => {
                            return Err(QuantumFunctionError::NotDifferentiable {
                                name: op.name().to_string(),
                                index: dep.op_index,
                            });
                        }
                        (DiffMethod::FiniteDiff, _) | (DiffMethod::Best, GradMethod::FiniteDiff) => {
                            Recipe::Central(options.finite_diff_step)
                        }
                        (DiffMethod::ParameterShift, GradMethod::FiniteDiff) => {
                            warn!(
                                op = op.name(),
                                index = dep.op_index,
                                "no parameter-shift recipe, using finite differences"
                            );
                            Recipe::Central(options.finite_diff_step)
                        }
                        (_, GradMethod::Analytic) => Recipe::Shift(options.shift),
                    };

                    if let (Recipe::Shift(_), VariancePlan::Unavailable(name)) = (recipe, &variance) {
                        warn!(
                            op = op.name(),
                            index = dep.op_index,
                            observable = %name,
                            "no closed-form square for variance, using finite differences"
                        );
                        recipe = Recipe::Central(options.finite_diff_step);
                    }

                    let partial: Vec<f64> = match (recipe, &mut variance) {
                        (Recipe::Shift(_), VariancePlan::Analytic(var)) => {
                            if var.means.is_none() {
                                var.means = Some(execute(device, &var.mean, args)?);
                                executions += 1;
                            }
                            let means = var.means.clone().unwrap_or_default();
                            let d_mean = shifted_difference(
                                device,
                                &var.mean,
                                dep.op_index,
                                op,
                                dep.param_slot,
                                recipe,
                                args,
                                &mut executions,
                            )?;
                            let d_square = match &var.square {
                                Some(square) => Some(shifted_difference(
                                    device,
                                    square,
                                    dep.op_index,
                                    op,
                                    dep.param_slot,
                                    recipe,
                                    args,
                                    &mut executions,
                                )?),
                                None => None,
                            };
                            (0..observables.len())
                                .map(|row| {
                                    if !var.rows[row] {
                                        return d_mean[row];
                                    }
                                    let d_sq = d_square.as_ref().map_or(0.0, |d| d[row]);
                                    d_sq - 2.0 * means[row] * d_mean[row]
                                })
                                .collect()
                        }
                        _ => shifted_difference(
                            device,
                            circuit,
                            dep.op_index,
                            op,
                            dep.param_slot,
                            recipe,
                            args,
                            &mut executions,
                        )?,
                    };

                    let partial = partial
                        .into_iter()
                        .zip(&affected)
                        .map(|(d, &a)| if a { d } else { 0.0 })
                        .collect();
                    partials.insert(dep, partial);
                }

                for (row, d) in jac.iter_mut().zip(&partials[&dep]) {
                    row[variable] += chain * d;
                }
            }
        }
    }

    debug!(executions, "computed jacobian");
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_method_parsing() {
        assert_eq!("best".parse::<DiffMethod>(), Ok(DiffMethod::Best));
        assert_eq!(
            "parameter_shift".parse::<DiffMethod>(),
            Ok(DiffMethod::ParameterShift)
        );
        assert!("adjoint".parse::<DiffMethod>().is_err());
    }

    fn circuit_measuring(obs: Observable) -> CircuitGraph {
        CircuitGraph::from_queue([
            qgraph_ir::CircuitNode::from(Operator::rx(qgraph_ir::Parameter::variable(0), 0)),
            obs.into(),
        ])
    }

    #[test]
    fn test_variance_plan() {
        let expval = circuit_measuring(qgraph_ir::measure::expval(Operator::pauli_z(0)).unwrap());
        assert!(matches!(VariancePlan::new(&expval).unwrap(), VariancePlan::Absent));

        let var = circuit_measuring(qgraph_ir::measure::var(Operator::pauli_z(0)).unwrap());
        let VariancePlan::Analytic(plan) = VariancePlan::new(&var).unwrap() else {
            panic!("PauliZ has a closed-form square");
        };
        assert_eq!(plan.rows, vec![true]);
        assert!(plan.square.is_none());
        assert_eq!(
            plan.mean.observables()[0].return_type,
            ReturnType::Expectation
        );

        let number = circuit_measuring(
            qgraph_ir::measure::var(Operator::number_operator(0)).unwrap(),
        );
        assert!(matches!(
            VariancePlan::new(&number).unwrap(),
            VariancePlan::Unavailable(ref name) if name == "NumberOperator"
        ));
    }

    #[test]
    fn test_recipe_denominators() {
        let shift = Recipe::Shift(FRAC_PI_2);
        assert!((shift.denominator() - 2.0).abs() < 1e-12);
        assert_eq!(Recipe::Central(0.5).denominator(), 1.0);
    }
}
