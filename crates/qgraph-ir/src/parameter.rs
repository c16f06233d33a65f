//! Gate parameter expressions.
//!
//! A quantum function is recorded once with symbolic arguments `x[0]..x[n-1]`.
//! Gate parameters are expressions over those variables, so a single recorded
//! circuit can be evaluated and differentiated for any argument vector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// A constant or symbolic gate parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// A constant numeric value.
    Constant(f64),
    /// Positional argument `x[i]` of the quantum function.
    Variable(usize),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<Parameter>),
    /// Addition.
    Add(Box<Parameter>, Box<Parameter>),
    /// Subtraction.
    Sub(Box<Parameter>, Box<Parameter>),
    /// Multiplication.
    Mul(Box<Parameter>, Box<Parameter>),
    /// Division.
    Div(Box<Parameter>, Box<Parameter>),
}

impl Parameter {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        Parameter::Constant(value)
    }

    /// Create a free variable referring to argument `index`.
    pub fn variable(index: usize) -> Self {
        Parameter::Variable(index)
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        Parameter::Pi
    }

    /// Check if this expression depends on any free variable.
    pub fn is_free(&self) -> bool {
        match self {
            Parameter::Variable(_) => true,
            Parameter::Constant(_) | Parameter::Pi => false,
            Parameter::Neg(e) => e.is_free(),
            Parameter::Add(a, b)
            | Parameter::Sub(a, b)
            | Parameter::Mul(a, b)
            | Parameter::Div(a, b) => a.is_free() || b.is_free(),
        }
    }

    /// Try to evaluate without arguments. Returns `None` for free expressions.
    pub fn as_f64(&self) -> Option<f64> {
        if self.is_free() {
            return None;
        }
        self.evaluate(&[]).ok()
    }

    /// Get the indices of all free variables in this expression.
    pub fn variables(&self) -> BTreeSet<usize> {
        let mut set = BTreeSet::new();
        self.collect_variables(&mut set);
        set
    }

    fn collect_variables(&self, set: &mut BTreeSet<usize>) {
        match self {
            Parameter::Constant(_) | Parameter::Pi => {}
            Parameter::Variable(index) => {
                set.insert(*index);
            }
            Parameter::Neg(e) => e.collect_variables(set),
            Parameter::Add(a, b)
            | Parameter::Sub(a, b)
            | Parameter::Mul(a, b)
            | Parameter::Div(a, b) => {
                a.collect_variables(set);
                b.collect_variables(set);
            }
        }
    }

    /// Evaluate the expression for the given arguments.
    pub fn evaluate(&self, args: &[f64]) -> IrResult<f64> {
        match self {
            Parameter::Constant(v) => Ok(*v),
            Parameter::Pi => Ok(PI),
            Parameter::Variable(index) => {
                args.get(*index)
                    .copied()
                    .ok_or(IrError::UnboundVariable {
                        index: *index,
                        available: args.len(),
                    })
            }
            Parameter::Neg(e) => Ok(-e.evaluate(args)?),
            Parameter::Add(a, b) => Ok(a.evaluate(args)? + b.evaluate(args)?),
            Parameter::Sub(a, b) => Ok(a.evaluate(args)? - b.evaluate(args)?),
            Parameter::Mul(a, b) => Ok(a.evaluate(args)? * b.evaluate(args)?),
            Parameter::Div(a, b) => {
                let divisor = b.evaluate(args)?;
                if divisor == 0.0 {
                    return Err(IrError::InvalidParameter(format!("division by zero in {self}")));
                }
                Ok(a.evaluate(args)? / divisor)
            }
        }
    }

    /// Partial derivative with respect to `x[variable]`, evaluated at `args`.
    pub fn derivative(&self, variable: usize, args: &[f64]) -> IrResult<f64> {
        match self {
            Parameter::Constant(_) | Parameter::Pi => Ok(0.0),
            Parameter::Variable(index) => Ok(if *index == variable { 1.0 } else { 0.0 }),
            Parameter::Neg(e) => Ok(-e.derivative(variable, args)?),
            Parameter::Add(a, b) => {
                Ok(a.derivative(variable, args)? + b.derivative(variable, args)?)
            }
            Parameter::Sub(a, b) => {
                Ok(a.derivative(variable, args)? - b.derivative(variable, args)?)
            }
            Parameter::Mul(a, b) => Ok(a.derivative(variable, args)? * b.evaluate(args)?
                + a.evaluate(args)? * b.derivative(variable, args)?),
            Parameter::Div(a, b) => {
                let denominator = b.evaluate(args)?;
                if denominator == 0.0 {
                    return Err(IrError::InvalidParameter(format!("division by zero in {self}")));
                }
                let numerator = a.derivative(variable, args)? * denominator
                    - a.evaluate(args)? * b.derivative(variable, args)?;
                Ok(numerator / (denominator * denominator))
            }
        }
    }

    /// Return this expression offset by a constant, folding constants.
    #[must_use]
    pub fn shifted(&self, shift: f64) -> Self {
        match self {
            Parameter::Constant(v) => Parameter::Constant(v + shift),
            _ => Parameter::Add(Box::new(self.clone()), Box::new(Parameter::Constant(shift))),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Constant(v) => write!(f, "{v}"),
            Parameter::Variable(index) => write!(f, "x[{index}]"),
            Parameter::Pi => write!(f, "π"),
            Parameter::Neg(e) => write!(f, "-({e})"),
            Parameter::Add(a, b) => write!(f, "({a} + {b})"),
            Parameter::Sub(a, b) => write!(f, "({a} - {b})"),
            Parameter::Mul(a, b) => write!(f, "({a} * {b})"),
            Parameter::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Constant(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Constant(f64::from(value))
    }
}

impl From<&Parameter> for Parameter {
    fn from(value: &Parameter) -> Self {
        value.clone()
    }
}

impl std::ops::Add for Parameter {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Parameter::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for Parameter {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Parameter::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for Parameter {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Parameter::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul<Parameter> for f64 {
    type Output = Parameter;

    fn mul(self, rhs: Parameter) -> Self::Output {
        Parameter::Mul(Box::new(Parameter::Constant(self)), Box::new(rhs))
    }
}

impl std::ops::Div for Parameter {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Parameter::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for Parameter {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Parameter::Neg(Box::new(self))
    }
}
