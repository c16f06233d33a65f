//! Text drawing of a circuit graph.
//!
//! Gates are placed in the earliest column in which every wire they span is
//! free. Multi-wire gates are joined with box-drawing connectors and the
//! observables are drawn in the final columns:
//!
//! ```text
//! 0: ──H──╭C──⟨Z⟩
//! 1: ─────╰X──⟨Z⟩
//! ```

use std::collections::BTreeMap;

use crate::error::IrResult;
use crate::graph::{CircuitGraph, CircuitNode};
use crate::observable::{Observable, ReturnType};
use crate::operator::{Operator, OperatorKind};
use crate::parameter::Parameter;
use crate::wire::Wire;

const WIRE: char = '─';

impl CircuitGraph {
    /// Draw the circuit as text, one line per wire.
    ///
    /// Parameters are shown symbolically (`x[0]`, `(4 * x[4])`) when `args`
    /// is `None` and evaluated otherwise.
    pub fn render(&self, args: Option<&[f64]>) -> IrResult<String> {
        let rows: BTreeMap<Wire, usize> = self
            .wires()
            .into_iter()
            .enumerate()
            .map(|(row, wire)| (wire, row))
            .collect();

        let mut board = Board::new(rows.len());

        for node in self.nodes() {
            if let CircuitNode::Operation(op) = node {
                let labels = op_labels(op, args)?;
                board.place(op.wires.iter().map(|w| rows[w]).zip(labels).collect());
            }
        }

        board.close_gates();

        for node in self.nodes() {
            if let CircuitNode::Observable(obs) = node {
                let label = observable_label(obs);
                board.place(
                    obs.wires()
                        .iter()
                        .map(|w| (rows[w], label.clone()))
                        .collect(),
                );
            }
        }

        let label_width = rows.keys().map(|w| w.to_string().len()).max().unwrap_or(0);
        let lines: Vec<String> = rows
            .keys()
            .enumerate()
            .map(|(row, wire)| {
                let mut line = format!("{:>label_width$}: ", wire.to_string());
                for (column, width) in board.columns.iter().zip(board.widths()) {
                    line.push(WIRE);
                    line.push(WIRE);
                    let cell = column[row].as_deref().unwrap_or("");
                    line.push_str(cell);
                    line.extend(std::iter::repeat_n(WIRE, width - cell.chars().count()));
                }
                line
            })
            .collect();

        Ok(lines.join("\n"))
    }
}

/// Column layout under construction; `columns[c][row]` is a cell.
struct Board {
    columns: Vec<Vec<Option<String>>>,
    /// Per row, the first column that is still free.
    frontier: Vec<usize>,
}

impl Board {
    fn new(num_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            frontier: vec![0; num_rows],
        }
    }

    /// Place one gate given `(row, label)` for each of its wires.
    fn place(&mut self, cells: Vec<(usize, String)>) {
        let (Some(lo), Some(hi)) = (
            cells.iter().map(|(r, _)| *r).min(),
            cells.iter().map(|(r, _)| *r).max(),
        ) else {
            return;
        };

        // Rows between the ends are blocked as well, for the connector.
        let column = self.frontier[lo..=hi].iter().copied().max().unwrap_or(0);
        while self.columns.len() <= column {
            self.columns.push(vec![None; self.frontier.len()]);
        }

        let labels: BTreeMap<usize, String> = cells.into_iter().collect();
        for row in lo..=hi {
            let cell = match labels.get(&row) {
                Some(label) if lo == hi => label.clone(),
                Some(label) => format!("{}{label}", connector(row, lo, hi)),
                None => "│".to_string(),
            };
            self.columns[column][row] = Some(cell);
            self.frontier[row] = column + 1;
        }
    }

    /// Move every row past the last gate column.
    fn close_gates(&mut self) {
        let end = self.columns.len();
        self.frontier.iter_mut().for_each(|f| *f = end);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .map(|column| {
                column
                    .iter()
                    .flatten()
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn connector(row: usize, lo: usize, hi: usize) -> char {
    if row == lo {
        '╭'
    } else if row == hi {
        '╰'
    } else {
        '├'
    }
}

fn format_params(params: &[Parameter], args: Option<&[f64]>) -> IrResult<String> {
    let formatted: Vec<String> = match args {
        None => params.iter().map(ToString::to_string).collect(),
        Some(args) => params
            .iter()
            .map(|p| p.evaluate(args).map(|v| format!("{v:.3}")))
            .collect::<IrResult<_>>()?,
    };
    Ok(formatted.join(","))
}

/// One label per wire of the operator.
fn op_labels(op: &Operator, args: Option<&[f64]>) -> IrResult<Vec<String>> {
    let params = format_params(&op.params, args)?;
    let with_params = |name: &str| format!("{name}({params})");
    let n = op.wires.len();

    let labels = match &op.kind {
        OperatorKind::CNOT => vec!["C".into(), "X".into()],
        OperatorKind::CZ => vec!["C".into(), "Z".into()],
        OperatorKind::CRX => vec!["C".into(), with_params("RX")],
        OperatorKind::CRY => vec!["C".into(), with_params("RY")],
        OperatorKind::CRZ => vec!["C".into(), with_params("RZ")],
        OperatorKind::Toffoli => vec!["C".into(), "C".into(), "X".into()],
        OperatorKind::CSWAP => vec!["C".into(), "SWAP".into(), "SWAP".into()],
        kind => vec![single_label(kind, &with_params); n],
    };
    Ok(labels)
}

fn single_label(kind: &OperatorKind, with_params: &dyn Fn(&str) -> String) -> String {
    match kind {
        OperatorKind::Identity => "I".into(),
        OperatorKind::PauliX => "X".into(),
        OperatorKind::PauliY => "Y".into(),
        OperatorKind::PauliZ => "Z".into(),
        OperatorKind::Hadamard => "H".into(),
        OperatorKind::S => "S".into(),
        OperatorKind::T => "T".into(),
        OperatorKind::SWAP => "SWAP".into(),
        OperatorKind::QubitUnitary(_) => "U".into(),
        OperatorKind::QubitStateVector(_) => "|Ψ⟩".into(),
        OperatorKind::BasisState(bits) => {
            let bits: String = bits.iter().map(|b| b.to_string()).collect();
            format!("|{bits}⟩")
        }
        OperatorKind::Hermitian(_) => "Herm".into(),
        OperatorKind::NumberOperator => "n".into(),
        OperatorKind::Rotation => with_params("R"),
        OperatorKind::Displacement => with_params("D"),
        OperatorKind::Squeezing => with_params("S"),
        OperatorKind::Beamsplitter => with_params("BS"),
        other => with_params(other.name()),
    }
}

fn observable_label(obs: &Observable) -> String {
    let symbols: Vec<String> = obs
        .term
        .factors()
        .iter()
        .map(|op| single_label(&op.kind, &|name| name.to_string()))
        .collect();
    let term = symbols.join("⊗");
    match obs.return_type {
        ReturnType::Expectation => format!("⟨{term}⟩"),
        ReturnType::Variance => format!("Var[{term}]"),
        ReturnType::Sample => format!("Sample[{term}]"),
        ReturnType::Probability => "Probs".into(),
    }
}
