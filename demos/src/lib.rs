//! qgraph Demo Suite
//!
//! Variational workflows built on quantum nodes:
//!
//! - **Learning a Hamiltonian**: a fixed two-qubit circuit whose measured
//!   Hamiltonian weights are trained by gradient descent
//! - **VQE (Variational Quantum Eigensolver)**: parameter-shift gradients of
//!   a Pauli Hamiltonian's energy drive gradient descent or momentum
//!
//! Circuits run on [`device::StateVectorDevice`], a small dense simulator
//! implementing the [`qgraph_qnode::Device`] interface.

pub mod device;
pub mod hamiltonian;
pub mod vqe;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for long-running demo operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print a short history, at most `points` evenly spaced entries.
pub fn print_history(history: &[f64], points: usize) {
    let step = (history.len() / points.max(1)).max(1);
    for (i, value) in history.iter().enumerate().step_by(step) {
        println!("  Step {i:4}: {value:.6}");
    }
}
