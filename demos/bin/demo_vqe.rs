//! VQE (Variational Quantum Eigensolver) Demo
//!
//! Two variational workflows on the state-vector device: training the
//! weights of a measured Hamiltonian on a fixed circuit, and minimizing the
//! energy of a model Hamiltonian with parameter-shift gradients.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use qgraph_demos::hamiltonian::{model_ground_energy, model_hamiltonian};
use qgraph_demos::vqe::{LearnHamiltonianRunner, VqeOptimizer, VqeRunner};
use qgraph_demos::{
    create_spinner, print_header, print_history, print_result, print_section, print_success,
};
use qgraph_qnode::{QNodeConfig, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "demo-vqe")]
#[command(about = "Variational quantum eigensolver demos")]
struct Args {
    /// YAML configuration file (gradient method, logging)
    #[arg(short, long, env = "QGRAPH_CONFIG")]
    config: Option<String>,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the weights of w₀X + w₁Y − w₂Z on a fixed circuit
    Learn {
        /// Gradient descent step size
        #[arg(long, default_value = "0.1")]
        stepsize: f64,

        /// Number of steps
        #[arg(short, long, default_value = "100")]
        steps: usize,

        /// Seed for the initial weights
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Minimize the energy of the two-qubit model Hamiltonian
    Vqe {
        /// Number of entangling layers
        #[arg(short, long, default_value = "1")]
        reps: usize,

        /// Step size
        #[arg(long, default_value = "0.2")]
        stepsize: f64,

        /// Maximum optimization steps
        #[arg(short, long, default_value = "200")]
        steps: usize,

        /// Optimizer
        #[arg(short, long, value_enum, default_value_t = OptimizerArg::Gd)]
        optimizer: OptimizerArg,

        /// Seed for the initial parameters
        #[arg(long, default_value = "7")]
        seed: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OptimizerArg {
    /// Gradient descent
    Gd,
    /// Momentum
    Momentum,
}

impl From<OptimizerArg> for VqeOptimizer {
    fn from(arg: OptimizerArg) -> Self {
        match arg {
            OptimizerArg::Gd => VqeOptimizer::GradientDescent,
            OptimizerArg::Momentum => VqeOptimizer::Momentum,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = QNodeConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging).map_err(|e| anyhow::anyhow!("{e}"))?;

    match args.command {
        Command::Learn {
            stepsize,
            steps,
            seed,
        } => {
            let runner = LearnHamiltonianRunner::new()
                .with_stepsize(stepsize)
                .with_max_steps(steps)
                .with_seed(seed);
            let result = runner.run()?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            print_header("Learning Hamiltonian Weights");
            print_section("Fixed Circuit");
            print_result("State", "(|00⟩ + |01⟩ + |11⟩)/√3");
            print_result("Gates", "Rot(0.4, 0.3, 1.3) on 0, CNOT(0, 1)");
            let [x, y, z] = result.expectations;
            print_result("⟨X₁⟩", format!("{x:.6}"));
            print_result("⟨Y₁⟩", format!("{y:.6}"));
            print_result("⟨Z₁⟩", format!("{z:.6}"));

            print_section("Training");
            print_result("Initial weights", format!("{:.4?}", result.initial_weights));
            print_result("Optimized weights", format!("{:.4?}", result.weights));
            print_history(&result.history, 10);

            println!();
            print_success("Training complete");
        }

        Command::Vqe {
            reps,
            stepsize,
            steps,
            optimizer,
            seed,
        } => {
            let hamiltonian = model_hamiltonian();
            let runner = VqeRunner::new(hamiltonian.clone())
                .with_reps(reps)
                .with_stepsize(stepsize)
                .with_max_steps(steps)
                .with_optimizer(optimizer.into())
                .with_gradient(config.gradient_options());

            let spinner = (!args.json).then(|| create_spinner("Optimizing..."));
            let result = runner.run(seed)?;
            if let Some(pb) = spinner {
                pb.finish_with_message("Optimization complete");
            }

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            print_header("VQE Model Hamiltonian");
            print_section("Problem Setup");
            println!("{hamiltonian}");
            print_result("Parameters", runner.num_parameters());
            print_result("Gradient method", format!("{:?}", config.diff_method));

            let mut node = runner.qnode();
            if let Ok(drawing) = node.construct(runner.num_parameters()).and_then(|c| {
                c.render(Some(result.optimal_params.as_slice()))
                    .map_err(Into::into)
            }) {
                print_section("Circuit");
                println!("{drawing}");
            }

            let exact = model_ground_energy();
            print_section("Results");
            print_result("Optimal energy", format!("{:.6}", result.optimal_energy));
            print_result("Exact ground state", format!("{exact:.6}"));
            print_result("Error", format!("{:.2e}", (result.optimal_energy - exact).abs()));
            print_result("Iterations", result.iterations);
            print_result("Evaluations", result.evaluations);
            print_result("Converged", if result.converged { "Yes" } else { "No" });

            print_section("Energy Convergence");
            print_history(&result.energy_history, 10);

            println!();
            print_success("VQE demo complete!");
        }
    }

    Ok(())
}
