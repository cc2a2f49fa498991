use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use std::path::{Path, PathBuf};
use tabula_solver::{LpProblem, Solution, Solver};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Solve linear programs with the tableau simplex method", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and print the optimal solution
    Solve {
        /// The problem file
        file: PathBuf,
        /// Maximum number of pivots before giving up
        #[arg(long, default_value_t = 1000)]
        max_iterations: usize,
        /// Tolerance for comparisons against zero
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Print the initial and final tableau
        #[arg(short, long)]
        show_tableau: bool,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Print the initial tableau of a problem file
    Show {
        /// The problem file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Commands::Solve {
            file,
            max_iterations,
            tolerance,
            format,
            show_tableau,
        } => {
            let problem = load(&file)?;
            let solver = Solver::new()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance);

            let mut engine = solver
                .engine(&problem)
                .with_context(|| format!("Building tableau for {}", file.display()))?;
            if show_tableau && matches!(format, Format::Pretty) {
                println!("{}", engine.dump());
            }

            engine.solve();
            let solution = engine.solution().context("Reading solution")?;

            if let Format::Json = format {
                println!("{}", serde_json::to_string_pretty(&solution)?);
                if solution.optimal().is_none() {
                    std::process::exit(1);
                }
                return Ok(());
            }

            match solution {
                Solution::Optimal(optimal) => {
                    println!();
                    println!("Status: OPTIMAL");
                    println!("Optimal value: {:.4}", optimal.objective_value);
                    println!("Variables:");
                    for (i, value) in optimal.values.iter().enumerate() {
                        println!("  x{:<4} {:12.4}", i + 1, value);
                    }
                    if optimal.multiple_solutions {
                        println!("Multiple optimal solutions exist.");
                    }
                    println!("Final basic variables (indices): {:?}", optimal.basis);
                    println!("Iterations: {}", optimal.iterations);
                    if show_tableau {
                        println!("{}", engine.dump());
                    }
                }
                Solution::Unbounded => {
                    println!("Status: UNBOUNDED");
                    println!("The problem has no finite optimal solution.");
                    std::process::exit(1);
                }
                Solution::IterationLimitExceeded => {
                    println!("Status: NO SOLUTION");
                    println!(
                        "No solution found within {} iterations. The problem may be infeasible or cycling.",
                        solver.max_iterations()
                    );
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let problem = load(&file)?;
            Solver::new()
                .engine(&problem)
                .with_context(|| format!("{} cannot be solved", file.display()))?;

            println!("✓ {} is valid", file.display());
            println!("  {} variables", problem.num_variables());
            println!("  {} constraints", problem.num_constraints());
        }
        Commands::Show { file } => {
            let problem = load(&file)?;
            let engine = Solver::new()
                .engine(&problem)
                .with_context(|| format!("Building tableau for {}", file.display()))?;
            println!("{}", engine.dump());
        }
    }

    Ok(())
}

fn load(file: &Path) -> Result<LpProblem> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Reading {}", file.display()))?;
    let problem = tabula_lang::Parser::parse(&source)
        .with_context(|| format!("Parsing {}", file.display()))?;
    log::info!(
        "loaded {}: {} variables, {} constraints",
        file.display(),
        problem.num_variables(),
        problem.num_constraints()
    );
    Ok(problem)
}
