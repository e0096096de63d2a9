use clap::{Parser, Subcommand, ValueEnum};
use lpform_core::{
    GeneralReport, ModelError, Orchestrator, Problem, Report, SolveOutcome, TransportReport, canonicalize_general,
    canonicalize_transport,
};
use lpform_solver::{LinearProgram, LpBackend, Simplex};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lpform")]
#[command(about = "Solve general and transportation linear programs", long_about = None)]
struct Cli {
    /// Log to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and print the solution
    Solve {
        /// JSON problem file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Also print the canonical structures sent to the solver
        #[arg(short, long)]
        debug: bool,
        /// Solver backend
        #[arg(short, long, value_enum, default_value_t = BackendKind::Simplex)]
        backend: BackendKind,
        /// Pivot limit per simplex phase
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Pivot tolerance for the simplex backend
        #[arg(long)]
        tolerance: Option<f64>,
        /// Largest phase 1 residual still treated as feasible
        #[arg(long)]
        feasibility_tolerance: Option<f64>,
        /// Wall-clock limit for the solve, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print the canonical form of a problem file
    Canonical {
        /// JSON problem file
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Check a problem file for dimension and balance errors
    Check {
        /// JSON problem file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Simplex,
    #[cfg(feature = "microlp")]
    Microlp,
}

type DynBackend = Box<dyn LpBackend + Send + Sync>;

fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { Level::TRACE } else { Level::DEBUG };
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {}", e);
            std::process::exit(1);
        }
    }

    match cli.command {
        Commands::Solve {
            file,
            format,
            debug,
            backend,
            max_iterations,
            tolerance,
            feasibility_tolerance,
            timeout_ms,
        } => {
            let problem = load_problem(&file);

            let backend: DynBackend = match backend {
                BackendKind::Simplex => {
                    let mut simplex = Simplex::new();
                    if let Some(max) = max_iterations {
                        simplex = simplex.with_max_iterations(max);
                    }
                    if let Some(tol) = tolerance {
                        simplex = simplex.with_tolerance(tol);
                    }
                    if let Some(tol) = feasibility_tolerance {
                        simplex = simplex.with_feasibility_tolerance(tol);
                    }
                    Box::new(simplex)
                }
                #[cfg(feature = "microlp")]
                BackendKind::Microlp => Box::new(lpform_solver::Microlp::new()),
            };
            let mut orchestrator = Orchestrator::new(backend);
            if let Some(ms) = timeout_ms {
                orchestrator = orchestrator.with_timeout(Duration::from_millis(ms));
            }

            let report = match orchestrator.solve_problem(&problem) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Model error: {}", e);
                    std::process::exit(1);
                }
            };

            match format {
                Format::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
                    );
                }
                Format::Pretty => {
                    if debug {
                        print_canonical(report.canonical());
                        println!();
                    }
                    match &report {
                        Report::General(r) => print_general(r),
                        Report::Transport(r) => print_transport(r),
                    }
                }
            }

            if !report.outcome().is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Canonical { file, format } => {
            let problem = load_problem(&file);
            let canonical = match canonicalize(&problem) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Model error: {}", e);
                    std::process::exit(1);
                }
            };

            if format == Format::Json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&canonical).unwrap_or_else(|e| format!("Error: {}", e))
                );
            } else {
                print_canonical(&canonical);
            }
        }
        Commands::Check { file } => {
            let problem = load_problem(&file);

            if let Err(e) = canonicalize(&problem) {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            }

            match &problem {
                Problem::General(p) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} problem", p.sense);
                    println!("  {} variables", p.num_variables());
                    println!("  {} constraints", p.constraints.len());
                }
                Problem::Transport(p) => {
                    if let Err(e) = p.check_balance() {
                        eprintln!("✗ {} has errors:", file.display());
                        eprintln!("  {}", e);
                        std::process::exit(1);
                    }
                    println!("✓ {} is valid", file.display());
                    println!("  {} origins", p.origins());
                    println!("  {} destinations", p.destinations());
                    println!("  {} total supply", p.balance().total_supply);
                }
            }
        }
    }
}

fn load_problem(file: &Path) -> Problem {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn canonicalize(problem: &Problem) -> Result<LinearProgram, ModelError> {
    let canonical = match problem {
        Problem::General(p) => canonicalize_general(p.sense, &p.objective, &p.constraints, p.lower_bound)?,
        Problem::Transport(p) => canonicalize_transport(p)?,
    };
    Ok(canonical.program)
}

fn print_canonical(lp: &LinearProgram) {
    println!("Canonical form (minimize):");
    println!("  c     = {}", format_row(&lp.objective));
    if !lp.inequalities.is_empty() {
        println!("  A_ub, b_ub:");
        for row in &lp.inequalities {
            println!("    {} <= {:.2}", format_row(&row.coefficients), row.rhs);
        }
    }
    if !lp.equalities.is_empty() {
        println!("  A_eq, b_eq:");
        for row in &lp.equalities {
            println!("    {} =  {:.2}", format_row(&row.coefficients), row.rhs);
        }
    }
    let bounds: Vec<String> = lp
        .bounds
        .iter()
        .map(|b| format!("[{}, {}]", b.lower, b.upper))
        .collect();
    println!("  bounds = {}", bounds.join(" "));
}

fn format_row(values: &[f64]) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("{:8.2}", v)).collect();
    format!("[{}]", cells.join(""))
}

fn print_general(report: &GeneralReport) {
    let problem = &report.problem;
    let terms: Vec<String> = problem
        .objective
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}*{}", c, lpform_core::variable_label(i)))
        .collect();
    println!("Objective: {} {}", problem.sense, terms.join(" + "));
    println!();

    print_status(&report.outcome);
    let Some(solution) = report.outcome.solution() else {
        if report.outcome == SolveOutcome::Infeasible {
            println!("Check whether the constraints contradict each other.");
        }
        return;
    };

    println!("Objective value: {:.2}", solution.objective_value);
    println!();
    println!("Variables:");
    for (label, value) in solution.iter() {
        println!("  {:6} {:12.2}", label, value);
    }

    let checks = report.audit();
    if !checks.is_empty() {
        println!();
        println!("Constraints:");
        for check in &checks {
            let note = if !check.satisfied {
                "  VIOLATED"
            } else if check.binding {
                "  binding"
            } else {
                ""
            };
            println!(
                "  R{:<3} {:12.2} {:2} {:12.2}   slack {:10.2}{}",
                check.index + 1,
                check.lhs,
                check.relation,
                check.rhs,
                check.slack,
                note
            );
        }
    }
}

fn print_transport(report: &TransportReport) {
    let balance = report.balance;
    println!(
        "Transport: {} origins, {} destinations",
        report.problem.origins(),
        report.problem.destinations()
    );
    println!(
        "Total supply: {:.2}, total demand: {:.2}",
        balance.total_supply, balance.total_demand
    );
    println!();

    print_status(&report.outcome);
    let (Some(solution), Some(shipments)) = (report.outcome.solution(), report.shipments.as_ref()) else {
        if !balance.is_balanced() {
            println!("Supply and demand totals differ; balance the problem before solving.");
        }
        return;
    };

    println!("Minimum total cost: {:.2}", solution.objective_value);
    println!();
    println!("Shipments:");
    for (i, row) in shipments.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:10.2}", v)).collect();
        println!("  O{:<3}{}", i + 1, cells.join(""));
    }

    if let Some(audit) = report.audit() {
        println!();
        for check in &audit.origins {
            println!("  O{:<3} shipped  {:10.2} of {:10.2}", check.index + 1, check.total, check.target);
        }
        for check in &audit.destinations {
            println!("  D{:<3} received {:10.2} of {:10.2}", check.index + 1, check.total, check.target);
        }
    }
}

fn print_status(outcome: &SolveOutcome) {
    println!("Status: {}", outcome.status());
    match outcome {
        SolveOutcome::Optimal(_) => {}
        SolveOutcome::Infeasible => println!("No solution exists that satisfies all constraints."),
        SolveOutcome::Unbounded => println!("The problem has no finite optimal solution."),
        SolveOutcome::SolverError { message } => println!("Solver error: {}", message),
    }
}
