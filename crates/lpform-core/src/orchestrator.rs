use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use lpform_solver::{BackendError, LinearProgram, LpBackend, RawSolution};
use tracing::{debug, warn};

use crate::canonical::{CanonicalProgram, ModelError, canonicalize_general, canonicalize_transport};
use crate::model::{GeneralProblem, Problem, TransportProblem};
use crate::outcome::{Solution, SolveOutcome, route_label, variable_label};
use crate::report::{GeneralReport, Report, TransportReport};
use crate::transport::{reshape, split_index};

/// Why a dispatch produced no backend result
enum DispatchFailure {
    Backend(BackendError),
    TimedOut(Duration),
    Panicked,
    Spawn(String),
}

/// Runs canonical programs on a backend and maps results back to the user's terms.
///
/// Holds no per-solve state, so one orchestrator can serve many requests at once.
pub struct Orchestrator<B> {
    backend: Arc<B>,
    timeout: Option<Duration>,
}

impl<B> Clone for Orchestrator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            timeout: self.timeout,
        }
    }
}

impl<B: LpBackend + Send + Sync + 'static> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            timeout: None,
        }
    }

    /// Bound the wall-clock time of each backend call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Solve a canonical program, naming variable `i` with `labeler(i)`
    pub fn solve<L>(&self, canonical: &CanonicalProgram, labeler: L) -> SolveOutcome
    where
        L: Fn(usize) -> String,
    {
        let program = &canonical.program;
        if let Err(e) = program.validate() {
            return SolveOutcome::SolverError {
                message: format!("invalid canonical program: {}", e),
            };
        }

        debug!(
            backend = self.backend.name(),
            variables = program.num_variables(),
            rows = program.num_rows(),
            "dispatching program"
        );

        let outcome = match self.dispatch(program) {
            Ok(raw) => SolveOutcome::Optimal(Solution {
                labels: (0..raw.values.len()).map(labeler).collect(),
                objective_value: canonical.sense.restore_objective(raw.objective_value),
                values: raw.values,
            }),
            Err(DispatchFailure::Backend(BackendError::Infeasible)) => SolveOutcome::Infeasible,
            Err(DispatchFailure::Backend(BackendError::Unbounded)) => SolveOutcome::Unbounded,
            Err(DispatchFailure::Backend(e)) => SolveOutcome::SolverError { message: e.to_string() },
            Err(DispatchFailure::TimedOut(limit)) => {
                warn!(?limit, "solve timed out");
                SolveOutcome::SolverError {
                    message: format!("solver exceeded the time limit of {:?}", limit),
                }
            }
            Err(DispatchFailure::Panicked) => SolveOutcome::SolverError {
                message: format!("{} backend panicked", self.backend.name()),
            },
            Err(DispatchFailure::Spawn(e)) => SolveOutcome::SolverError {
                message: format!("could not start solver thread: {}", e),
            },
        };

        debug!(status = outcome.status(), "solve finished");
        outcome
    }

    fn dispatch(&self, program: &LinearProgram) -> Result<RawSolution, DispatchFailure> {
        let Some(limit) = self.timeout else {
            let backend = &self.backend;
            return match panic::catch_unwind(AssertUnwindSafe(|| backend.solve(program))) {
                Ok(result) => result.map_err(DispatchFailure::Backend),
                Err(_) => Err(DispatchFailure::Panicked),
            };
        };

        let backend = Arc::clone(&self.backend);
        let program = program.clone();
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("lpform-solve".to_string())
            .spawn(move || {
                // The receiver is gone once the caller has timed out
                let _ = tx.send(backend.solve(&program));
            })
            .map_err(|e| DispatchFailure::Spawn(e.to_string()))?;

        match rx.recv_timeout(limit) {
            Ok(result) => result.map_err(DispatchFailure::Backend),
            Err(RecvTimeoutError::Timeout) => Err(DispatchFailure::TimedOut(limit)),
            Err(RecvTimeoutError::Disconnected) => Err(DispatchFailure::Panicked),
        }
    }

    /// Canonicalize, solve and package a general problem
    pub fn solve_general(&self, problem: &GeneralProblem) -> Result<GeneralReport, ModelError> {
        let canonical = canonicalize_general(
            problem.sense,
            &problem.objective,
            &problem.constraints,
            problem.lower_bound,
        )?;
        let outcome = self.solve(&canonical, variable_label);

        Ok(GeneralReport {
            problem: problem.clone(),
            canonical: canonical.program,
            outcome,
        })
    }

    /// Canonicalize, solve and reshape a transport problem
    pub fn solve_transport(&self, problem: &TransportProblem) -> Result<TransportReport, ModelError> {
        let canonical = canonicalize_transport(problem)?;
        let origins = problem.origins();
        let destinations = problem.destinations();

        let balance = problem.balance();
        if !balance.is_balanced() {
            warn!(
                supply = balance.total_supply,
                demand = balance.total_demand,
                "transport problem is unbalanced"
            );
        }

        let outcome = self.solve(&canonical, |k| {
            let (i, j) = split_index(k, destinations);
            route_label(i, j)
        });
        let shipments = match outcome.solution() {
            Some(solution) => Some(reshape(&solution.values, origins, destinations)?),
            None => None,
        };

        Ok(TransportReport {
            problem: problem.clone(),
            canonical: canonical.program,
            balance,
            outcome,
            shipments,
        })
    }

    pub fn solve_problem(&self, problem: &Problem) -> Result<Report, ModelError> {
        match problem {
            Problem::General(p) => self.solve_general(p).map(Report::General),
            Problem::Transport(p) => self.solve_transport(p).map(Report::Transport),
        }
    }
}
