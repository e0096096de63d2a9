pub mod canonical;
pub mod model;
pub mod orchestrator;
pub mod outcome;
pub mod report;
pub mod transport;

pub use canonical::{CanonicalProgram, ModelError, canonicalize_general, canonicalize_transport};
pub use model::{GeneralProblem, Problem, RawConstraint, Relation, Sense, TransportProblem};
pub use orchestrator::Orchestrator;
pub use outcome::{Solution, SolveOutcome, route_label, variable_label};
pub use report::{ConstraintCheck, FlowCheck, GeneralReport, Report, TransportAudit, TransportReport};
pub use transport::{Balance, flat_index, flatten, reshape, split_index};
