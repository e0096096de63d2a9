mod backend;
#[cfg(feature = "microlp")]
mod microlp_backend;
mod program;
#[cfg(feature = "serde")]
pub mod serde_float;
mod simplex;

pub use backend::{BackendError, LpBackend, RawSolution};
#[cfg(feature = "microlp")]
pub use microlp_backend::Microlp;
pub use program::{Bound, LinearProgram, ProgramError, Row};
pub use simplex::Simplex;
