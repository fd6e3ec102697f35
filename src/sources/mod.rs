//! Log and diff collaborators used by the triage and diff-fetch stages.

pub mod git;
pub mod logs;
pub mod traits;

pub use git::GitDiffSource;
pub use logs::ExecutorLogSource;
pub use traits::{DiffSource, LogSource};
