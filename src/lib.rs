#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod observability;
pub mod policy;
pub mod report;
pub mod retrieval;
pub mod runner;
pub mod sources;
pub mod stages;
pub mod workflow;

pub use config::Config;
pub use error::{OpsError, Result};
pub use executor::{CommandExecutor, CommandResult};
pub use runner::{Collaborators, RunOutcome, RunRequest, Runner};
pub use workflow::{StageId, Workflow, WorkflowState};
