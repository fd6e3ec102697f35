//! Shared-state workflow: typed state and merge rules, the static stage
//! graph, and the engine that walks it.

mod engine;
pub mod graph;
mod stage;
pub mod state;

pub use engine::{Workflow, WorkflowBuilder};
pub use graph::{ENTRY, Route, StageId, needs_code_review, route, successors, validate_graph};
pub use stage::Stage;
pub use state::{
    ActionRecord, Approvals, Decision, Incident, Message, PlanStep, Review, Role, Severity,
    Signal, StateUpdate, WorkflowState,
};
