//! Content workflows: form input in, marketing copy out, behind the trial gate.

pub mod model;
pub mod routes;
pub mod runner;
pub mod templates;

pub use model::{GeneratedContent, WorkflowKind, WorkflowRequest};
pub use routes::{WorkflowRouteState, workflow_routes};
pub use runner::{WorkflowOutcome, WorkflowRunner};
