pub mod bulletins;
pub mod conflicts;
pub mod grade_workflow;
pub mod orchestrator;
pub mod ports;

pub use bulletins::BulletinService;
pub use conflicts::{ConflictPolicy, TimetableService};
pub use grade_workflow::GradeWorkflowService;
pub use orchestrator::{DispatchMode, OrchestratorSettings, SideEffectDispatcher, WorkflowOrchestrator};
