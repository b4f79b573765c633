// src/compile/mod.rs

pub mod gate;
pub mod harvester;
pub mod invoker;
pub mod orchestrator;
pub mod result;
pub mod workspace;

pub use gate::RequestGate;
pub use invoker::{CompilerInvoker, QatCompiler};
pub use orchestrator::CompileOrchestrator;
pub use result::{CompileRequest, CompileResult, FilePos, FileRange, HarvestedResult, Problem};
pub use workspace::{Workspace, WorkspaceGuard, WorkspaceManager};
