// src/compile/orchestrator.rs
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::compile::gate::RequestGate;
use crate::compile::harvester;
use crate::compile::invoker::{CompilerInvoker, QatCompiler};
use crate::compile::result::{CompileRequest, HarvestedResult};
use crate::compile::workspace::{WorkspaceGuard, WorkspaceManager};
use crate::config::AppConfig;
use crate::errors::{Result, ServerError};

/// Sequences one compile request: gate, provision, write source, invoke,
/// harvest, destroy. The workspace is destroyed on every path once it exists,
/// and nothing is retried.
#[derive(Clone)]
pub struct CompileOrchestrator {
    gate: RequestGate,
    workspaces: WorkspaceManager,
    compiler: Arc<dyn CompilerInvoker>,
    permits: Arc<Semaphore>,
}

impl CompileOrchestrator {
    pub fn new(
        gate: RequestGate,
        workspaces: WorkspaceManager,
        compiler: Arc<dyn CompilerInvoker>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            gate,
            workspaces,
            compiler,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Orchestrator driving the real `qat` executable.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            RequestGate::new(config.confirmation_key.clone()),
            WorkspaceManager::new(&config.compile_dir),
            Arc::new(QatCompiler::from_config(config)),
            config.max_concurrent_compiles,
        )
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Decode a raw request body and compile it.
    pub async fn handle(&self, body: &[u8]) -> Result<HarvestedResult> {
        let request: CompileRequest = self.gate.decode(body)?;
        self.compile(request).await
    }

    pub async fn compile(&self, request: CompileRequest) -> Result<HarvestedResult> {
        self.gate.confirm(request.confirmation_key.as_deref())?;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServerError::ProcessError("compile queue is closed".to_string()))?;

        // The pipeline runs as its own task so a dropped HTTP request cannot
        // interrupt it between provisioning and cleanup. The compiler is
        // bounded by its own deadline.
        let this = self.clone();
        let task = tokio::spawn(async move {
            let _permit = permit;
            this.run(request).await
        });

        task.await
            .map_err(|e| ServerError::ProcessError(format!("compile task failed: {}", e)))?
    }

    async fn run(&self, request: CompileRequest) -> Result<HarvestedResult> {
        let started = Instant::now();
        let guard = self.workspaces.provision().await?;
        let id = guard.workspace().id;

        log::info!(
            "Compiling request {} ({} bytes, submitted {})",
            id,
            request.content.len(),
            request.time.as_deref().unwrap_or("-")
        );

        let outcome = self.build(&guard, &request.content).await;
        guard.destroy().await;

        match &outcome {
            Ok(harvested) => log::info!(
                "Compile {} finished in {}ms: status={} errors={}",
                id,
                started.elapsed().as_millis(),
                harvested.result.status,
                harvested.result.error_count()
            ),
            Err(e) => log::warn!("Compile {} failed: {}", id, e),
        }

        outcome
    }

    async fn build(&self, guard: &WorkspaceGuard, content: &str) -> Result<HarvestedResult> {
        let ws = guard.workspace();
        guard.write_source(content).await?;
        self.compiler.invoke(&ws.source_path, &ws.build_dir).await?;
        harvester::harvest(&ws.build_dir).await
    }
}
