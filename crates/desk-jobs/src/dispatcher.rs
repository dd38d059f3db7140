//! Job dispatcher - validate, create, schedule, return
//!
//! `submit` validates the request, picks the model client, creates the
//! record, and spawns pipeline execution on its own tokio task. The
//! caller gets the job id back immediately and never blocks on the
//! pipeline. A semaphore bounds how many pipelines run at once; jobs past
//! the limit wait in `queued` rather than being rejected. Errors land on
//! the record as a failed status, never on the process.

use std::collections::HashMap;
use std::sync::Arc;

use desk_core::{AnalysisRequest, Error, Result};
use desk_engine::aggregate::aggregate;
use desk_engine::{AnalysisPipeline, NodeConfig, PipelineConfig};
use desk_llm::ModelClient;
use desk_tools::ToolRegistry;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::record::JobId;
use crate::store::JobStore;

/// Concurrent pipeline runs permitted before jobs wait in the queue
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 8;

/// Accepts submissions and schedules their pipeline runs
pub struct JobDispatcher {
    store: Arc<JobStore>,
    registry: Arc<ToolRegistry>,
    clients: HashMap<String, Arc<dyn ModelClient>>,
    default_provider: String,
    node_config: NodeConfig,
    permits: Arc<Semaphore>,
}

impl JobDispatcher {
    /// Create a dispatcher with one default model client
    ///
    /// The client is registered under its own name and used whenever a
    /// submission does not name a provider.
    pub fn new(
        store: Arc<JobStore>,
        registry: Arc<ToolRegistry>,
        default_client: Arc<dyn ModelClient>,
        node_config: NodeConfig,
    ) -> Self {
        let default_provider = default_client.name().to_string();
        let mut clients = HashMap::new();
        clients.insert(default_provider.clone(), default_client);
        Self {
            store,
            registry,
            clients,
            default_provider,
            node_config,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_JOBS)),
        }
    }

    /// Bound the number of concurrently running pipelines
    ///
    /// Submissions past the bound stay `queued` until a slot frees up;
    /// nothing is rejected for load.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// Register an additional named model client
    pub fn register_client(&mut self, client: Arc<dyn ModelClient>) {
        self.clients.insert(client.name().to_string(), client);
    }

    /// The store this dispatcher writes to
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Submit an analysis request
    ///
    /// Validates before any store mutation, then creates the record and
    /// schedules execution. Returns immediately with the new job id.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<JobId> {
        request.validate()?;
        let client = self.client_for(request.llm_provider.as_deref())?;

        let id = self.store.create(request.clone()).await;
        info!(job_id = %id, symbol = %request.symbol, "job submitted");

        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let node_config = self.node_config.clone();
        let permits = Arc::clone(&self.permits);
        let job_id = id.clone();
        tokio::spawn(async move {
            // The semaphore is never closed while the dispatcher lives
            let Ok(_permit) = permits.acquire_owned().await else {
                error!(job_id = %job_id, "execution pool closed, job abandoned in queue");
                return;
            };
            run_job(store, registry, client, node_config, job_id, request).await;
        });

        Ok(id)
    }

    /// Resolve the model client for an optional provider override
    fn client_for(&self, provider: Option<&str>) -> Result<Arc<dyn ModelClient>> {
        let name = provider.unwrap_or(&self.default_provider);
        self.clients
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidRequest(format!("unknown llm provider: {name}")))
    }
}

/// Execution wrapper for one job
///
/// Transitions the record through the state machine around the pipeline
/// run. Nothing escapes this function; every failure path ends in a
/// `Failed` record.
async fn run_job(
    store: Arc<JobStore>,
    registry: Arc<ToolRegistry>,
    client: Arc<dyn ModelClient>,
    node_config: NodeConfig,
    id: JobId,
    request: AnalysisRequest,
) {
    if let Err(e) = store.mark_running(&id).await {
        error!(job_id = %id, error = %e, "could not mark job running");
        return;
    }

    let config = PipelineConfig::for_request(&request, node_config);
    let pipeline = AnalysisPipeline::new(client, registry, config);
    let outcome = pipeline.run(&request).await;

    if outcome.success {
        let result = aggregate(&outcome);
        if let Err(e) = store.mark_completed(&id, result).await {
            error!(job_id = %id, error = %e, "could not mark job completed");
        } else {
            info!(job_id = %id, "job completed");
        }
    } else {
        let reason = outcome
            .error
            .clone()
            .unwrap_or_else(|| "pipeline failed without detail".to_string());
        if let Err(e) = store.mark_failed(&id, reason).await {
            error!(job_id = %id, error = %e, "could not mark job failed");
        } else {
            info!(job_id = %id, "job failed");
        }
    }
}
