//! Pipeline orchestrator implementation.
//!
//! `start_slate` validates the request, creates the campaign and dispatches
//! the enrich stage inline; every later stage is a durable queue job claimed
//! by the background worker once its due time passes. The worker gates each
//! dispatch on a best-effort status probe of the previous stage's task, with
//! the fixed delay as the fallback heuristic. A failed dispatch halts the
//! chain: the job is marked failed and no successor is ever enqueued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::audit::{AuditHandle, PipelineEvent};
use crate::dispatcher::{TaskDispatcher, TaskRequest, TaskState};
use crate::metrics;
use crate::source::{validate_platform_tag, SourceRef};
use crate::store::{Campaign, NewCampaign, SlateStore, StageRecord};

use super::config::PipelineConfig;
use super::prompts::{self, StageInputs};
use super::schedule::{JobStatus, StageJob, StageQueue};
use super::stage::Stage;
use super::types::{PipelineError, StartSlateRequest, WorkerStatus};

/// The pipeline orchestrator - starts slates and drives their stage chains.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    store: Arc<dyn SlateStore>,
    queue: Arc<dyn StageQueue>,
    dispatcher: Arc<dyn TaskDispatcher>,
    audit: Option<AuditHandle>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn SlateStore>,
        queue: Arc<dyn StageQueue>,
        dispatcher: Arc<dyn TaskDispatcher>,
        audit: Option<AuditHandle>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            store,
            queue,
            dispatcher,
            audit,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start a slate pipeline for a source reference.
    ///
    /// Validates the request, creates the campaign, dispatches the enrich
    /// stage and enqueues the mine-angles job. A dispatch failure propagates
    /// to the caller and leaves the chain halted at enrich.
    pub async fn start_slate(&self, request: StartSlateRequest) -> Result<String, PipelineError> {
        let source = SourceRef::parse(&request.source_ref)?;
        validate_platform_tag(&request.platform)?;

        let campaign = self.store.create_campaign(NewCampaign {
            source_ref: source.raw,
            platform: request.platform,
            metadata: request.metadata,
        })?;

        metrics::SLATES_STARTED.inc();
        info!(
            "Started slate campaign {} for {} ({})",
            campaign.id, campaign.source_ref, campaign.platform
        );

        if let Some(ref audit) = self.audit {
            audit
                .emit(PipelineEvent::SlateStarted {
                    campaign_id: campaign.id.clone(),
                    source_ref: campaign.source_ref.clone(),
                    platform: campaign.platform.clone(),
                })
                .await;
        }

        Self::dispatch_stage(
            &self.store,
            &self.dispatcher,
            &self.audit,
            &campaign,
            Stage::Enrich,
        )
        .await?;

        self.queue.enqueue(
            &campaign.id,
            Stage::MineAngles,
            Utc::now() + self.config.stage_delay(),
        )?;

        Ok(campaign.id)
    }

    /// Start the background stage worker.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Stage worker already running");
            return;
        }

        info!("Starting stage worker");
        self.spawn_worker_loop();
    }

    /// Stop the stage worker gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Stage worker not running");
            return;
        }

        info!("Stopping stage worker");
        let _ = self.shutdown_tx.send(());

        // Give the worker a moment to finish the current tick
        tokio::time::sleep(Duration::from_millis(100)).await;

        info!("Stage worker stopped");
    }

    /// Current worker status.
    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            running: self.running.load(Ordering::Relaxed),
            pending_jobs: self.queue.count_by_status(JobStatus::Pending).unwrap_or(0),
            dispatched_jobs: self
                .queue
                .count_by_status(JobStatus::Dispatched)
                .unwrap_or(0),
            failed_jobs: self.queue.count_by_status(JobStatus::Failed).unwrap_or(0),
        }
    }

    /// Spawn the stage worker loop task.
    fn spawn_worker_loop(&self) {
        let running = Arc::clone(&self.running);
        let store = Arc::clone(&self.store);
        let queue = Arc::clone(&self.queue);
        let dispatcher = Arc::clone(&self.dispatcher);
        let config = self.config.clone();
        let audit = self.audit.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Stage worker loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Stage worker received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(config.worker_poll_interval_ms)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = Self::process_due_jobs(
                            &store,
                            &queue,
                            &dispatcher,
                            &config,
                            &audit,
                        ).await {
                            warn!("Stage worker error: {}", e);
                        }
                    }
                }
            }
            info!("Stage worker loop stopped");
        });
    }

    /// Claim and process all currently due jobs.
    async fn process_due_jobs(
        store: &Arc<dyn SlateStore>,
        queue: &Arc<dyn StageQueue>,
        dispatcher: &Arc<dyn TaskDispatcher>,
        config: &PipelineConfig,
        audit: &Option<AuditHandle>,
    ) -> Result<(), PipelineError> {
        let jobs = queue.due(Utc::now(), config.claim_batch)?;

        for job in jobs {
            if let Err(e) =
                Self::process_job(store, queue, dispatcher, config, audit, &job).await
            {
                // The failing campaign's chain is halted; other campaigns
                // keep advancing.
                warn!(
                    "Stage {} halted for campaign {}: {}",
                    job.stage, job.campaign_id, e
                );
            }
        }

        Ok(())
    }

    /// Process one due stage job.
    async fn process_job(
        store: &Arc<dyn SlateStore>,
        queue: &Arc<dyn StageQueue>,
        dispatcher: &Arc<dyn TaskDispatcher>,
        config: &PipelineConfig,
        audit: &Option<AuditHandle>,
        job: &StageJob,
    ) -> Result<(), PipelineError> {
        let Some(campaign) = store.get_campaign(&job.campaign_id)? else {
            queue.mark_failed(job.id, "campaign no longer exists")?;
            return Err(PipelineError::CampaignNotFound(job.campaign_id.clone()));
        };

        // Idempotency: a stage already recorded as dispatched is not
        // re-submitted; just repair the queue state and make sure the
        // successor exists (covers a crash between dispatch and enqueue).
        if campaign.is_dispatched(job.stage) {
            debug!(
                "Stage {} already dispatched for campaign {}, completing job",
                job.stage, campaign.id
            );
            queue.mark_dispatched(job.id)?;
            if let Some(next) = job.stage.next() {
                queue.enqueue(&campaign.id, next, Utc::now() + config.stage_delay())?;
            }
            return Ok(());
        }

        // Gate on the previous stage's task where the service reports status;
        // a task still queued or running defers this job one delay interval.
        // No usable status means the fixed delay already did the waiting.
        if let Some(prev) = job.stage.prev() {
            if let Some(task_id) = campaign.task_id_for(prev) {
                match dispatcher.poll(task_id).await {
                    Ok(Some(TaskState::Queued)) | Ok(Some(TaskState::Running)) => {
                        let until = Utc::now() + config.stage_delay();
                        queue.defer(job.id, until)?;
                        metrics::STAGE_DEFERRALS.inc();
                        debug!(
                            "Deferred stage {} for campaign {} until {}",
                            job.stage, campaign.id, until
                        );
                        if let Some(audit) = audit {
                            audit
                                .emit(PipelineEvent::StageDeferred {
                                    campaign_id: campaign.id.clone(),
                                    stage: job.stage,
                                    task_id: task_id.to_string(),
                                    until,
                                })
                                .await;
                        }
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(
                            "Status probe for task {} failed, falling back to timer: {}",
                            task_id, e
                        );
                    }
                }
            }
        }

        match Self::dispatch_stage(store, dispatcher, audit, &campaign, job.stage).await {
            Ok(_) => {
                queue.mark_dispatched(job.id)?;
                if let Some(next) = job.stage.next() {
                    queue.enqueue(&campaign.id, next, Utc::now() + config.stage_delay())?;
                }
                Ok(())
            }
            Err(e) => {
                // Chain halts here: the job is failed and no successor is
                // ever enqueued. No retry.
                queue.mark_failed(job.id, &e.to_string())?;
                Err(e)
            }
        }
    }

    /// Build one stage's task specification and submit it.
    ///
    /// Records the dispatch outcome on the campaign either way.
    async fn dispatch_stage(
        store: &Arc<dyn SlateStore>,
        dispatcher: &Arc<dyn TaskDispatcher>,
        audit: &Option<AuditHandle>,
        campaign: &Campaign,
        stage: Stage,
    ) -> Result<String, PipelineError> {
        let inputs = Self::stage_inputs(store, campaign, stage)?;
        let spec = prompts::task_spec(stage, campaign, &inputs);

        let request = TaskRequest::new(spec)
            .with_mode(stage.mode())
            .with_connectors(stage.connectors().iter().copied());

        let started = Instant::now();
        match dispatcher.submit(request).await {
            Ok(handle) => {
                let duration = started.elapsed();
                store.record_stage(&campaign.id, stage, StageRecord::dispatched(&handle.id))?;

                metrics::STAGE_DISPATCHES
                    .with_label_values(&[stage.as_str(), "ok"])
                    .inc();
                metrics::STAGE_DISPATCH_DURATION
                    .with_label_values(&[stage.as_str()])
                    .observe(duration.as_secs_f64());

                info!(
                    "Dispatched stage {} for campaign {} as task {}",
                    stage, campaign.id, handle.id
                );

                if let Some(audit) = audit {
                    audit
                        .emit(PipelineEvent::StageDispatched {
                            campaign_id: campaign.id.clone(),
                            stage,
                            task_id: handle.id.clone(),
                            duration_ms: duration.as_millis() as u64,
                        })
                        .await;
                }

                Ok(handle.id)
            }
            Err(e) => {
                let error_text = e.to_string();

                // Best effort: the dispatch error is the one worth surfacing
                // even if recording it fails too.
                if let Err(store_err) =
                    store.record_stage(&campaign.id, stage, StageRecord::failed(&error_text))
                {
                    warn!(
                        "Failed to record dispatch failure for campaign {}: {}",
                        campaign.id, store_err
                    );
                }

                metrics::STAGE_DISPATCHES
                    .with_label_values(&[stage.as_str(), "error"])
                    .inc();

                warn!(
                    "Stage {} dispatch failed for campaign {}: {}",
                    stage, campaign.id, error_text
                );

                if let Some(audit) = audit {
                    audit
                        .emit(PipelineEvent::StageDispatchFailed {
                            campaign_id: campaign.id.clone(),
                            stage,
                            error: error_text,
                        })
                        .await;
                }

                Err(e.into())
            }
        }
    }

    /// Load the persisted upstream entities a stage's specification needs.
    fn stage_inputs(
        store: &Arc<dyn SlateStore>,
        campaign: &Campaign,
        stage: Stage,
    ) -> Result<StageInputs, PipelineError> {
        let mut inputs = StageInputs::default();
        match stage {
            Stage::PlanSchedule => {
                inputs.angles = store.list_angles(&campaign.id)?;
            }
            Stage::AssembleAssets => {
                inputs.posts = store.list_posts(&campaign.id)?;
            }
            _ => {}
        }
        Ok(inputs)
    }
}
