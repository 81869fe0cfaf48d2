//! Pipeline lifecycle integration tests.
//!
//! Drive the whole core through its public surface with the mock dispatcher
//! playing the external service: start a slate, advance the chain, simulate
//! the service writing entities back, and watch derived progress move through
//! the stages.

use std::sync::Arc;

use serde_json::json;

use slateforge_core::{
    slate_progress, testing::MockDispatcher, AssetKind, Difficulty, EnrichmentUpdate, JobStatus,
    NewContentAngle, NewInsightReport, NewMediaAsset, NewScheduledPost, PipelineConfig,
    PipelineOrchestrator, PostStatus, SlateStore, SqliteSlateStore, SqliteStageQueue, Stage,
    StageQueue, StageStatus, StartSlateRequest, TaskDispatcher, SLATE_DAYS,
};

/// Test helper wiring the orchestrator to in-memory stores and the mock
/// dispatcher.
struct TestHarness {
    orchestrator: PipelineOrchestrator,
    store: Arc<dyn SlateStore>,
    queue: Arc<dyn StageQueue>,
    dispatcher: Arc<MockDispatcher>,
}

impl TestHarness {
    fn new() -> Self {
        let store: Arc<dyn SlateStore> = Arc::new(SqliteSlateStore::in_memory().unwrap());
        let queue: Arc<dyn StageQueue> = Arc::new(SqliteStageQueue::in_memory().unwrap());
        let dispatcher = Arc::new(MockDispatcher::new());

        let config = PipelineConfig {
            enabled: true,
            stage_delay_secs: 0,
            worker_poll_interval_ms: 10,
            claim_batch: 8,
        };

        let orchestrator = PipelineOrchestrator::new(
            config,
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&dispatcher) as Arc<dyn TaskDispatcher>,
            None,
        );

        Self {
            orchestrator,
            store,
            queue,
            dispatcher,
        }
    }

    async fn start(&self, source_ref: &str) -> String {
        self.orchestrator
            .start_slate(StartSlateRequest {
                source_ref: source_ref.to_string(),
                platform: "tiktok".to_string(),
                metadata: Default::default(),
            })
            .await
            .unwrap()
    }

    /// Let the worker loop claim everything currently due.
    async fn settle(&self) {
        self.orchestrator.start().await;
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        self.orchestrator.stop().await;
    }

    fn stage_statuses(&self, campaign_id: &str) -> Vec<StageStatus> {
        slate_progress(self.store.as_ref(), campaign_id)
            .unwrap()
            .stages
            .iter()
            .map(|s| s.status)
            .collect()
    }

    /// Simulate the external service completing the enrich stage.
    fn service_enriches(&self, campaign_id: &str) {
        self.store
            .apply_enrichment(
                campaign_id,
                EnrichmentUpdate {
                    title: "Midnight Arcade".to_string(),
                    contributors: vec!["Nova Kin".to_string()],
                    palette: vec!["#0e1a40".to_string(), "#ff5e5b".to_string()],
                },
            )
            .unwrap();
    }

    /// Simulate the external service writing the nominal 20 angles, 16 of
    /// them usable.
    fn service_mines_angles(&self, campaign_id: &str) {
        for i in 0..20 {
            let score = if i < 16 { 60 + (i as u8 * 2) % 40 } else { 30 + i as u8 };
            self.store
                .insert_angle(NewContentAngle {
                    campaign_id: campaign_id.to_string(),
                    hook: format!("hook {}", i),
                    alt_hooks: vec![format!("alt hook {}", i)],
                    score,
                    difficulty: Difficulty::Moderate,
                    duration_hint_secs: Some(if i % 2 == 0 { 15 } else { 50 }),
                    trend_ref: None,
                })
                .unwrap();
        }
    }

    /// Simulate the external service planning the nominal 14-post slate.
    fn service_plans_schedule(&self, campaign_id: &str) -> Vec<String> {
        let angles = self.store.list_angles(campaign_id).unwrap();
        let usable: Vec<_> = angles.iter().filter(|a| a.score >= 60).collect();

        let mut post_ids = Vec::new();
        for i in 0..14 {
            let post = self
                .store
                .insert_post(NewScheduledPost {
                    campaign_id: campaign_id.to_string(),
                    angle_id: Some(usable[i % usable.len()].id.clone()),
                    day: (i / 2 + 1) as u8,
                    script: format!("script {}", i),
                    caption: format!("caption {}", i),
                    hashtags: vec!["#newmusic".to_string()],
                    call_to_action: "link in bio".to_string(),
                })
                .unwrap();
            post_ids.push(post.id);
        }
        post_ids
    }

    /// Simulate the external service rendering assets for every post.
    fn service_assembles_assets(&self, post_ids: &[String]) {
        for post_id in post_ids {
            self.store
                .insert_asset(NewMediaAsset {
                    post_id: post_id.clone(),
                    kind: AssetKind::Video,
                    variant: "primary".to_string(),
                    storage_ref: format!("s3://slates/{}.mp4", post_id),
                    generation_params: json!({"duration_secs": 15}),
                    metadata: json!({}),
                })
                .unwrap();
            for variant in ["thumb-a", "thumb-b", "thumb-c"] {
                self.store
                    .insert_asset(NewMediaAsset {
                        post_id: post_id.clone(),
                        kind: AssetKind::Thumbnail,
                        variant: variant.to_string(),
                        storage_ref: format!("s3://slates/{}-{}.png", post_id, variant),
                        generation_params: json!({"palette": ["#0e1a40", "#ff5e5b"]}),
                        metadata: json!({}),
                    })
                    .unwrap();
            }
            self.store
                .update_post_status(post_id, PostStatus::Drafted)
                .unwrap();
        }
    }
}

#[tokio::test]
async fn test_progress_advances_as_service_delivers() {
    let h = TestHarness::new();
    let campaign_id = h.start("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC").await;

    // Nothing delivered yet.
    assert_eq!(
        h.stage_statuses(&campaign_id),
        vec![
            StageStatus::Processing,
            StageStatus::Pending,
            StageStatus::Pending,
            StageStatus::Pending,
            StageStatus::Pending,
        ]
    );

    h.service_enriches(&campaign_id);
    assert_eq!(h.stage_statuses(&campaign_id)[0], StageStatus::Completed);
    assert_eq!(h.stage_statuses(&campaign_id)[1], StageStatus::Processing);

    h.service_mines_angles(&campaign_id);
    assert_eq!(h.stage_statuses(&campaign_id)[1], StageStatus::Completed);
    assert_eq!(h.stage_statuses(&campaign_id)[2], StageStatus::Processing);

    let post_ids = h.service_plans_schedule(&campaign_id);
    assert_eq!(h.stage_statuses(&campaign_id)[2], StageStatus::Completed);
    assert_eq!(h.stage_statuses(&campaign_id)[3], StageStatus::Processing);

    h.service_assembles_assets(&post_ids);
    let statuses = h.stage_statuses(&campaign_id);
    assert_eq!(statuses[3], StageStatus::Completed);
    // The analysis stage reports processing forever.
    assert_eq!(statuses[4], StageStatus::Processing);
}

#[tokio::test]
async fn test_nominal_stage_outputs_meet_contracts() {
    let h = TestHarness::new();
    let campaign_id = h.start("ref://track/123").await;

    h.service_enriches(&campaign_id);
    h.service_mines_angles(&campaign_id);

    // Stage 1 nominal: 20 angles, at least 14 usable, scores in bounds.
    let angles = h.store.list_angles(&campaign_id).unwrap();
    assert_eq!(angles.len(), 20);
    assert!(angles.iter().all(|a| a.score <= 100));
    assert!(angles.iter().filter(|a| a.score >= 60).count() >= 14);

    let post_ids = h.service_plans_schedule(&campaign_id);

    // Stage 2 nominal: 14 posts, no day over 2, all within the horizon.
    let posts = h.store.list_posts(&campaign_id).unwrap();
    assert_eq!(posts.len(), 14);
    for day in 1..=SLATE_DAYS {
        assert!(posts.iter().filter(|p| p.day == day).count() <= 2);
    }
    assert!(posts.iter().all(|p| p.day >= 1 && p.day <= SLATE_DAYS));

    h.service_assembles_assets(&post_ids);

    // Stage 3 nominal: one video and three thumbnails per post, drafted.
    for post_id in &post_ids {
        let assets = h.store.list_assets(post_id).unwrap();
        let videos = assets.iter().filter(|a| a.kind == AssetKind::Video).count();
        let thumbs = assets
            .iter()
            .filter(|a| a.kind == AssetKind::Thumbnail)
            .count();
        assert!(videos >= 1);
        assert_eq!(thumbs, 3);
    }
    let posts = h.store.list_posts(&campaign_id).unwrap();
    assert!(posts.iter().all(|p| p.status == PostStatus::Drafted));

    let stats = h.store.stats(&campaign_id).unwrap();
    assert_eq!(stats.angles, 20);
    assert_eq!(stats.posts, 14);
    assert_eq!(stats.videos, 14);
    assert_eq!(stats.thumbnails, 42);
}

#[tokio::test]
async fn test_worker_walks_chain_while_service_delivers() {
    let h = TestHarness::new();
    let campaign_id = h.start("ref://track/123").await;

    // Service keeps up with the chain as the worker advances it.
    h.service_enriches(&campaign_id);
    h.service_mines_angles(&campaign_id);
    let post_ids = h.service_plans_schedule(&campaign_id);
    h.service_assembles_assets(&post_ids);

    h.settle().await;

    // All five stages dispatched, one task per stage.
    let campaign = h.store.get_campaign(&campaign_id).unwrap().unwrap();
    for stage in Stage::ALL {
        assert!(campaign.is_dispatched(stage));
    }
    assert_eq!(h.dispatcher.submissions().await.len(), 5);

    let jobs = h.queue.jobs_for(&campaign_id).unwrap();
    assert_eq!(jobs.len(), 4);
    assert!(jobs.iter().all(|j| j.status == JobStatus::Dispatched));

    // Later stage specifications were built from the persisted entities.
    let submissions = h.dispatcher.submissions().await;
    let plan_spec = &submissions[2].prompt;
    assert!(plan_spec.contains("usable angles"));
    let assets_spec = &submissions[3].prompt;
    assert!(assets_spec.contains("14 scheduled posts"));

    // The service can keep reporting after the chain: an insight report lands.
    let now = chrono::Utc::now();
    h.store
        .insert_report(NewInsightReport {
            campaign_id: campaign_id.clone(),
            period_start: now - chrono::Duration::days(7),
            period_end: now,
            breakdowns: json!({"by_day": {}}),
            recommendations: vec!["more bridge hooks".to_string()],
            summary: "solid first week".to_string(),
        })
        .unwrap();
    assert_eq!(h.store.list_reports(&campaign_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_campaign_does_not_block_others() {
    let h = TestHarness::new();

    // Both campaigns' enrich dispatches succeed (indices 0 and 1); the first
    // worker-driven submission (index 2) fails, halting whichever campaign's
    // mine-angles it was. Everything else succeeds.
    let first = h.start("ref://track/first").await;
    let second = h.start("ref://track/second").await;
    h.dispatcher.fail_only(2).await;

    h.settle().await;

    // One campaign fully dispatched, the other halted, independently.
    let first_jobs = h.queue.jobs_for(&first).unwrap();
    let second_jobs = h.queue.jobs_for(&second).unwrap();

    let first_failed = first_jobs.iter().any(|j| j.status == JobStatus::Failed);
    let second_failed = second_jobs.iter().any(|j| j.status == JobStatus::Failed);
    assert!(
        first_failed != second_failed,
        "exactly one campaign should have halted"
    );

    let (ok_jobs, halted_jobs) = if first_failed {
        (&second_jobs, &first_jobs)
    } else {
        (&first_jobs, &second_jobs)
    };
    assert_eq!(ok_jobs.len(), 4);
    assert!(ok_jobs.iter().all(|j| j.status == JobStatus::Dispatched));

    // The halted chain never got past its failed stage.
    let failed_index = halted_jobs
        .iter()
        .position(|j| j.status == JobStatus::Failed)
        .unwrap();
    assert_eq!(failed_index, halted_jobs.len() - 1);
}
