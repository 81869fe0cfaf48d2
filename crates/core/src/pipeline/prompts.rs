//! Task specification builders.
//!
//! Each stage sends the external service a natural-language work order built
//! from persisted upstream entities: what inputs exist, what outputs are
//! expected, and which connectors to use. The counts and thresholds below are
//! requested of the service, not enforced afterwards.

use std::fmt::Write;

use crate::store::{Campaign, ContentAngle, ScheduledPost, SLATE_DAYS};

use super::stage::Stage;

/// Angles requested per campaign.
pub const ANGLE_TARGET: usize = 20;

/// Minimum suitability score for an angle to be usable downstream.
pub const USABLE_SCORE_MIN: u8 = 60;

/// Scheduled posts requested per campaign.
pub const POST_TARGET: usize = 14;

/// Posts per slate day.
pub const POSTS_PER_DAY: usize = 2;

/// Thumbnail variants requested per post.
pub const THUMBNAIL_VARIANTS: usize = 3;

/// Short clip duration range, seconds.
pub const SHORT_CLIP_SECS: (u8, u8) = (12, 20);

/// Long clip duration range, seconds.
pub const LONG_CLIP_SECS: (u8, u8) = (45, 58);

/// Upstream entities a stage's specification is built from.
#[derive(Debug, Default)]
pub struct StageInputs {
    pub angles: Vec<ContentAngle>,
    pub posts: Vec<ScheduledPost>,
}

/// Build the task specification text for one stage.
pub fn task_spec(stage: Stage, campaign: &Campaign, inputs: &StageInputs) -> String {
    match stage {
        Stage::Enrich => enrich_spec(campaign),
        Stage::MineAngles => mine_angles_spec(campaign),
        Stage::PlanSchedule => plan_schedule_spec(campaign, &inputs.angles),
        Stage::AssembleAssets => assemble_assets_spec(campaign, &inputs.posts),
        Stage::AnalyzeReport => analyze_report_spec(campaign),
    }
}

fn campaign_context(campaign: &Campaign) -> String {
    let mut context = format!(
        "Campaign {id} targets {platform}.\nSource reference: {source}.\n",
        id = campaign.id,
        platform = campaign.platform,
        source = campaign.source_ref,
    );
    if let Some(ref artist) = campaign.metadata.artist_name {
        let _ = writeln!(context, "Artist: {}.", artist);
    }
    if let Some(ref link) = campaign.metadata.smart_link {
        let _ = writeln!(context, "Smart link for calls to action: {}.", link);
    }
    if let Some(ref date) = campaign.metadata.release_date {
        let _ = writeln!(context, "Release date: {}.", date);
    }
    if !campaign.metadata.priority_regions.is_empty() {
        let _ = writeln!(
            context,
            "Priority regions: {}.",
            campaign.metadata.priority_regions.join(", ")
        );
    }
    if !campaign.metadata.themes.is_empty() {
        let _ = writeln!(context, "Themes: {}.", campaign.metadata.themes.join(", "));
    }
    context
}

fn enrich_spec(campaign: &Campaign) -> String {
    let mut spec = campaign_context(campaign);
    spec.push_str(
        "\nResolve the source reference into release metadata. Look up the real \
         release title, the credited contributors, and derive a visual palette \
         (4-6 hex colors) from the cover artwork.\n\
         Update the campaign record through the slate-store connector: set the \
         title, the contributor list, and the palette. Use streaming-metadata \
         for catalog lookups and web-search for anything the catalog lacks.\n",
    );
    spec
}

fn mine_angles_spec(campaign: &Campaign) -> String {
    let mut spec = campaign_context(campaign);
    let _ = write!(
        spec,
        "\nMine exactly {target} content angles for the release \"{title}\". Each \
         angle needs a primary hook, 2-3 alternative hooks ordered strongest \
         first, a suitability score from 0 to 100, a difficulty rating (easy, \
         moderate or hard), a suggested clip duration in seconds, and the trend \
         it rides on if any (use trend-radar for current {platform} trends).\n\
         Score honestly: only angles scoring {min} or higher will be scheduled, \
         and the planner needs at least {post_target} of those to work with.\n\
         Write every angle through the slate-store connector under campaign \
         {id}.\n",
        target = ANGLE_TARGET,
        title = campaign.title,
        platform = campaign.platform,
        min = USABLE_SCORE_MIN,
        post_target = POST_TARGET,
        id = campaign.id,
    );
    spec
}

fn plan_schedule_spec(campaign: &Campaign, angles: &[ContentAngle]) -> String {
    let mut spec = campaign_context(campaign);

    let usable: Vec<&ContentAngle> = angles
        .iter()
        .filter(|a| a.score >= USABLE_SCORE_MIN)
        .collect();
    let _ = writeln!(
        spec,
        "\n{count} usable angles (score >= {min}) are stored for this campaign:",
        count = usable.len(),
        min = USABLE_SCORE_MIN,
    );
    for angle in &usable {
        let _ = writeln!(
            spec,
            "- [{id}] score {score}, {difficulty}: {hook}",
            id = angle.id,
            score = angle.score,
            difficulty = angle.difficulty.as_str(),
            hook = angle.hook,
        );
    }

    let _ = write!(
        spec,
        "\nSelect {post_target} of these angles and plan a {days}-day slate: \
         exactly {per_day} posts per day, every day covered. Mix durations: \
         roughly half short clips ({s_min}-{s_max}s) and half long clips \
         ({l_min}-{l_max}s). For each post write a shot-by-shot script, a \
         caption, a hashtag set, and a call to action{cta_hint}.\n\
         Write every post through the slate-store connector under campaign \
         {id}, referencing the angle it came from, with status \"ready\".\n",
        post_target = POST_TARGET,
        days = SLATE_DAYS,
        per_day = POSTS_PER_DAY,
        s_min = SHORT_CLIP_SECS.0,
        s_max = SHORT_CLIP_SECS.1,
        l_min = LONG_CLIP_SECS.0,
        l_max = LONG_CLIP_SECS.1,
        cta_hint = if campaign.metadata.smart_link.is_some() {
            " pointing at the smart link"
        } else {
            ""
        },
        id = campaign.id,
    );
    spec
}

fn assemble_assets_spec(campaign: &Campaign, posts: &[ScheduledPost]) -> String {
    let mut spec = campaign_context(campaign);

    let _ = writeln!(spec, "\n{} scheduled posts are stored:", posts.len());
    for post in posts {
        let _ = writeln!(
            spec,
            "- [{id}] day {day}: {caption}",
            id = post.id,
            day = post.day,
            caption = post.caption,
        );
    }

    let palette = if campaign.palette.is_empty() {
        "the campaign palette".to_string()
    } else {
        campaign.palette.join(", ")
    };

    let _ = write!(
        spec,
        "\nFor every post above, render at least one video from its script via \
         the media-render connector, plus exactly {variants} thumbnail variants \
         tagged with the campaign palette ({palette}).\n\
         Write each asset through the slate-store connector under its post, \
         with the generation parameters used, then advance the post's status \
         to \"drafted\".\n",
        variants = THUMBNAIL_VARIANTS,
        palette = palette,
    );
    spec
}

fn analyze_report_spec(campaign: &Campaign) -> String {
    let mut spec = campaign_context(campaign);
    let _ = write!(
        spec,
        "\nAnalyze the slate's performance through the analytics connector: \
         pull per-post metrics, break them down by day, by angle and by \
         duration class, and derive concrete recommendations for the next \
         slate.\n\
         Write an insight report for the last {days} days through the \
         slate-store connector under campaign {id}: period bounds, the \
         per-dimension breakdowns, the recommendation list, and a short \
         summary. Keep analyzing on a rolling basis as new performance data \
         lands.\n",
        days = SLATE_DAYS,
        id = campaign.id,
    );
    spec
}
