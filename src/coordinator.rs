use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    common::LandmarkDocument,
    config::Settings,
    error::{ConfigError, InputError, SwingError},
    pipeline::services::{
        analysis::{AnalysisQuality, AnalysisStatus, AnalyzerConfig, SwingAnalysis, SwingAnalyzer},
        timeline::{PhaseTimeline, TimelineSegment},
        tracking_quality::TrackingQuality,
    },
    pipeline::types::AnalysisResult,
};

/// One video's landmarks and where they came from.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub source: String,
    pub document: LandmarkDocument,
}

impl AnalysisJob {
    pub fn new(source: impl Into<String>, document: LandmarkDocument) -> Self {
        Self {
            source: source.into(),
            document,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, InputError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| InputError::Read(e, path.to_path_buf()))?;
        let document = serde_json::from_str(&text)
            .map_err(|e| InputError::Parse(e, path.to_path_buf()))?;

        Ok(Self::new(path.display().to_string(), document))
    }
}

/// Report envelope for one analyzed video. Only the envelope carries the id
/// and generation time; `result` is a pure function of the input.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub status: AnalysisStatus,
    pub frames_detected: usize,
    pub velocity_threshold: Option<f64>,
    pub quality: AnalysisQuality,
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineSegment>>,
}

impl AnalysisReport {
    fn new(source: String, analysis: SwingAnalysis, timeline: Option<Vec<TimelineSegment>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            generated_at: Utc::now(),
            status: analysis.status,
            frames_detected: analysis.frames_detected,
            velocity_threshold: analysis.velocity_threshold,
            quality: analysis.quality,
            result: analysis.result,
            timeline,
        }
    }
}

/// Fans a batch of videos out to the blocking pool. Every analysis owns its
/// own document and metrics; only the immutable analyzer is shared.
pub struct Coordinator {
    analyzer: Arc<SwingAnalyzer>,
    limiter: Arc<Semaphore>,
    timeout: Option<Duration>,
    include_timeline: bool,
}

impl Coordinator {
    /// Analyze every job; results come back in input order.
    pub async fn run(&self, jobs: Vec<AnalysisJob>) -> Vec<Result<AnalysisReport, SwingError>> {
        info!(jobs = jobs.len(), "Starting batch analysis");
        join_all(jobs.into_iter().map(|job| self.run_job(job))).await
    }

    #[instrument(skip(self, job), fields(source = %job.source))]
    async fn run_job(&self, job: AnalysisJob) -> Result<AnalysisReport, SwingError> {
        let permit = Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .map_err(|e| InputError::Task(e.to_string()))?;

        let analyzer = Arc::clone(&self.analyzer);
        let include_timeline = self.include_timeline;
        let AnalysisJob { source, document } = job;
        // The permit lives as long as the blocking work, even past a timeout
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            analyze_document(&analyzer, document, include_timeline)
        });

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                InputError::Task(format!("analysis of {} timed out after {:?}", source, limit))
            })?,
            None => task.await,
        };
        let (analysis, timeline) = joined.map_err(|e| InputError::Task(e.to_string()))??;

        info!(
            status = ?analysis.status,
            phases_detected = analysis.quality.phases_detected,
            "Video analyzed"
        );
        Ok(AnalysisReport::new(source, analysis, timeline))
    }
}

fn analyze_document(
    analyzer: &SwingAnalyzer,
    document: LandmarkDocument,
    include_timeline: bool,
) -> Result<(SwingAnalysis, Option<Vec<TimelineSegment>>), SwingError> {
    let tracking = TrackingQuality::assess(&document.frames);
    if !tracking.is_reliable() {
        warn!(
            detection_rate = tracking.detection_rate,
            "Detection rate below 70%, video may not be suitable for analysis"
        );
    }

    let mut analysis = analyzer.analyze(&document.frames, document.fps)?;

    if let Some(video_quality) = document.video_quality {
        analysis.result.set_video_quality(video_quality)?;
    }
    let tracking = serde_json::to_value(tracking).map_err(InputError::Encode)?;
    analysis.result.set_tracking_quality(tracking)?;

    let timeline = include_timeline.then(|| {
        let total_frames = document
            .frames
            .iter()
            .map(|f| f.frame_number)
            .max()
            .unwrap_or(0);
        PhaseTimeline::build(&analysis.result, total_frames).segments()
    });

    Ok((analysis, timeline))
}

pub struct CoordinatorBuilder {
    configuration: Settings,
    analyzer_config: Option<AnalyzerConfig>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Settings) -> Self {
        Self {
            configuration,
            analyzer_config: None,
        }
    }

    // Uses this analyzer configuration instead of resolving the settings' preset.
    pub fn analyzer_config(mut self, config: AnalyzerConfig) -> Self {
        self.analyzer_config = Some(config);
        self
    }

    // Adjusts how many analyses may run at once, this will override the settings.
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.configuration.batch.max_concurrent = max_concurrent;
        self
    }

    // Sets a per-video timeout in seconds, this will override the settings.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.configuration.batch.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn include_timeline(mut self, include_timeline: bool) -> Self {
        self.configuration.batch.include_timeline = include_timeline;
        self
    }

    pub fn build(self) -> Result<Coordinator, SwingError> {
        let batch = &self.configuration.batch;
        if batch.max_concurrent == 0 {
            return Err(ConfigError::MaxConcurrent(batch.max_concurrent).into());
        }

        let config = match self.analyzer_config {
            Some(config) => config,
            None => self.configuration.analyzer.to_config()?,
        };

        Ok(Coordinator {
            analyzer: Arc::new(SwingAnalyzer::new(config)),
            limiter: Arc::new(Semaphore::new(batch.max_concurrent)),
            timeout: batch.timeout_secs.map(Duration::from_secs),
            include_timeline: batch.include_timeline,
        })
    }
}
