//! Pipeline executor: runs Draft, Critique and Refine in order over one context.
//! Fails fast; a failed run returns no partial context.

use crate::error::PipelineError;
use crate::gateway::CompletionGateway;
use crate::pipeline::{
    CancellationToken, PipelineSettings, Stage, StageOutput, StageSettings, TranslationContext,
    TranslationRequest,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Timing and sizing of one completed stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub model: Option<String>,
    pub temperature: f32,
    pub latency_ms: u64,
    pub output_chars: usize,
}

/// Final context of a run plus per-stage records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub context: TranslationContext,
    pub stages: Vec<StageRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct PipelineExecutor {
    gateway: Arc<dyn CompletionGateway>,
    settings: PipelineSettings,
    cancellation: Option<CancellationToken>,
}

impl PipelineExecutor {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            settings: PipelineSettings::default(),
            cancellation: None,
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Observe `token` at every stage boundary and while a completion call is in flight
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the pipeline and return the completed context
    pub async fn run(&self, request: TranslationRequest) -> Result<TranslationContext, PipelineError> {
        self.run_detailed(request).await.map(|report| report.context)
    }

    #[instrument(
        name = "translation_pipeline",
        skip_all,
        fields(source_lang = %request.source_lang, target_lang = %request.target_lang)
    )]
    pub async fn run_detailed(&self, request: TranslationRequest) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let mut ctx = TranslationContext::from(request);
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        info!(
            source_chars = ctx.source_text.chars().count(),
            localized = ctx.country_hint().is_some(),
            "Pipeline started"
        );

        for stage in Stage::ALL {
            if self.is_cancelled() {
                warn!(stage = %stage, "Pipeline cancelled before stage");
                return Err(PipelineError::Cancelled { stage });
            }

            let settings = self.settings.for_stage(stage);
            info!(stage = %stage, model = ?settings.model, "stage_started");
            let start = Instant::now();

            let output = match self.run_stage(stage, &ctx, settings).await {
                Ok(output) => output,
                Err(err) => {
                    warn!(stage = %stage, error = %err, "stage_failed");
                    return Err(err);
                }
            };

            let latency_ms = start.elapsed().as_millis() as u64;
            let output_chars = output.value.chars().count();
            info!(stage = %stage, latency_ms, output_chars, "stage_completed");

            stages.push(StageRecord {
                stage,
                model: settings.model.clone(),
                temperature: settings.temperature,
                latency_ms,
                output_chars,
            });
            ctx = ctx.merge(stage, output)?;
        }

        info!("Pipeline completed");
        Ok(RunReport {
            context: ctx,
            stages,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn run_stage(
        &self,
        stage: Stage,
        ctx: &TranslationContext,
        settings: &StageSettings,
    ) -> Result<StageOutput, PipelineError> {
        let call = stage.run(ctx, self.gateway.as_ref(), settings);
        match &self.cancellation {
            None => call.await,
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(PipelineError::Cancelled { stage }),
                    result = call => result,
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
