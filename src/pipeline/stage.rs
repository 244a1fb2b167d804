//! Pipeline stages: Draft → Critique → Refine.

use crate::error::{GatewayError, PipelineError, PreconditionViolation};
use crate::gateway::{CompletionGateway, CompletionRequest};
use crate::pipeline::prompts::{self, Prompt};
use crate::pipeline::{ContextField, StageOutput, TranslationContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Draft,
    Critique,
    Refine,
}

impl Stage {
    /// Fixed execution order
    pub const ALL: [Stage; 3] = [Stage::Draft, Stage::Critique, Stage::Refine];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Draft => "Draft",
            Stage::Critique => "Critique",
            Stage::Refine => "Refine",
        }
    }

    /// Context fields that must be set before the stage runs
    pub fn required_fields(&self) -> &'static [ContextField] {
        match self {
            Stage::Draft => &[
                ContextField::SourceLang,
                ContextField::TargetLang,
                ContextField::SourceText,
            ],
            Stage::Critique => &[
                ContextField::SourceLang,
                ContextField::TargetLang,
                ContextField::SourceText,
                ContextField::Translation1,
            ],
            Stage::Refine => &[
                ContextField::SourceLang,
                ContextField::TargetLang,
                ContextField::SourceText,
                ContextField::Translation1,
                ContextField::Reflection,
            ],
        }
    }

    /// The single field the stage writes
    pub fn output_field(&self) -> ContextField {
        match self {
            Stage::Draft => ContextField::Translation1,
            Stage::Critique => ContextField::Reflection,
            Stage::Refine => ContextField::Translation2,
        }
    }

    /// Check required inputs are present and the output slot is still empty
    pub fn check_preconditions(&self, ctx: &TranslationContext) -> Result<(), PipelineError> {
        for field in self.required_fields() {
            ctx.require(*self, *field)?;
        }
        let output = self.output_field();
        if ctx.get(output).is_some() {
            return Err(PipelineError::Precondition {
                stage: *self,
                violation: PreconditionViolation::AlreadySet(output),
            });
        }
        Ok(())
    }

    pub fn build_prompt(&self, ctx: &TranslationContext) -> Result<Prompt, PipelineError> {
        prompts::build(*self, ctx)
    }

    /// Run the stage against `ctx`: one gateway call, one output.
    /// Nothing is sent when a precondition fails; blank output is a refusal.
    pub async fn run(
        &self,
        ctx: &TranslationContext,
        gateway: &dyn CompletionGateway,
        settings: &StageSettings,
    ) -> Result<StageOutput, PipelineError> {
        self.check_preconditions(ctx)?;
        let prompt = self.build_prompt(ctx)?;
        let value = gateway
            .complete(settings.request(prompt))
            .await
            .map_err(|source| self.failed(source))?;
        if value.trim().is_empty() {
            return Err(self.failed(GatewayError::ModelRefusal(
                "model returned empty content".to_string(),
            )));
        }
        Ok(StageOutput {
            field: self.output_field(),
            value,
        })
    }

    pub(crate) fn failed(&self, source: GatewayError) -> PipelineError {
        PipelineError::Stage {
            stage: *self,
            source,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sampling settings for one stage's completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Model override; `None` uses the provider's configured model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    1.0
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl StageSettings {
    pub fn request(&self, prompt: Prompt) -> CompletionRequest {
        CompletionRequest {
            system_instruction: prompt.system,
            user_prompt: prompt.user,
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) || self.top_p == 0.0 {
            return Err(format!("top_p must be in (0.0, 1.0], got {}", self.top_p));
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("model override cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Per-stage settings for a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub draft: StageSettings,
    #[serde(default)]
    pub critique: StageSettings,
    #[serde(default)]
    pub refine: StageSettings,
}

impl PipelineSettings {
    pub fn for_stage(&self, stage: Stage) -> &StageSettings {
        match stage {
            Stage::Draft => &self.draft,
            Stage::Critique => &self.critique,
            Stage::Refine => &self.refine,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for stage in Stage::ALL {
            self.for_stage(stage)
                .validate()
                .map_err(|e| format!("{} stage: {}", stage, e))?;
        }
        Ok(())
    }
}
