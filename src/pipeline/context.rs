//! Translation context: the record threaded through the pipeline.

use crate::error::{PipelineError, PreconditionViolation};
use crate::pipeline::Stage;
use serde::{Deserialize, Serialize};

/// Caller input for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub source_lang: String,
    pub target_lang: String,
    pub source_text: String,
    /// Localization hint; empty means no localization instruction
    #[serde(default)]
    pub country: String,
}

impl TranslationRequest {
    pub fn new(
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        source_text: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            source_text: source_text.into(),
            country: country.into(),
        }
    }
}

/// Named context fields a stage can require or produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    SourceLang,
    TargetLang,
    SourceText,
    Translation1,
    Reflection,
    Translation2,
}

impl ContextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextField::SourceLang => "source_lang",
            ContextField::TargetLang => "target_lang",
            ContextField::SourceText => "source_text",
            ContextField::Translation1 => "translation_1",
            ContextField::Reflection => "reflection",
            ContextField::Translation2 => "translation_2",
        }
    }
}

impl std::fmt::Display for ContextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value produced by one stage, merged into the context by the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub field: ContextField,
    pub value: String,
}

/// Pipeline context: caller inputs plus write-once stage outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContext {
    pub source_lang: String,
    pub target_lang: String,
    pub source_text: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub translation_1: Option<String>,
    #[serde(default)]
    pub reflection: Option<String>,
    #[serde(default)]
    pub translation_2: Option<String>,
}

impl From<TranslationRequest> for TranslationContext {
    fn from(request: TranslationRequest) -> Self {
        Self {
            source_lang: request.source_lang,
            target_lang: request.target_lang,
            source_text: request.source_text,
            country: request.country,
            translation_1: None,
            reflection: None,
            translation_2: None,
        }
    }
}

impl TranslationContext {
    /// Field value if set. Blank caller inputs count as unset.
    pub fn get(&self, field: ContextField) -> Option<&str> {
        match field {
            ContextField::SourceLang => non_blank(&self.source_lang),
            ContextField::TargetLang => non_blank(&self.target_lang),
            ContextField::SourceText => non_blank(&self.source_text),
            ContextField::Translation1 => self.translation_1.as_deref(),
            ContextField::Reflection => self.reflection.as_deref(),
            ContextField::Translation2 => self.translation_2.as_deref(),
        }
    }

    /// Field value, or a precondition error attributed to `stage`
    pub fn require(&self, stage: Stage, field: ContextField) -> Result<&str, PipelineError> {
        self.get(field).ok_or(PipelineError::Precondition {
            stage,
            violation: PreconditionViolation::Missing(field),
        })
    }

    /// Localization hint, `None` when the caller gave none
    pub fn country_hint(&self) -> Option<&str> {
        non_blank(&self.country).map(str::trim)
    }

    /// Return a new context with `output` written into its field.
    ///
    /// Only stage outputs can be merged and each at most once.
    pub fn merge(mut self, stage: Stage, output: StageOutput) -> Result<Self, PipelineError> {
        let slot = match output.field {
            ContextField::Translation1 => &mut self.translation_1,
            ContextField::Reflection => &mut self.reflection,
            ContextField::Translation2 => &mut self.translation_2,
            input => {
                return Err(PipelineError::Precondition {
                    stage,
                    violation: PreconditionViolation::AlreadySet(input),
                })
            }
        };
        if slot.is_some() {
            return Err(PipelineError::Precondition {
                stage,
                violation: PreconditionViolation::AlreadySet(output.field),
            });
        }
        *slot = Some(output.value);
        Ok(self)
    }

    /// Final translation, set once the pipeline is done
    pub fn final_translation(&self) -> Option<&str> {
        self.translation_2.as_deref()
    }
}

fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
