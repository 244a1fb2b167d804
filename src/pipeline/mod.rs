//! Reflective translation pipeline: draft, critique, refine.

pub mod cancel;
pub mod context;
pub mod executor;
pub mod prompts;
pub mod stage;

pub use cancel::CancellationToken;
pub use context::{ContextField, StageOutput, TranslationContext, TranslationRequest};
pub use executor::{PipelineExecutor, RunReport, StageRecord};
pub use prompts::Prompt;
pub use stage::{PipelineSettings, Stage, StageSettings};
