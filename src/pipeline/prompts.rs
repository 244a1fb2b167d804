//! Prompt builders, one per stage.
//!
//! Builders are pure: the same context always renders byte-identical prompts.
//! The XML-style markers around embedded texts help the model tell the parts
//! apart; they are not an isolation boundary and a model may ignore them.

use crate::error::PipelineError;
use crate::pipeline::{ContextField, Stage, TranslationContext};

pub const SOURCE_TEXT_TAG: &str = "SOURCE_TEXT";
pub const TRANSLATION_TAG: &str = "TRANSLATION";
pub const EXPERT_SUGGESTIONS_TAG: &str = "EXPERT_SUGGESTIONS";

/// System instruction and task prompt for one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Render the prompt for `stage`
pub fn build(stage: Stage, ctx: &TranslationContext) -> Result<Prompt, PipelineError> {
    match stage {
        Stage::Draft => draft(ctx),
        Stage::Critique => critique(ctx),
        Stage::Refine => refine(ctx),
    }
}

pub fn draft(ctx: &TranslationContext) -> Result<Prompt, PipelineError> {
    let stage = Stage::Draft;
    let source_lang = ctx.require(stage, ContextField::SourceLang)?;
    let target_lang = ctx.require(stage, ContextField::TargetLang)?;
    let source_text = ctx.require(stage, ContextField::SourceText)?;

    let system = translator_role(source_lang, target_lang);
    let user = format!(
        "This is a {source_lang} to {target_lang} translation, please provide the \
{target_lang} translation for this text.\n\
Output only the translation. Do not provide any commentary, explanations or text apart from the translation.\n\
{source_lang}: {source_text}\n\
\n\
{target_lang}:"
    );

    Ok(Prompt { system, user })
}

pub fn critique(ctx: &TranslationContext) -> Result<Prompt, PipelineError> {
    let stage = Stage::Critique;
    let source_lang = ctx.require(stage, ContextField::SourceLang)?;
    let target_lang = ctx.require(stage, ContextField::TargetLang)?;
    let source_text = ctx.require(stage, ContextField::SourceText)?;
    let translation_1 = ctx.require(stage, ContextField::Translation1)?;

    let system = format!(
        "You are an expert bilingual reviewer fluent in both {source_lang} and {target_lang}, \
specializing in translation from {source_lang} to {target_lang}. \
You will be provided with a source text and its translation and your goal is to improve the translation."
    );

    let mut user = format!(
        "Your task is to carefully read a source text and a translation from {source_lang} to \
{target_lang}, and then give constructive criticism and helpful suggestions to improve the translation.\n"
    );
    if let Some(country) = ctx.country_hint() {
        user.push_str(&localization_clause(target_lang, country));
        user.push('\n');
    }
    user.push_str(&format!(
        "\n\
The source text and initial translation, delimited by XML tags <{SOURCE_TEXT_TAG}></{SOURCE_TEXT_TAG}> \
and <{TRANSLATION_TAG}></{TRANSLATION_TAG}>, are as follows:\n\
\n\
{source}\n\
\n\
{translation}\n\
\n\
When writing suggestions, pay attention to whether there are ways to improve the translation's:\n\
{dimensions}\n\
\n\
Write a list of specific, helpful and constructive suggestions for improving the translation.\n\
Each suggestion should address one specific part of the translation.\n\
Output only the suggestions and nothing else.",
        source = tagged(SOURCE_TEXT_TAG, source_text),
        translation = tagged(TRANSLATION_TAG, translation_1),
        dimensions = review_dimensions(target_lang),
    ));

    Ok(Prompt { system, user })
}

pub fn refine(ctx: &TranslationContext) -> Result<Prompt, PipelineError> {
    let stage = Stage::Refine;
    let source_lang = ctx.require(stage, ContextField::SourceLang)?;
    let target_lang = ctx.require(stage, ContextField::TargetLang)?;
    let source_text = ctx.require(stage, ContextField::SourceText)?;
    let translation_1 = ctx.require(stage, ContextField::Translation1)?;
    let reflection = ctx.require(stage, ContextField::Reflection)?;

    let system = translator_role(source_lang, target_lang);
    let user = format!(
        "Your task is to carefully read, then edit, a translation from {source_lang} to {target_lang}, \
taking into account a list of expert suggestions and constructive criticisms.\n\
\n\
The source text, the initial translation, and the expert linguist suggestions are delimited by XML tags \
<{SOURCE_TEXT_TAG}></{SOURCE_TEXT_TAG}>, <{TRANSLATION_TAG}></{TRANSLATION_TAG}> and \
<{EXPERT_SUGGESTIONS_TAG}></{EXPERT_SUGGESTIONS_TAG}> as follows:\n\
\n\
{source}\n\
\n\
{translation}\n\
\n\
{suggestions}\n\
\n\
Please take into account the expert suggestions when editing the translation. Edit the translation by ensuring:\n\
{dimensions}\n\
5. there are no other errors.\n\
\n\
Output only the new translation and nothing else.",
        source = tagged(SOURCE_TEXT_TAG, source_text),
        translation = tagged(TRANSLATION_TAG, translation_1),
        suggestions = tagged(EXPERT_SUGGESTIONS_TAG, reflection),
        dimensions = review_dimensions(target_lang),
    );

    Ok(Prompt { system, user })
}

/// Style instruction added to the critique prompt when a country is given
pub fn localization_clause(target_lang: &str, country: &str) -> String {
    format!(
        "The final style and tone of the translation should match the style of {target_lang} \
colloquially spoken in {country}."
    )
}

fn translator_role(source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are an expert linguist, specializing in translation from {source_lang} to {target_lang}."
    )
}

fn review_dimensions(target_lang: &str) -> String {
    format!(
        "1. accuracy (by correcting errors of addition, mistranslation, omission, or untranslated text),\n\
2. fluency (by applying {target_lang} grammar, spelling and punctuation rules, and ensuring there are no unnecessary repetitions),\n\
3. style (by ensuring the translation reflects the style and tone of the source text and takes into account any cultural context),\n\
4. terminology (by ensuring terminology use is consistent and reflects the source text domain; and by only ensuring you use equivalent idioms in {target_lang})."
    )
}

fn tagged(tag: &str, body: &str) -> String {
    format!("<{tag}>\n{body}\n</{tag}>")
}
