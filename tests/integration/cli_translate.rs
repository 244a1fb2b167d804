//! Translate command through the run context, with a scripted gateway

use crate::integration::test_utils::ScriptedGateway;
use retrans::cli::{RunContext, TranslateArgs};
use retrans::config::RetransConfig;
use retrans::error::ApiError;
use retrans::gateway::CompletionGateway;
use std::path::PathBuf;
use std::sync::Arc;

fn args(text: &str) -> TranslateArgs {
    TranslateArgs {
        source_lang: Some("English".to_string()),
        target_lang: Some("Chinese".to_string()),
        country: String::new(),
        text: Some(text.to_string()),
        file: None,
        request: None,
        format: "text".to_string(),
        show_steps: false,
        no_color: false,
    }
}

fn context() -> RunContext {
    RunContext::with_config(PathBuf::from("."), RetransConfig::default())
}

fn scripted() -> (Arc<ScriptedGateway>, Arc<dyn CompletionGateway>) {
    let gateway = ScriptedGateway::replying(&["你好，世界。", "No issues found.", "你好，世界！"]);
    let shared: Arc<dyn CompletionGateway> = gateway.clone();
    (gateway, shared)
}

#[test]
fn test_translate_prints_final_translation() {
    let (gateway, shared) = scripted();
    let output = context().translate(&args("Hello world."), shared).unwrap();
    assert_eq!(output, "你好，世界！");
    assert_eq!(gateway.call_count(), 3);
}

#[test]
fn test_show_steps_with_no_color_has_no_escapes() {
    let (_, shared) = scripted();
    let mut args = args("Hello world.");
    args.show_steps = true;
    args.no_color = true;

    let output = context().translate(&args, shared).unwrap();
    assert!(!output.contains('\x1b'), "{:?}", output);
    assert!(output.starts_with("Draft\n你好，世界。\n\nCritique\nNo issues found.\n\nTranslation\n你好，世界！"));
}

#[test]
fn test_translate_json_report() {
    let (_, shared) = scripted();
    let mut args = args("Hello world.");
    args.format = "json".to_string();

    let output = context().translate(&args, shared).unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["context"]["translation_1"], "你好，世界。");
    assert_eq!(report["context"]["reflection"], "No issues found.");
    assert_eq!(report["context"]["translation_2"], "你好，世界！");
    assert_eq!(report["stages"].as_array().unwrap().len(), 3);
    assert_eq!(report["stages"][1]["stage"], "Critique");
}

#[test]
fn test_translate_rejects_unknown_format_without_calls() {
    let (gateway, shared) = scripted();
    let mut args = args("Hello world.");
    args.format = "yaml".to_string();

    let err = context().translate(&args, shared).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[test]
fn test_translate_blank_text_is_precondition_failure() {
    let (gateway, shared) = scripted();
    let err = context().translate(&args("  \n"), shared).unwrap_err();
    match err {
        ApiError::Pipeline(inner) => assert!(inner.is_precondition()),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(gateway.call_count(), 0);
}
