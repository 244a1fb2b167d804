//! Pipeline executor tests: stage order, prompt contents, failure and cancellation.

use crate::integration::test_utils::{hello_world_request, ScriptedGateway, Step};
use retrans::error::{GatewayError, PipelineError, PreconditionViolation, ServiceErrorKind};
use retrans::gateway::CompletionGateway;
use retrans::pipeline::{
    prompts, CancellationToken, ContextField, PipelineExecutor, PipelineSettings, Stage,
    StageSettings, TranslationContext, TranslationRequest,
};
use std::sync::Arc;
use std::time::Duration;

fn executor(gateway: &Arc<ScriptedGateway>) -> PipelineExecutor {
    let gateway: Arc<dyn CompletionGateway> = gateway.clone();
    PipelineExecutor::new(gateway)
}

#[tokio::test]
async fn test_english_to_chinese_end_to_end() {
    let gateway = ScriptedGateway::replying(&["你好，世界。", "No issues found.", "你好，世界！"]);

    let ctx = executor(&gateway)
        .run(hello_world_request(""))
        .await
        .unwrap();

    assert_eq!(ctx.translation_1.as_deref(), Some("你好，世界。"));
    assert_eq!(ctx.reflection.as_deref(), Some("No issues found."));
    assert_eq!(ctx.translation_2.as_deref(), Some("你好，世界！"));
    assert_eq!(ctx.final_translation(), Some("你好，世界！"));
    assert_eq!(ctx.source_text, "Hello world.");
    assert_eq!(gateway.call_count(), 3);
}

#[tokio::test]
async fn test_stages_call_gateway_in_order_with_prior_outputs() {
    let gateway = ScriptedGateway::replying(&["DRAFT-OUT", "CRITIQUE-OUT", "FINAL-OUT"]);
    executor(&gateway)
        .run(hello_world_request(""))
        .await
        .unwrap();

    let requests = gateway.requests();
    assert_eq!(requests.len(), 3);

    // Draft sees only the inputs
    assert!(requests[0].user_prompt.contains("Hello world."));
    assert!(!requests[0].user_prompt.contains("DRAFT-OUT"));

    // Critique sees the draft
    assert!(requests[1].user_prompt.contains("Hello world."));
    assert!(requests[1].user_prompt.contains("DRAFT-OUT"));
    assert!(!requests[1].user_prompt.contains("CRITIQUE-OUT"));

    // Refine sees the draft and the critique
    assert!(requests[2].user_prompt.contains("DRAFT-OUT"));
    assert!(requests[2].user_prompt.contains("CRITIQUE-OUT"));

    for request in &requests {
        assert!(request.system_instruction.contains("English"));
        assert!(request.system_instruction.contains("Chinese"));
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.top_p, 1.0);
        assert_eq!(request.model, None);
    }
}

#[tokio::test]
async fn test_prompts_sent_match_builders() {
    let gateway = ScriptedGateway::replying(&["one", "two", "three"]);
    let request = hello_world_request("Taiwan");
    executor(&gateway).run(request.clone()).await.unwrap();

    let mut ctx = TranslationContext::from(request);
    ctx.translation_1 = Some("one".to_string());
    ctx.reflection = Some("two".to_string());
    let sent = gateway.requests();
    assert_eq!(sent[2].user_prompt, prompts::refine(&ctx).unwrap().user);
    assert_eq!(sent[1].user_prompt, prompts::critique(&ctx).unwrap().user);
}

#[tokio::test]
async fn test_localization_clause_follows_country() {
    let clause = prompts::localization_clause("French", "France");

    let gateway = ScriptedGateway::replying(&["a", "b", "c"]);
    executor(&gateway)
        .run(TranslationRequest::new("English", "French", "Good evening.", ""))
        .await
        .unwrap();
    assert!(gateway
        .requests()
        .iter()
        .all(|r| !r.user_prompt.contains("colloquially spoken")));

    let gateway = ScriptedGateway::replying(&["a", "b", "c"]);
    executor(&gateway)
        .run(TranslationRequest::new(
            "English",
            "French",
            "Good evening.",
            "France",
        ))
        .await
        .unwrap();
    let requests = gateway.requests();
    assert_eq!(requests[1].user_prompt.matches(clause.as_str()).count(), 1);
    assert!(!requests[0].user_prompt.contains(clause.as_str()));
}

#[tokio::test]
async fn test_critique_failure_stops_pipeline() {
    let gateway = ScriptedGateway::new(vec![
        Step::Reply("你好，世界。".to_string()),
        Step::Fail(GatewayError::service(
            ServiceErrorKind::RateLimit,
            "too many requests",
        )),
        Step::Reply("never used".to_string()),
    ]);

    let err = executor(&gateway)
        .run(hello_world_request(""))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Critique);
    assert!(err.to_string().contains("Critique"));
    match err {
        PipelineError::Stage { source, .. } => {
            assert_eq!(source.service_kind(), Some(ServiceErrorKind::RateLimit));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Refine never ran
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn test_blank_model_output_is_refusal() {
    let gateway = ScriptedGateway::new(vec![Step::Fail(GatewayError::ModelRefusal(
        "empty completion".to_string(),
    ))]);
    let err = executor(&gateway)
        .run(hello_world_request(""))
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Draft);
    assert!(matches!(
        err,
        PipelineError::Stage {
            source: GatewayError::ModelRefusal(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_empty_draft_is_refusal_and_stops_pipeline() {
    let gateway = ScriptedGateway::replying(&["", "   ", ""]);
    let err = executor(&gateway)
        .run(hello_world_request(""))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Draft);
    assert!(matches!(
        err,
        PipelineError::Stage {
            source: GatewayError::ModelRefusal(_),
            ..
        }
    ));
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn test_whitespace_critique_is_refusal() {
    let gateway = ScriptedGateway::replying(&["你好，世界。", " \n\t", "unused"]);
    let err = executor(&gateway)
        .run(hello_world_request(""))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Critique);
    assert!(matches!(
        err,
        PipelineError::Stage {
            source: GatewayError::ModelRefusal(_),
            ..
        }
    ));
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn test_critique_without_draft_makes_no_call() {
    let gateway = ScriptedGateway::replying(&["unused"]);
    let ctx = TranslationContext::from(hello_world_request(""));

    let err = Stage::Critique
        .run(&ctx, gateway.as_ref(), &StageSettings::default())
        .await
        .unwrap_err();

    assert!(err.is_precondition());
    assert!(matches!(
        err,
        PipelineError::Precondition {
            stage: Stage::Critique,
            violation: PreconditionViolation::Missing(ContextField::Translation1),
        }
    ));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_blank_source_text_fails_before_any_call() {
    let gateway = ScriptedGateway::replying(&["unused"]);
    let err = executor(&gateway)
        .run(TranslationRequest::new("English", "Chinese", "   ", ""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Precondition {
            stage: Stage::Draft,
            violation: PreconditionViolation::Missing(ContextField::SourceText),
        }
    ));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_per_stage_settings_reach_gateway() {
    let gateway = ScriptedGateway::replying(&["a", "b", "c"]);
    let mut settings = PipelineSettings::default();
    settings.critique = StageSettings {
        model: Some("reviewer-model".to_string()),
        temperature: 0.7,
        top_p: 0.9,
    };

    let report = executor(&gateway)
        .with_settings(settings)
        .run_detailed(hello_world_request(""))
        .await
        .unwrap();

    let requests = gateway.requests();
    assert_eq!(requests[0].model, None);
    assert_eq!(requests[1].model.as_deref(), Some("reviewer-model"));
    assert_eq!(requests[1].temperature, 0.7);
    assert_eq!(requests[1].top_p, 0.9);

    let stages: Vec<Stage> = report.stages.iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert_eq!(report.stages[1].model.as_deref(), Some("reviewer-model"));
    assert_eq!(report.stages[2].output_chars, 1);
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_cancelled_before_first_stage() {
    let gateway = ScriptedGateway::replying(&["a", "b", "c"]);
    let token = CancellationToken::new();
    token.cancel();

    let err = executor(&gateway)
        .with_cancellation(token)
        .run(hello_world_request(""))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { stage: Stage::Draft }));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_cancelled_during_gateway_call() {
    let gateway = ScriptedGateway::new(vec![Step::Reply("draft".to_string()), Step::Hang]);
    let token = CancellationToken::new();
    let executor = executor(&gateway).with_cancellation(token.clone());

    let (result, ()) = tokio::join!(executor.run(hello_world_request("")), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Cancelled {
            stage: Stage::Critique
        }
    ));
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_runs_share_executor() {
    let gateway = ScriptedGateway::new(
        (0..6).map(|i| Step::Reply(format!("out-{i}"))).collect(),
    );
    let executor = executor(&gateway);

    let (a, b) = tokio::join!(
        executor.run(hello_world_request("")),
        executor.run(TranslationRequest::new("English", "German", "Thanks.", ""))
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.final_translation().is_some());
    assert!(b.final_translation().is_some());
    assert_eq!(b.target_lang, "German");
    assert_eq!(gateway.call_count(), 6);
}
