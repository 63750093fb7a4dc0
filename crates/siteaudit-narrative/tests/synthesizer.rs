use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use siteaudit_core::{AuditIssue, Evidence, ModuleKey, ModuleResult, Severity};
use siteaudit_narrative::{
    GenerationError, GenerationRequest, MessageRole, NarrativeSynthesizer, OpenAiTextGenerator,
    SynthesisError, SynthesisInput, TextGenerator,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Scripted {
    reply: String,
    delay: Duration,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl Scripted {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.seen.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

fn results() -> Vec<ModuleResult> {
    vec![
        ModuleResult::new(
            ModuleKey::Security,
            100,
            Vec::new(),
            "Security looks good.".to_string(),
            Evidence::new(),
        ),
        ModuleResult::new(
            ModuleKey::Mobile,
            55,
            vec![AuditIssue::new(
                "No viewport tag",
                Severity::High,
                "meta viewport absent",
                "Visitors on phones have to pinch and zoom.",
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">.",
            )],
            "Mobile needs work.".to_string(),
            Evidence::new(),
        ),
    ]
}

const PURCHASED: [ModuleKey; 2] = [ModuleKey::Security, ModuleKey::Mobile];

fn input(results: &[ModuleResult]) -> SynthesisInput<'_> {
    SynthesisInput {
        url: "https://acme.example",
        overall_score: 78,
        customer_name: Some("Dana"),
        purchased: &PURCHASED,
        results,
    }
}

#[tokio::test]
async fn report_missing_mobile_is_completed_from_results() {
    let reply = json!({
        "executiveSummary": ["Your site is secure but struggles on phones."],
        "topActions": ["Add a viewport tag"],
        "modules": [{"moduleName": "Security", "overview": "All good.", "issues": []}]
    });
    let generator = Scripted::new(&format!("Here's the report: {reply}"));
    let synthesizer = NarrativeSynthesizer::new(generator.clone(), 150, 0.4);
    let results = results();

    let report = synthesizer.synthesize(input(&results)).await.unwrap();

    let names: Vec<&str> = report.modules.iter().map(|m| m.module_name.as_str()).collect();
    assert_eq!(names, vec!["Security", "Mobile Optimization"]);
    assert_eq!(report.modules[1].overview, "Mobile needs work.");
    assert_eq!(
        report.modules[1].issues[0].explanation,
        "Visitors on phones have to pinch and zoom."
    );

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!((seen[0].temperature - 0.4).abs() < f32::EPSILON);
    assert_eq!(seen[0].messages[0].role, MessageRole::System);
}

#[tokio::test]
async fn prose_without_json_is_unparsable() {
    let generator = Scripted::new("Sorry, I can't help with that.");
    let synthesizer = NarrativeSynthesizer::new(generator, 150, 0.4);
    let results = results();

    let err = synthesizer.synthesize(input(&results)).await.unwrap_err();
    assert!(matches!(err, SynthesisError::Unparsable), "got: {err:?}");
}

#[tokio::test]
async fn slow_generator_times_out() {
    let generator = Scripted::slow("{}", Duration::from_secs(5));
    let synthesizer = NarrativeSynthesizer::new(generator, 1, 0.4);
    let results = results();

    let err = synthesizer.synthesize(input(&results)).await.unwrap_err();
    assert!(matches!(err, SynthesisError::Timeout { .. }), "got: {err:?}");
}

#[tokio::test]
async fn missing_result_for_purchased_module_is_incomplete() {
    let generator = Scripted::new(r#"{"modules": [{"moduleName": "Security"}]}"#);
    let synthesizer = NarrativeSynthesizer::new(generator, 150, 0.4);
    let results = results()[..1].to_vec();

    let err = synthesizer.synthesize(input(&results)).await.unwrap_err();
    match err {
        SynthesisError::Incomplete { missing, unexpected } => {
            assert_eq!(missing, vec!["Mobile Optimization".to_string()]);
            assert!(unexpected.is_empty());
        }
        other => panic!("expected Incomplete, got {other:?}"),
    }
}

#[test]
fn deadline_is_capped() {
    let synthesizer = NarrativeSynthesizer::new(Scripted::new("{}"), 900, 0.4);
    assert_eq!(synthesizer.timeout(), Duration::from_secs(150));
    let synthesizer = synthesizer.with_timeout(Duration::from_secs(600));
    assert_eq!(synthesizer.timeout(), Duration::from_secs(150));
}

#[test]
fn zero_deadline_is_raised_to_one_second() {
    let synthesizer = NarrativeSynthesizer::new(Scripted::new("{}"), 0, 0.4);
    assert_eq!(synthesizer.timeout(), Duration::from_secs(1));
    let synthesizer = synthesizer.with_timeout(Duration::ZERO);
    assert_eq!(synthesizer.timeout(), Duration::from_secs(1));
    let synthesizer = synthesizer.with_timeout(Duration::from_millis(2500));
    assert_eq!(synthesizer.timeout(), Duration::from_millis(2500));
}

#[tokio::test]
async fn openai_client_posts_chat_completion() {
    let server = MockServer::start().await;
    let report = json!({
        "executiveSummary": "Solid.",
        "modules": [
            {"moduleName": "Security", "overview": "Fine."},
            {"moduleName": "Mobile Optimization", "overview": "Needs work."}
        ]
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant",
                                     "content": format!("```json\n{report}\n```")}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = OpenAiTextGenerator::new("sk-test", "gpt-4o-mini")
        .with_base_url(format!("{}/v1/", server.uri()));
    let synthesizer = NarrativeSynthesizer::new(Arc::new(generator), 30, 0.2);
    let results = results();

    let report = synthesizer.synthesize(input(&results)).await.unwrap();
    assert_eq!(report.executive_summary, vec!["Solid.".to_string()]);
    assert_eq!(report.modules.len(), 2);
}

#[tokio::test]
async fn openai_error_status_surfaces_as_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let generator = OpenAiTextGenerator::new("sk-test", "gpt-4o-mini").with_base_url(server.uri());
    let synthesizer = NarrativeSynthesizer::new(Arc::new(generator), 30, 0.2);
    let results = results();

    let err = synthesizer.synthesize(input(&results)).await.unwrap_err();
    assert!(
        matches!(
            err,
            SynthesisError::Generation(GenerationError::Api { status: 429, ref body }) if body == "rate limited"
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn openai_empty_choices_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let generator = OpenAiTextGenerator::new("sk-test", "gpt-4o-mini").with_base_url(server.uri());
    let err = generator
        .generate(&GenerationRequest {
            messages: Vec::new(),
            temperature: 0.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)), "got: {err:?}");
}
