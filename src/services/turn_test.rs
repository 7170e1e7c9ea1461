use super::*;
use crate::builder::validator::Rule;
use crate::llm::types::{ChatResponse, ContentBlock};
use std::sync::Mutex;
use std::time::Duration;

// =========================================================================
// Mock LLMs
// =========================================================================

struct MockLlm {
    responses: Mutex<Vec<ChatResponse>>,
    seen: Mutex<Vec<(String, Vec<Message>)>>,
}

impl MockLlm {
    fn new(replies: &[&str]) -> Self {
        Self {
            responses: Mutex::new(replies.iter().map(|r| reply(r)).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> (String, Vec<Message>) {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

fn reply(text: &str) -> ChatResponse {
    ChatResponse {
        content: vec![ContentBlock::Text { text: text.into() }],
        model: "mock".into(),
        stop_reason: "end_turn".into(),
        input_tokens: 0,
        output_tokens: 0,
    }
}

#[async_trait::async_trait]
impl LlmChat for MockLlm {
    async fn chat(&self, _max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.seen.lock().unwrap().push((system.to_string(), messages.to_vec()));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() { Ok(reply("done")) } else { Ok(responses.remove(0)) }
    }
}

struct FailingLlm;

#[async_trait::async_trait]
impl LlmChat for FailingLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, _messages: &[Message]) -> Result<ChatResponse, LlmError> {
        Err(LlmError::ApiResponse { status: 529, body: "overloaded".into() })
    }
}

struct SlowLlm;

#[async_trait::async_trait]
impl LlmChat for SlowLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, _messages: &[Message]) -> Result<ChatResponse, LlmError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(reply("too late"))
    }
}

fn orchestrator(llm: Arc<dyn LlmChat>) -> Orchestrator {
    Orchestrator::new(llm, TurnConfig::default())
}

fn kinds(trace: &[ThoughtStep]) -> Vec<StepKind> {
    trace.iter().map(|s| s.kind).collect()
}

fn project() -> ProjectFileSet {
    let mut files = ProjectFileSet::new();
    files.insert(
        "/app/page.tsx",
        "import Hero from '@/components/Hero';\n\nexport default function Page() {\n  return <main><Hero /></main>;\n}",
    );
    files
}

const HERO_REPLY: &str = r#"I added a hero with a contact button.

### FILE: /components/Hero.tsx
import { useState } from 'react';

export default function Hero() {
  const [open, setOpen] = useState(false);
  return (
    <section className="py-24">
      <h1>Jane Doe</h1>
      <button className="btn">Contact</button>
    </section>
  );
}
"#;

// =========================================================================
// run_turn
// =========================================================================

#[tokio::test]
async fn conversational_reply_changes_nothing() {
    let llm = Arc::new(MockLlm::new(&["  Sure, what colors do you like?  "]));
    let files = project();
    let outcome = orchestrator(llm).run_turn(&[Message::user("hello")], &files, None).await.unwrap();

    assert_eq!(outcome.message, "Sure, what colors do you like?");
    assert!(outcome.updates.is_empty());
    assert_eq!(outcome.files, files);
    assert_eq!(outcome.fix_attempts, 0);
    assert_eq!(
        kinds(&outcome.trace),
        vec![StepKind::Thinking, StepKind::Generating, StepKind::Validating, StepKind::Complete]
    );
    assert!(outcome.trace[1].duration.is_some());
    assert_eq!(outcome.trace[3].message, "No files changed");
}

#[tokio::test]
async fn fixable_defects_are_repaired_and_the_rest_reported() {
    let llm = Arc::new(MockLlm::new(&[HERO_REPLY]));
    let files = project();
    let outcome = orchestrator(llm).run_turn(&[Message::user("add a hero")], &files, None).await.unwrap();

    assert_eq!(outcome.message, "I added a hero with a contact button.");
    assert_eq!(outcome.fix_attempts, 1);
    assert_eq!(
        kinds(&outcome.trace),
        vec![StepKind::Thinking, StepKind::Generating, StepKind::Validating, StepKind::Fixing, StepKind::Complete]
    );
    assert_eq!(outcome.trace[2].details.as_ref().map(Vec::len), Some(3));
    assert_eq!(outcome.trace[3].message, "Auto-fixed 2 of 2 fixable issues");
    assert_eq!(outcome.trace[4].message, "Updated 1 file");

    let hero = outcome.files.get("/components/Hero.tsx").unwrap();
    assert!(hero.starts_with("'use client';\n\n"));
    assert!(hero.contains(r#"<section id="hero" className="py-24">"#));
    assert_eq!(outcome.files.len(), 2);

    // The dead button is not fixable: reported, but the turn still applies.
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].rule, Rule::DeadInteractive);
    assert!(!outcome.errors[0].fixable);
}

#[tokio::test]
async fn prompt_carries_files_request_and_selection() {
    let llm = Arc::new(MockLlm::new(&["ok"]));
    let selection = SelectedElement {
        tag: "h1".into(),
        id: Some("hero-title".into()),
        class_name: None,
        text_content: Some("Jane Doe".into()),
        selector_path: "#hero-title".into(),
    };
    let history = [Message::user("build it"), Message::assistant("built"), Message::user("bigger title")];
    orchestrator(llm.clone()).run_turn(&history, &project(), Some(&selection)).await.unwrap();

    let (system, messages) = llm.last_request();
    assert!(system.contains("### FILE:"));
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], Message::user("build it"));
    assert_eq!(messages[1], Message::assistant("built"));
    let context = &messages[2].content;
    assert!(context.contains("### FILE: /app/page.tsx"));
    assert!(context.contains("Request:\nbigger title"));
    assert!(context.contains("[Focus your changes on the selected element `#hero-title`"));
}

#[tokio::test]
async fn history_limit_keeps_recent_messages() {
    let llm = Arc::new(MockLlm::new(&["ok"]));
    let config = TurnConfig { history_limit: Some(3), ..TurnConfig::default() };
    let history = [
        Message::user("one"),
        Message::assistant("two"),
        Message::user("three"),
        Message::assistant("four"),
        Message::user("five"),
    ];
    Orchestrator::new(llm.clone(), config).run_turn(&history, &ProjectFileSet::new(), None).await.unwrap();

    // The window [two, three, four] starts on an assistant message, which is dropped.
    let (_, messages) = llm.last_request();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents[..2], ["three", "four"]);
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn model_failure_leaves_files_untouched() {
    let files = project();
    let before = files.clone();
    let failure = orchestrator(Arc::new(FailingLlm)).run_turn(&[Message::user("hi")], &files, None).await.unwrap_err();

    assert_eq!(files, before);
    assert!(matches!(failure.error, TurnError::Llm(_)));
    assert_eq!(failure.error.error_code(), "E_LLM_ERROR");
    assert!(failure.error.retryable());
    assert_eq!(kinds(&failure.trace), vec![StepKind::Thinking, StepKind::Error]);
    assert_eq!(failure.trace[1].message, FAILURE_MESSAGE);
}

#[tokio::test]
async fn slow_model_times_out() {
    let config = TurnConfig { timeout: Duration::from_millis(20), ..TurnConfig::default() };
    let failure = Orchestrator::new(Arc::new(SlowLlm), config)
        .run_turn(&[Message::user("hi")], &project(), None)
        .await
        .unwrap_err();
    assert!(matches!(failure.error, TurnError::Timeout(_)));
    assert_eq!(failure.error.error_code(), "E_TURN_TIMEOUT");
    assert_eq!(failure.trace.last().map(|s| s.kind), Some(StepKind::Error));
}

#[tokio::test]
async fn malformed_conversations_are_rejected() {
    let llm: Arc<dyn LlmChat> = Arc::new(MockLlm::new(&[]));
    let orch = orchestrator(llm);

    let empty = orch.run_turn(&[], &project(), None).await.unwrap_err();
    assert!(matches!(empty.error, TurnError::EmptyConversation));

    let trailing = orch
        .run_turn(&[Message::user("hi"), Message::assistant("hello")], &project(), None)
        .await
        .unwrap_err();
    assert_eq!(trailing.error.error_code(), "E_LAST_MESSAGE_NOT_USER");
}

// =========================================================================
// generate_site
// =========================================================================

#[tokio::test]
async fn generate_site_builds_from_an_empty_project() {
    let page = "Here is your site.\n\n### FILE: /app/page.tsx\nexport default function Page() {\n  return <main><section id=\"intro\"><h1>Jane</h1></section></main>;\n}\n";
    let llm = Arc::new(MockLlm::new(&[page]));
    let outcome = orchestrator(llm.clone()).generate_site("Jane, product designer", Some("playful")).await.unwrap();

    assert_eq!(outcome.files.paths().collect::<Vec<_>>(), vec!["/app/page.tsx"]);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.fix_attempts, 0);

    let (_, messages) = llm.last_request();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content.contains("(no files yet"));
    assert!(messages[0].content.contains("Jane, product designer"));
    assert!(messages[0].content.contains("Visual vibe: playful"));
}
