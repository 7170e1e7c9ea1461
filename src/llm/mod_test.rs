use super::*;
use types::ContentBlock;

struct FixedLlm {
    response: std::sync::Mutex<Option<Result<ChatResponse, u16>>>,
}

impl FixedLlm {
    fn new(response: Result<ChatResponse, u16>) -> Self {
        Self { response: std::sync::Mutex::new(Some(response)) }
    }
}

#[async_trait::async_trait]
impl LlmChat for FixedLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, _messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match self.response.lock().unwrap().take().expect("one call per test") {
            Ok(response) => Ok(response),
            Err(status) => Err(LlmError::ApiResponse { status, body: "overloaded".into() }),
        }
    }
}

fn response(content: Vec<ContentBlock>, stop_reason: &str) -> ChatResponse {
    ChatResponse { content, model: "mock".into(), stop_reason: stop_reason.into(), input_tokens: 10, output_tokens: 20 }
}

#[tokio::test]
async fn complete_joins_text_blocks_and_drops_thinking() {
    let llm = FixedLlm::new(Ok(response(
        vec![
            ContentBlock::Thinking { thinking: "plan".into() },
            ContentBlock::Text { text: "Here you go.".into() },
            ContentBlock::Text { text: "### FILE: /a.tsx\nx".into() },
        ],
        "end_turn",
    )));
    let text = complete(&llm, 100, "system", &[Message::user("hi")]).await.unwrap();
    assert_eq!(text, "Here you go.\n### FILE: /a.tsx\nx");
}

#[tokio::test]
async fn complete_returns_truncated_text_as_is() {
    let llm = FixedLlm::new(Ok(response(vec![ContentBlock::Text { text: "partial".into() }], "max_tokens")));
    let text = complete(&llm, 1, "system", &[Message::user("hi")]).await.unwrap();
    assert_eq!(text, "partial");
}

#[tokio::test]
async fn complete_propagates_provider_errors() {
    let llm = FixedLlm::new(Err(529));
    let err = complete(&llm, 100, "system", &[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LlmError::ApiResponse { status: 529, .. }));
}
