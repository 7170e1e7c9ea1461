//! Turn orchestrator — one user turn from request to validated file set.
//!
//! DESIGN
//! ======
//! thinking → generating (model call, timed, bounded by `TURN_TIMEOUT_SECS`)
//! → parse → validating → fixing (single pass, only when something is
//! fixable, then re-validated for reporting) → complete.
//!
//! A turn is atomic. Updates are merged into a new [`ProjectFileSet`] only
//! after every step has succeeded; on failure the caller gets the partial
//! trace and a generic message, and its own file set was never touched.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::prompt::{build_brief_message, build_system_prompt, build_turn_context};
use super::trace::{StepKind, ThoughtStep, TraceRecorder};
use crate::builder::parser::parse_reply;
use crate::builder::repair::auto_fix_errors;
use crate::builder::validator::{ValidationError, detect_errors};
use crate::builder::{FileUpdate, ProjectFileSet};
use crate::config::TurnConfig;
use crate::error::ErrorCode;
use crate::llm::types::{LlmError, Message, Role};
use crate::llm::{LlmChat, complete};
use crate::sandbox::SelectedElement;

/// Shown to the user whenever a turn fails, whatever the cause.
pub const FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while updating your site. No changes were applied, so please try again.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("conversation is empty")]
    EmptyConversation,
    #[error("last message must come from the user")]
    LastMessageNotUser,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("model call timed out after {0}s")]
    Timeout(u64),
}

impl ErrorCode for TurnError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyConversation => "E_EMPTY_CONVERSATION",
            Self::LastMessageNotUser => "E_LAST_MESSAGE_NOT_USER",
            Self::Llm(_) => "E_LLM_ERROR",
            Self::Timeout(_) => "E_TURN_TIMEOUT",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Llm(e) => e.retryable(),
            Self::Timeout(_) => true,
            Self::EmptyConversation | Self::LastMessageNotUser => false,
        }
    }
}

/// A failed turn: the cause plus the trace recorded up to and including the
/// `error` step.
#[derive(Debug)]
pub struct TurnFailure {
    pub error: TurnError,
    pub trace: Vec<ThoughtStep>,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The model's conversational reply.
    pub message: String,
    /// File writes after repair.
    pub updates: Vec<FileUpdate>,
    /// The input file set with `updates` applied.
    pub files: ProjectFileSet,
    pub trace: Vec<ThoughtStep>,
    /// Defects left after repair. They are reported, not blocking.
    pub errors: Vec<ValidationError>,
    /// Repair passes run (0 or 1).
    pub fix_attempts: u32,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

pub struct Orchestrator {
    llm: Arc<dyn LlmChat>,
    config: TurnConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, config: TurnConfig) -> Self {
        Self { llm, config }
    }

    /// Run one turn. The last message of `history` is the new user request.
    ///
    /// # Errors
    ///
    /// Returns a [`TurnFailure`] when the conversation is malformed or the
    /// model call fails or times out. `files` is never modified.
    pub async fn run_turn(
        &self,
        history: &[Message],
        files: &ProjectFileSet,
        selection: Option<&SelectedElement>,
    ) -> Result<TurnOutcome, TurnFailure> {
        let mut trace = TraceRecorder::new();
        trace.record(StepKind::Thinking, "Reading your request and the current files");

        match self.execute(&mut trace, history, files, selection).await {
            Ok(mut outcome) => {
                outcome.trace = trace.finish();
                Ok(outcome)
            }
            Err(error) => {
                warn!(error = %error, code = error.error_code(), "turn: failed");
                trace.push(ThoughtStep::new(StepKind::Error, FAILURE_MESSAGE).with_details(vec![error.to_string()]));
                Err(TurnFailure { error, trace: trace.finish() })
            }
        }
    }

    /// Generate a first version of the site from a brief and optional vibe.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run_turn`].
    pub async fn generate_site(&self, brief: &str, vibe: Option<&str>) -> Result<TurnOutcome, TurnFailure> {
        let history = [Message::user(build_brief_message(brief, vibe))];
        self.run_turn(&history, &ProjectFileSet::new(), None).await
    }

    async fn execute(
        &self,
        trace: &mut TraceRecorder,
        history: &[Message],
        files: &ProjectFileSet,
        selection: Option<&SelectedElement>,
    ) -> Result<TurnOutcome, TurnError> {
        let (request, prior) = history.split_last().ok_or(TurnError::EmptyConversation)?;
        if request.role != Role::User {
            return Err(TurnError::LastMessageNotUser);
        }

        let system = build_system_prompt();
        let mut messages = self.limit_history(prior);
        messages.push(Message::user(build_turn_context(files, &request.content, selection)));
        info!(
            files = files.len(),
            history = messages.len(),
            selection = selection.map(|s| s.selector_path.as_str()),
            "turn: calling model"
        );

        let started = Instant::now();
        let reply = tokio::time::timeout(
            self.config.timeout,
            complete(self.llm.as_ref(), self.config.max_tokens, &system, &messages),
        )
        .await
        .map_err(|_| TurnError::Timeout(self.config.timeout.as_secs()))??;
        trace.push(ThoughtStep::new(StepKind::Generating, "Generated a response").with_duration(started.elapsed()));

        let parsed = parse_reply(&reply);
        let mut updates = parsed.updates;
        let mut errors = detect_errors(&updates);
        trace.push(ThoughtStep::new(StepKind::Validating, issues_summary(updates.len(), &errors)).with_details(describe(&errors)));

        let mut fix_attempts = 0;
        let fixable = errors.iter().filter(|e| e.fixable).count();
        if fixable > 0 {
            updates = auto_fix_errors(&updates, &errors);
            fix_attempts = 1;
            errors = detect_errors(&updates);
            let message = format!(
                "Auto-fixed {fixed} of {fixable} fixable {issue}",
                fixed = fixable.saturating_sub(errors.iter().filter(|e| e.fixable).count()),
                issue = plural(fixable, "issue"),
            );
            trace.push(ThoughtStep::new(StepKind::Fixing, message).with_details(describe(&errors)));
        }

        let merged = files.with_updates(&updates);
        let message = match updates.len() {
            0 => "No files changed".to_string(),
            n => format!("Updated {n} {}", plural(n, "file")),
        };
        trace.record(StepKind::Complete, message);
        info!(updated = updates.len(), remaining_errors = errors.len(), fix_attempts, "turn: complete");

        Ok(TurnOutcome {
            message: parsed.natural_message,
            updates,
            files: merged,
            trace: Vec::new(),
            errors,
            fix_attempts,
        })
    }

    /// Prior messages sent to the model. With a limit, only the most recent
    /// ones are kept, and the window never starts on an assistant message.
    fn limit_history(&self, prior: &[Message]) -> Vec<Message> {
        let start = self.config.history_limit.map_or(0, |limit| prior.len().saturating_sub(limit));
        prior[start..]
            .iter()
            .skip_while(|m| start > 0 && m.role == Role::Assistant)
            .cloned()
            .collect()
    }
}

fn issues_summary(files: usize, errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return format!("Checked {files} {} with no issues", plural(files, "file"));
    }
    format!("Found {} {} in {files} {}", errors.len(), plural(errors.len(), "issue"), plural(files, "file"))
}

fn describe(errors: &[ValidationError]) -> Vec<String> {
    errors
        .iter()
        .map(|e| match e.line {
            Some(line) => format!("{}:{line}: {}", e.file, e.message),
            None => format!("{}: {}", e.file, e.message),
        })
        .collect()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 { word.to_string() } else { format!("{word}s") }
}

#[cfg(test)]
#[path = "turn_test.rs"]
mod tests;
