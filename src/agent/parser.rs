//! Free text to `Intent` via the remote completion, with a keyword fallback.
//!
//! Model replies are repaired before strict decoding: reasoning blocks
//! (`<think>…</think>`) and markdown fences are dropped and the outermost JSON
//! object is extracted. Anything that still fails to decode or validate is
//! replaced by `heuristic_intent`, tagged `IntentSource::Heuristic`.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::agent::intent::{Intent, IntentSource, heuristic_intent};
use crate::error::LlmError;
use crate::llm::IntentCompletion;
use crate::llm::prompt::{SYSTEM_PROMPT, user_message};

fn think_block() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").ok())
        .as_ref()
}

fn code_fence() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[A-Za-z]*").ok()).as_ref()
}

fn strip(pattern: Option<&Regex>, text: &str) -> String {
    match pattern {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Strip reasoning and fences and cut the outermost `{…}` span.
pub fn repair_reply(raw: &str) -> Option<String> {
    let without_think = strip(think_block(), raw);
    let without_fences = strip(code_fence(), &without_think);
    let start = without_fences.find('{')?;
    let end = without_fences.rfind('}')?;
    if end < start {
        return None;
    }
    Some(without_fences[start..=end].to_string())
}

/// Repair, decode and validate a model reply.
pub fn decode_intent(provider: &str, raw: &str) -> Result<Intent, LlmError> {
    let invalid = |reason: String| LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason,
    };

    let json = repair_reply(raw).ok_or_else(|| invalid("reply contains no JSON object".to_string()))?;
    let mut intent: Intent =
        serde_json::from_str(&json).map_err(|e| invalid(format!("intent shape: {e}")))?;

    if !intent.confidence.is_finite() || !(0.0..=1.0).contains(&intent.confidence) {
        return Err(invalid(format!(
            "confidence {} outside [0, 1]",
            intent.confidence
        )));
    }
    intent.source = IntentSource::Remote;
    Ok(intent)
}

pub struct IntentParser {
    completion: Arc<dyn IntentCompletion>,
}

impl IntentParser {
    pub fn new(completion: Arc<dyn IntentCompletion>) -> Self {
        Self { completion }
    }

    /// Remote completion only; errors are returned to the caller.
    pub async fn parse_remote(&self, text: &str) -> Result<Intent, LlmError> {
        let provider = self.completion.provider_name();
        let reply = self
            .completion
            .complete(SYSTEM_PROMPT, &user_message(text))
            .await?;
        tracing::debug!(provider, reply = %reply, "Completion reply");
        decode_intent(provider, &reply)
    }

    /// Never fails: any remote problem yields the heuristic intent.
    pub async fn parse_intent(&self, text: &str) -> Intent {
        match self.parse_remote(text).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!("Intent parsing fell back to heuristic: {}", e);
                heuristic_intent(text)
            }
        }
    }
}
