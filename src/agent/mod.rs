//! Message pipeline: parse, gate on confidence, execute, reply.

pub mod dispatcher;
pub mod intent;
pub mod parser;
pub mod responder;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use dispatcher::{
    ActionResult, CLARIFICATION_MESSAGE, CONFIDENCE_THRESHOLD, DispatchOutcome, Dispatcher,
};
pub use intent::{Intent, IntentAction, IntentSource, heuristic_intent};
pub use parser::IntentParser;
pub use responder::compose_reply;

/// Outcome of one user message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub message_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub reply: String,
    pub intent: Intent,
    pub intent_source: IntentSource,
    /// A wallet or price handler ran and succeeded.
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Agent {
    parser: IntentParser,
    dispatcher: Dispatcher,
}

impl Agent {
    pub fn new(parser: IntentParser, dispatcher: Dispatcher) -> Self {
        Self { parser, dispatcher }
    }

    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }

    pub async fn handle_message(&self, text: &str) -> AgentReply {
        let message_id = Uuid::new_v4();
        let intent = self.parser.parse_intent(text).await;
        tracing::info!(
            %message_id,
            action = %intent.action,
            confidence = intent.confidence,
            source = ?intent.source,
            "Parsed intent"
        );

        let (reply, executed, result, error) = match self.dispatcher.dispatch(&intent).await {
            DispatchOutcome::Clarify => (CLARIFICATION_MESSAGE.to_string(), false, None, None),
            DispatchOutcome::Executed(result) => (
                compose_reply(&intent, Some(&result)),
                result != ActionResult::Conversation,
                Some(result.to_json()).filter(|value| !value.is_null()),
                None,
            ),
            DispatchOutcome::Failed(e) => {
                (compose_reply(&intent, None), false, None, Some(e.to_string()))
            }
        };

        AgentReply {
            message_id,
            timestamp: Utc::now(),
            reply,
            intent_source: intent.source,
            intent,
            executed,
            result,
            error,
        }
    }
}
