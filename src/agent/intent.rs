//! Structured intents parsed from free-text wallet commands.

use serde::{Deserialize, Deserializer, Serialize};

/// Greeting returned by the keyword heuristic for non-actionable text.
pub const HEURISTIC_GREETING: &str = "👋 Hello! How can I assist you with your wallet today?";

/// Operation requested by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IntentAction {
    Send,
    Swap,
    Balance,
    Recover,
    Price,
    #[serde(rename = "general prompts")]
    GeneralPrompts,
    #[serde(other)]
    Unknown,
}

impl IntentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Swap => "swap",
            Self::Balance => "balance",
            Self::Recover => "recover",
            Self::Price => "price",
            Self::GeneralPrompts => "general prompts",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an intent came from.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntentSource {
    #[default]
    Remote,
    Heuristic,
}

/// A parsed user command. Consumed once by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub action: IntentAction,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip)]
    pub source: IntentSource,
}

/// Models sometimes emit `"amount": 0.5` instead of `"amount": "0.5"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => Some(text),
        Some(Raw::Number(number)) => Some(number.to_string()),
        None => None,
    })
}

impl Intent {
    pub fn new(action: IntentAction, confidence: f64) -> Self {
        Self {
            action,
            confidence,
            token: None,
            amount: None,
            to: None,
            from_token: None,
            to_token: None,
            ai_response: None,
            source: IntentSource::Remote,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn with_recipient(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_pair(mut self, from_token: impl Into<String>, to_token: impl Into<String>) -> Self {
        self.from_token = Some(from_token.into());
        self.to_token = Some(to_token.into());
        self
    }

    pub fn with_ai_response(mut self, response: impl Into<String>) -> Self {
        self.ai_response = Some(response.into());
        self
    }

    pub fn from_heuristic(mut self) -> Self {
        self.source = IntentSource::Heuristic;
        self
    }
}

/// Keyword fallback used when the remote completion is unavailable or
/// unusable. First match wins.
pub fn heuristic_intent(text: &str) -> Intent {
    let message = text.to_lowercase();

    let intent = if message.contains("send") && message.contains("bdag") {
        Intent::new(IntentAction::Send, 0.8)
            .with_token("BDAG")
            .with_amount("0.1")
            .with_recipient("demo address")
    } else if message.contains("balance") {
        Intent::new(IntentAction::Balance, 0.9)
    } else if message.contains("swap") {
        Intent::new(IntentAction::Swap, 0.8)
            .with_pair("USDC", "BDAG")
            .with_amount("100")
    } else if message.contains("price") {
        Intent::new(IntentAction::Price, 0.9).with_token("BDAG")
    } else if message.contains("recover") {
        Intent::new(IntentAction::Recover, 0.9)
    } else {
        Intent::new(IntentAction::GeneralPrompts, 1.0).with_ai_response(HEURISTIC_GREETING)
    };

    intent.from_heuristic()
}
