//! Reply text for an intent and its execution result.

use crate::agent::dispatcher::ActionResult;
use crate::agent::intent::{Intent, IntentAction};

pub const DEFAULT_GREETING: &str = "👋 Hello! How can I assist you?";
pub const FALLBACK_REPLY: &str =
    "🤖 Sorry, I didn't get that. Try commands like 'send', 'swap', or 'balance'.";

fn or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// `result` is `None` when execution failed.
pub fn compose_reply(intent: &Intent, result: Option<&ActionResult>) -> String {
    match intent.action {
        IntentAction::Send => {
            let (amount, token, to) = (
                or_empty(&intent.amount),
                or_empty(&intent.token),
                or_empty(&intent.to),
            );
            match result {
                Some(_) => format!("✅ Sent {amount} {token} to {to}."),
                None => format!("❌ Failed to send {amount} {token} to {to}."),
            }
        }
        IntentAction::Balance => {
            let lines: Vec<String> = match result {
                Some(ActionResult::Balances(balances)) => balances
                    .iter()
                    .map(|b| format!("- {}: {}", b.token, b.balance))
                    .collect(),
                Some(ActionResult::TokenBalance { token, balance }) => {
                    vec![format!("- {token}: {balance}")]
                }
                _ => Vec::new(),
            };
            if lines.is_empty() {
                "💰 No balances found.".to_string()
            } else {
                format!("💰 Your balances:\n{}", lines.join("\n"))
            }
        }
        IntentAction::Swap => {
            let amount = or_empty(&intent.amount);
            let from = or_empty(&intent.from_token);
            match result {
                Some(_) => format!(
                    "✅ Swapped {amount} {from} to {}.",
                    or_empty(&intent.to_token)
                ),
                None => format!("❌ Failed to swap {amount} {from}."),
            }
        }
        IntentAction::Price => match result {
            Some(ActionResult::Price { token, value }) => {
                format!("📊 Current price of {token}: {value}")
            }
            _ => "🔍 Checking price...".to_string(),
        },
        IntentAction::Recover => "🔐 Please contact your guardians to begin recovery.".to_string(),
        IntentAction::GeneralPrompts => intent
            .ai_response
            .clone()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        IntentAction::Unknown => FALLBACK_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletBalance;
    use alloy::primitives::TxHash;
    use pretty_assertions::assert_eq;

    fn send_intent() -> Intent {
        Intent::new(IntentAction::Send, 0.9)
            .with_token("BDAG")
            .with_amount("0.1")
            .with_recipient("0xabc")
    }

    #[test]
    fn send_success_and_failure() {
        let sent = ActionResult::Sent(TxHash::ZERO);
        assert_eq!(
            compose_reply(&send_intent(), Some(&sent)),
            "✅ Sent 0.1 BDAG to 0xabc."
        );
        assert_eq!(
            compose_reply(&send_intent(), None),
            "❌ Failed to send 0.1 BDAG to 0xabc."
        );
    }

    #[test]
    fn balances_listed_one_per_line() {
        let result = ActionResult::Balances(vec![
            WalletBalance {
                token: "BDAG".to_string(),
                balance: "1.5".to_string(),
                symbol: "BDAG".to_string(),
                usd_value: None,
            },
            WalletBalance {
                token: "USDC".to_string(),
                balance: "20.0".to_string(),
                symbol: "USDC".to_string(),
                usd_value: None,
            },
        ]);
        let intent = Intent::new(IntentAction::Balance, 0.9);
        assert_eq!(
            compose_reply(&intent, Some(&result)),
            "💰 Your balances:\n- BDAG: 1.5\n- USDC: 20.0"
        );
        assert_eq!(
            compose_reply(&intent, Some(&ActionResult::Balances(vec![]))),
            "💰 No balances found."
        );
        assert_eq!(compose_reply(&intent, None), "💰 No balances found.");
    }

    #[test]
    fn single_token_balance() {
        let result = ActionResult::TokenBalance {
            token: "BDAG".to_string(),
            balance: "2.0".to_string(),
        };
        assert_eq!(
            compose_reply(&Intent::new(IntentAction::Balance, 0.9), Some(&result)),
            "💰 Your balances:\n- BDAG: 2.0"
        );
    }

    #[test]
    fn swap_failure_names_source_token() {
        let intent = Intent::new(IntentAction::Swap, 0.8)
            .with_pair("USDC", "BDAG")
            .with_amount("100");
        assert_eq!(compose_reply(&intent, None), "❌ Failed to swap 100 USDC.");
    }

    #[test]
    fn price_and_pending_price() {
        let intent = Intent::new(IntentAction::Price, 0.9).with_token("bitcoin");
        let result = ActionResult::Price {
            token: "bitcoin".to_string(),
            value: "$65000".to_string(),
        };
        assert_eq!(
            compose_reply(&intent, Some(&result)),
            "📊 Current price of bitcoin: $65000"
        );
        assert_eq!(compose_reply(&intent, None), "🔍 Checking price...");
    }

    #[test]
    fn general_prompt_prefers_model_text() {
        let intent = Intent::new(IntentAction::GeneralPrompts, 1.0).with_ai_response("gm!");
        assert_eq!(compose_reply(&intent, None), "gm!");
        let intent = Intent::new(IntentAction::GeneralPrompts, 1.0);
        assert_eq!(compose_reply(&intent, None), DEFAULT_GREETING);
    }

    #[test]
    fn recover_and_unknown_are_fixed() {
        assert_eq!(
            compose_reply(&Intent::new(IntentAction::Recover, 0.9), None),
            "🔐 Please contact your guardians to begin recovery."
        );
        assert_eq!(
            compose_reply(&Intent::new(IntentAction::Unknown, 0.9), None),
            FALLBACK_REPLY
        );
    }
}
