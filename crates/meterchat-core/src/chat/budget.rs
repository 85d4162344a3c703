//! Token budget gate for chat turns.
//!
//! Cost is estimated with a fixed characters-per-token heuristic (4 by
//! default, integer division, no tokenizer). The same estimator prices the
//! prompt at the gate and the reply at debit time, so the two never drift.
//!
//! Decision rule: reject when `balance <= estimated_tokens`. A rejection is a
//! routine outcome and must not touch the balance.

use meterchat_types::chat::ConversationHistory;
use meterchat_types::config::{BudgetConfig, OutputCeiling};

/// Characters-per-token estimator.
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    chars_per_token: u64,
}

impl TokenEstimator {
    /// A zero ratio is treated as 1 so estimation never divides by zero.
    pub fn new(chars_per_token: u32) -> Self {
        Self {
            chars_per_token: u64::from(chars_per_token.max(1)),
        }
    }

    pub fn estimate_text(&self, text: &str) -> u64 {
        text.chars().count() as u64 / self.chars_per_token
    }

    /// Estimate over the concatenated content of every message.
    pub fn estimate_history(&self, history: &ConversationHistory) -> u64 {
        history.total_chars() as u64 / self.chars_per_token
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Outcome of the budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admit {
        estimated_tokens: u64,
        max_output_tokens: u32,
    },
    Reject {
        estimated_tokens: u64,
    },
}

/// Admits or rejects a candidate conversation against a balance.
#[derive(Debug, Clone)]
pub struct BudgetGate {
    estimator: TokenEstimator,
    ceiling: OutputCeiling,
}

impl BudgetGate {
    pub fn new(estimator: TokenEstimator, ceiling: OutputCeiling) -> Self {
        Self { estimator, ceiling }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(
            TokenEstimator::new(config.chars_per_token),
            config.output_ceiling,
        )
    }

    pub fn estimator(&self) -> TokenEstimator {
        self.estimator
    }

    /// Decide whether `candidate` may be sent upstream.
    ///
    /// An admitted call's output ceiling never exceeds what the balance has
    /// left after the prompt estimate, whichever policy is configured.
    pub fn check(&self, candidate: &ConversationHistory, balance: u64) -> GateDecision {
        let estimated_tokens = self.estimator.estimate_history(candidate);
        if balance <= estimated_tokens {
            return GateDecision::Reject { estimated_tokens };
        }

        let headroom = balance - estimated_tokens;
        let max_output_tokens = match self.ceiling {
            OutputCeiling::Fixed { tokens } => u64::from(tokens).min(headroom),
            OutputCeiling::Dynamic => headroom,
        };

        GateDecision::Admit {
            estimated_tokens,
            max_output_tokens: u32::try_from(max_output_tokens).unwrap_or(u32::MAX),
        }
    }

    /// Tokens to debit for a reply: its own length under the same heuristic.
    pub fn reply_cost(&self, reply: &str) -> u64 {
        self.estimator.estimate_text(reply)
    }
}
