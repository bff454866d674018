//! Core domain types for clawstat
//!
//! This module contains the transcript record types written by the agent
//! runtime and the strongly-typed values derived from them: model names,
//! session IDs, and token counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Model name used when a message does not identify its model
pub const UNKNOWN_MODEL: &str = "unknown";

/// Session ID prefix the agent runtime uses for spawned sub-agents
pub const SUBAGENT_PREFIX: &str = "agent:main:subagent:";

/// Strongly-typed model name wrapper
///
/// # Examples
/// ```
/// use clawstat_core::types::ModelName;
///
/// let model = ModelName::new("zai/glm-4.7");
/// assert_eq!(model.as_str(), "zai/glm-4.7");
///
/// assert_eq!(ModelName::from_optional(None).as_str(), "unknown");
/// assert_eq!(ModelName::from_optional(Some("")).as_str(), "unknown");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Create a new ModelName from any string-like type
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The sentinel model name
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_MODEL)
    }

    /// Resolve an optional model field, falling back to the sentinel
    ///
    /// Empty strings count as missing, matching how the agent runtime
    /// writes transcripts for messages it could not attribute.
    pub fn from_optional(name: Option<&str>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Self::new(name),
            _ => Self::unknown(),
        }
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly-typed session ID wrapper
///
/// Session IDs are directory names under `<workspace>/sessions` and are
/// otherwise opaque. The only structure recognized is the sub-agent prefix.
///
/// # Examples
/// ```
/// use clawstat_core::types::{SessionId, SessionKind};
///
/// let session = SessionId::new("agent:main:subagent:crm-builder");
/// assert_eq!(session.kind(), SessionKind::Subagent);
/// assert_eq!(session.label(), "crm-builder");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this session belongs to the main agent or a spawned sub-agent
    pub fn kind(&self) -> SessionKind {
        if self.0.starts_with(SUBAGENT_PREFIX) {
            SessionKind::Subagent
        } else {
            SessionKind::Main
        }
    }

    /// Short display label: the last `:` segment for sub-agents, the full ID otherwise
    pub fn label(&self) -> &str {
        match self.kind() {
            SessionKind::Subagent => self.0.rsplit(':').next().unwrap_or(&self.0),
            SessionKind::Main => &self.0,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classification of a session by the agent that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// The main agent conversation
    Main,
    /// A spawned sub-agent
    Subagent,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Subagent => write!(f, "subagent"),
        }
    }
}

/// Token counts for usage tracking
///
/// # Examples
/// ```
/// use clawstat_core::types::TokenCounts;
///
/// let tokens = TokenCounts::new(100, 50);
/// assert_eq!(tokens.total(), 150);
///
/// let combined = tokens + TokenCounts::new(10, 5);
/// assert_eq!(combined.prompt_tokens, 110);
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    /// Tokens sent to the model
    pub prompt_tokens: u64,
    /// Tokens generated by the model
    pub completion_tokens: u64,
}

impl TokenCounts {
    /// Create new TokenCounts
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Calculate total tokens, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Total tokens, or `None` if the sum does not fit in a `u64`
    pub fn checked_total(&self) -> Option<u64> {
        self.prompt_tokens.checked_add(self.completion_tokens)
    }
}

// Sums saturate; transcripts whose totals overflow are rejected at load time
impl Add for TokenCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens.saturating_add(other.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(other.completion_tokens),
        }
    }
}

impl AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Raw usage block attached to a transcript message
///
/// Both counters are optional; missing or `null` values count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUsage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

impl MessageUsage {
    /// Token counts with missing values defaulted to zero
    pub fn tokens(&self) -> TokenCounts {
        TokenCounts::new(
            self.prompt_tokens.unwrap_or(0),
            self.completion_tokens.unwrap_or(0),
        )
    }
}

/// One message record from a session transcript
///
/// Fields other than `usage` and `model` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Usage data, present only on messages that consumed tokens
    #[serde(default)]
    pub usage: Option<MessageUsage>,
    /// Model that produced the message
    #[serde(default)]
    pub model: Option<String>,
}

impl Message {
    /// Model name with the sentinel applied
    pub fn model_name(&self) -> ModelName {
        ModelName::from_optional(self.model.as_deref())
    }
}

/// Parse the contents of a `transcript.json` file
///
/// A transcript is a JSON array of message records.
pub fn parse_transcript(content: &str) -> serde_json::Result<Vec<Message>> {
    serde_json::from_str(content)
}

/// Sum of all usage in a transcript, or `None` if any partial sum overflows
///
/// ```
/// use clawstat_core::types::{parse_transcript, transcript_total};
///
/// let messages = parse_transcript(
///     r#"[{"usage":{"prompt_tokens":18446744073709551615,"completion_tokens":1}}]"#,
/// ).unwrap();
/// assert_eq!(transcript_total(&messages), None);
/// ```
pub fn transcript_total(messages: &[Message]) -> Option<u64> {
    messages
        .iter()
        .filter_map(|m| m.usage.as_ref())
        .try_fold(0u64, |acc, usage| acc.checked_add(usage.tokens().checked_total()?))
}

/// A single usage contribution extracted from a transcript message
///
/// # Examples
/// ```
/// use clawstat_core::types::{Message, MessageUsage, SessionId, UsageEntry};
///
/// let message = Message {
///     usage: Some(MessageUsage { prompt_tokens: Some(100), completion_tokens: Some(50) }),
///     model: None,
/// };
///
/// let entry = UsageEntry::from_message(&SessionId::new("s1"), &message).unwrap();
/// assert_eq!(entry.model.as_str(), "unknown");
/// assert_eq!(entry.tokens.total(), 150);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Session the message belongs to
    pub session_id: SessionId,
    /// Model bucket for this contribution
    pub model: ModelName,
    /// Token counts for this message
    #[serde(flatten)]
    pub tokens: TokenCounts,
}

impl UsageEntry {
    /// Build an entry from a message, or `None` when it carries no usage
    pub fn from_message(session_id: &SessionId, message: &Message) -> Option<Self> {
        let usage = message.usage.as_ref()?;
        Some(Self {
            session_id: session_id.clone(),
            model: message.model_name(),
            tokens: usage.tokens(),
        })
    }
}
