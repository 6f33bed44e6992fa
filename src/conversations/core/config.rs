//! Configuration for the conversation list subsystem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conversations::core::errors::{ConversationError, ConversationResult};
use crate::conversations::core::ids::UserId;

/// Environment variable holding the local user's id.
pub const ENV_USER_ID: &str = "RECENT_CHATS_USER_ID";
/// Environment variable selecting the modify-path matching rule.
pub const ENV_PAIR_MATCHING: &str = "RECENT_CHATS_PAIR_MATCHING";
/// Environment variable for the feed channel capacity.
pub const ENV_CHANNEL_CAPACITY: &str = "RECENT_CHATS_CHANNEL_CAPACITY";
/// Environment variable for the HTTP port.
pub const ENV_PORT: &str = "RECENT_CHATS_PORT";

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Merge settings.
    pub merger: MergerConfig,
    /// Feed settings.
    pub feed: FeedConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl ChatConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed, or if
    /// the resulting configuration is invalid.
    pub fn from_env() -> ConversationResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed, or if the resulting
    /// configuration is invalid.
    pub fn from_lookup<F>(lookup: F) -> ConversationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(user_id) = lookup(ENV_USER_ID) {
            config.merger.local_user_id = user_id;
        }

        if let Some(mode) = lookup(ENV_PAIR_MATCHING) {
            config.merger.pair_matching = mode.parse().map_err(|bad| {
                ConversationError::InvalidConfig(format!("{ENV_PAIR_MATCHING}: unknown mode {bad:?}"))
            })?;
        }

        if let Some(capacity) = lookup(ENV_CHANNEL_CAPACITY) {
            config.feed.channel_capacity = capacity.trim().parse().map_err(|err| {
                ConversationError::InvalidConfig(format!("{ENV_CHANNEL_CAPACITY}: {err}"))
            })?;
        }

        if let Some(port) = lookup(ENV_PORT) {
            config.server.port = port.trim().parse().map_err(|err| {
                ConversationError::InvalidConfig(format!("{ENV_PORT}: {err}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConversationResult<()> {
        self.merger.local_user()?;

        if self.feed.channel_capacity == 0 {
            return Err(ConversationError::InvalidConfig(
                "feed.channel_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Rule used to find the entry a `Modified` event refers to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairMatching {
    /// Sender must equal sender and receiver must equal receiver.
    ///
    /// A reply in the opposite direction does not find the entry.
    #[default]
    Directional,
    /// Either direction of the same two parties matches.
    Unordered,
}

impl PairMatching {
    /// Stable string form for configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::Unordered => "unordered",
        }
    }

    /// Whether an entry keyed by `(entry_sender, entry_receiver)` is the
    /// conversation addressed by `(sender, receiver)`.
    #[must_use]
    pub fn matches(
        self,
        entry_sender: &UserId,
        entry_receiver: &UserId,
        sender: &UserId,
        receiver: &UserId,
    ) -> bool {
        let same_direction = entry_sender == sender && entry_receiver == receiver;
        match self {
            Self::Directional => same_direction,
            Self::Unordered => {
                same_direction || (entry_sender == receiver && entry_receiver == sender)
            }
        }
    }
}

impl fmt::Display for PairMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PairMatching {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "directional" => Ok(Self::Directional),
            "unordered" => Ok(Self::Unordered),
            _ => Err(value.to_string()),
        }
    }
}

/// Merge settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MergerConfig {
    /// Id of the authenticated local user.
    pub local_user_id: String,
    /// Matching rule for `Modified` events.
    pub pair_matching: PairMatching,
}

impl MergerConfig {
    /// Parse the configured local user id.
    ///
    /// # Errors
    /// Returns an error if the id is empty or malformed.
    pub fn local_user(&self) -> ConversationResult<UserId> {
        Ok(UserId::new(&self.local_user_id)?)
    }
}

/// Feed settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of batches buffered between the subscriptions and the merger.
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}
