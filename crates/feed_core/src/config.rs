use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two-letter prefixes owned by special state fields.
pub const SEARCH_PREFIX: &str = "xs";
pub const FILTER_PREFIX: &str = "xo";
pub const FILTERED_PREFIX: &str = "xx";
pub const PAGE_PREFIX: &str = "xp";
pub const THEME_PREFIX: &str = "xa";

const RESERVED_SPECIAL: [char; 5] = ['s', 'o', 'x', 'p', 'a'];

/// How a card's file is turned into a body when it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Title line, topics line, then body text.
    #[default]
    Text,
    /// The whole file is the body.
    Simple,
    Image,
    Song,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTypeConfig {
    pub name: String,
    /// Token prefix. Defaults to the first character of `name`.
    #[serde(default)]
    pub prefix: Option<char>,
    /// Cards of this type per page.
    pub quota: usize,
    /// Minimum index distance between two cards of this type.
    #[serde(default)]
    pub spacing: usize,
    #[serde(default)]
    pub randomize: bool,
    #[serde(default)]
    pub searchable: bool,
    /// Hashtag names that select this type in a search (`#name`).
    #[serde(default)]
    pub filter_names: Vec<String>,
    #[serde(default)]
    pub body: BodyKind,
    /// Directory under the data root. Defaults to `name`.
    #[serde(default)]
    pub directory: Option<String>,
}

impl CardTypeConfig {
    pub fn new(name: impl Into<String>, quota: usize, spacing: usize) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            quota,
            spacing,
            randomize: false,
            searchable: false,
            filter_names: Vec::new(),
            body: BodyKind::Text,
            directory: None,
        }
    }

    pub fn randomized(mut self) -> Self {
        self.randomize = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn with_body(mut self, body: BodyKind) -> Self {
        self.body = body;
        self
    }

    pub fn with_filter_names(mut self, names: &[&str]) -> Self {
        self.filter_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn prefix(&self) -> char {
        self.prefix
            .or_else(|| self.name.chars().next())
            .unwrap_or('?')
    }

    pub fn directory(&self) -> &str {
        self.directory.as_deref().unwrap_or(&self.name)
    }

    /// True when `name` (without `#`) selects this type as a filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        self.name == name || self.filter_names.iter().any(|f| f == name)
    }
}

/// Default theme selection when the token carries no appearance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefaultTheme {
    #[default]
    First,
    Index(usize),
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub card_types: Vec<CardTypeConfig>,
    pub common_type: String,
    #[serde(default)]
    pub pinned_type: Option<String>,
    #[serde(default)]
    pub permalink_types: Vec<String>,
    #[serde(default = "default_max_token_bytes")]
    pub max_token_bytes: usize,
    #[serde(default = "default_max_query_terms")]
    pub max_query_terms: usize,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub default_theme: DefaultTheme,
}

fn default_max_token_bytes() -> usize {
    512
}

fn default_max_query_terms() -> usize {
    10
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("card type {0:?} is referenced but not configured")]
    UnknownType(String),
    #[error("card types {first:?} and {second:?} share prefix {prefix:?}")]
    DuplicatePrefix {
        prefix: char,
        first: String,
        second: String,
    },
    #[error("card type {0:?} uses the reserved prefix 'x'")]
    ReservedPrefix(String),
    #[error("permalink type {0:?} collides with a special state prefix")]
    PermalinkCollision(String),
    #[error("card type {0:?} has an empty name")]
    EmptyName(String),
}

impl FeedConfig {
    pub fn new(card_types: Vec<CardTypeConfig>, common_type: impl Into<String>) -> Self {
        Self {
            card_types,
            common_type: common_type.into(),
            pinned_type: None,
            permalink_types: Vec::new(),
            max_token_bytes: default_max_token_bytes(),
            max_query_terms: default_max_query_terms(),
            themes: Vec::new(),
            default_theme: DefaultTheme::First,
        }
    }

    pub fn card_type(&self, name: &str) -> Option<&CardTypeConfig> {
        self.card_types.iter().find(|t| t.name == name)
    }

    pub fn type_for_prefix(&self, prefix: char) -> Option<&CardTypeConfig> {
        self.card_types.iter().find(|t| t.prefix() == prefix)
    }

    pub fn is_common(&self, name: &str) -> bool {
        self.common_type == name
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned_type.as_deref() == Some(name)
    }

    /// Sum of every quota; the size of a full page.
    pub fn max_items(&self) -> usize {
        self.card_types.iter().map(|t| t.quota).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, ty) in self.card_types.iter().enumerate() {
            if ty.name.is_empty() {
                return Err(ConfigError::EmptyName(ty.name.clone()));
            }
            if ty.prefix() == 'x' {
                return Err(ConfigError::ReservedPrefix(ty.name.clone()));
            }
            if let Some(other) = self.card_types[..i]
                .iter()
                .find(|o| o.prefix() == ty.prefix())
            {
                return Err(ConfigError::DuplicatePrefix {
                    prefix: ty.prefix(),
                    first: other.name.clone(),
                    second: ty.name.clone(),
                });
            }
        }

        let referenced = std::iter::once(&self.common_type)
            .chain(self.pinned_type.iter())
            .chain(self.permalink_types.iter());
        for name in referenced {
            if self.card_type(name).is_none() {
                return Err(ConfigError::UnknownType(name.clone()));
            }
        }

        for name in &self.permalink_types {
            let prefix = self.card_type(name).map(CardTypeConfig::prefix);
            if prefix.is_some_and(|p| RESERVED_SPECIAL.contains(&p)) {
                return Err(ConfigError::PermalinkCollision(name.clone()));
            }
        }
        Ok(())
    }
}
