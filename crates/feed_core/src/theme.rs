use rand::Rng;
use serde::Serialize;

use crate::config::{DefaultTheme, FeedConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTheme {
    pub index: usize,
    pub path: String,
    /// Picked at random rather than requested.
    pub random: bool,
}

/// Maps appearance indices onto configured theme paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSet {
    themes: Vec<String>,
    default: DefaultTheme,
}

impl ThemeSet {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            themes: config.themes.clone(),
            default: config.default_theme.clone(),
        }
    }

    /// Out-of-range indices wrap. `None` falls back to the configured default.
    pub fn resolve<R: Rng + ?Sized>(&self, index: Option<usize>, rng: &mut R) -> Option<ResolvedTheme> {
        if self.themes.is_empty() {
            return None;
        }
        let (index, random) = match (index, &self.default) {
            (Some(i), _) => (i % self.themes.len(), false),
            (None, DefaultTheme::First) => (0, false),
            (None, DefaultTheme::Index(i)) => (i % self.themes.len(), false),
            (None, DefaultTheme::Random) => (rng.gen_range(0..self.themes.len()), true),
        };
        Some(ResolvedTheme {
            index,
            path: self.themes[index].clone(),
            random,
        })
    }
}
