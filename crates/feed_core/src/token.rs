//! Colon-delimited page-state token.
//!
//! A token is a list of pieces joined by `:`. A piece is the seed (bare
//! digits), a per-type distance (`<prefix><digits>`), a special field
//! (`xs` search, `xo` filter, `xx` filtered count, `xp` page, `xa` theme,
//! `x<prefix>` permalink) or leftover text. Decoding never fails: anything it
//! cannot use is handed back as leftover and the rest of the state falls back
//! to fresh-page defaults.

use std::collections::BTreeMap;

use engine_logging::engine_debug;
use rand::Rng;

use crate::config::{
    FeedConfig, FILTERED_PREFIX, FILTER_PREFIX, PAGE_PREFIX, SEARCH_PREFIX, THEME_PREFIX,
};
use crate::seed::Seed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permalink {
    pub ctype: String,
    pub id: String,
}

/// Decoded page state.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub seed: Seed,
    /// Distance of each type's last shown card from the end of the prior page.
    /// A missing entry means no card of that type has been shown yet.
    pub distances: BTreeMap<String, usize>,
    pub search: Vec<String>,
    /// Card type names selected through `#name` filters.
    pub card_filter: Vec<String>,
    /// Search results excluded by filtering on earlier pages.
    pub filtered: usize,
    pub page: usize,
    pub theme: Option<u8>,
    pub permalink: Option<Permalink>,
    /// An empty search was submitted.
    pub reshuffle: bool,
}

impl PageState {
    pub fn fresh(seed: Seed) -> Self {
        Self {
            seed,
            distances: BTreeMap::new(),
            search: Vec::new(),
            card_filter: Vec::new(),
            filtered: 0,
            page: 0,
            theme: None,
            permalink: None,
            reshuffle: false,
        }
    }

    pub fn distance(&self, ctype: &str) -> Option<usize> {
        self.distances.get(ctype).copied()
    }

    /// Number of pages already shown. A token that carries distances but no
    /// page counter still implies one page.
    pub fn prior_pages(&self) -> usize {
        if self.page == 0 && !self.distances.is_empty() {
            1
        } else {
            self.page
        }
    }

    /// True when a card filter is active and `ctype` is not part of it.
    pub fn excludes(&self, ctype: &str) -> bool {
        !self.card_filter.is_empty() && !self.card_filter.iter().any(|c| c == ctype)
    }

    pub fn is_filtering(&self) -> bool {
        !self.search.is_empty() || !self.card_filter.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub state: PageState,
    /// Pieces that matched no field.
    pub leftover: Vec<String>,
}

/// Truncates a raw token to at most `max_bytes`, on a character boundary.
pub fn truncate_token(raw: &str, max_bytes: usize) -> &str {
    if raw.len() <= max_bytes {
        return raw;
    }
    let mut end = max_bytes;
    while end > 0 && !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

enum Piece {
    Seed(Seed),
    Distance(String, usize),
    Search(String),
    Filter(String),
    Filtered(String),
    Page(String),
    Theme(String),
    Permalink(Permalink),
    Leftover,
}

#[derive(Default)]
struct RawFields {
    seed: Option<Seed>,
    distances: BTreeMap<String, usize>,
    search: Option<String>,
    filter: Option<String>,
    filtered: Option<String>,
    page: Option<String>,
    theme: Option<String>,
    permalink: Option<Permalink>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, piece: &str) {
    if slot.is_none() {
        *slot = Some(value);
    } else {
        engine_debug!("ignoring duplicate token piece {piece:?}");
    }
}

pub struct TokenCodec<'a> {
    config: &'a FeedConfig,
}

impl<'a> TokenCodec<'a> {
    pub fn new(config: &'a FeedConfig) -> Self {
        Self { config }
    }

    /// Decodes `token`; `rng` supplies the seed when the token has none.
    pub fn decode<R: Rng + ?Sized>(&self, token: &str, rng: &mut R) -> Decoded {
        let mut raw = RawFields::default();
        let mut leftover = Vec::new();

        for piece in token.split(':').filter(|p| !p.is_empty()) {
            match self.classify(piece) {
                Piece::Seed(seed) => set_once(&mut raw.seed, seed, piece),
                Piece::Distance(ctype, distance) => {
                    if raw.distances.contains_key(&ctype) {
                        engine_debug!("ignoring duplicate token piece {piece:?}");
                    } else {
                        raw.distances.insert(ctype, distance);
                    }
                }
                Piece::Search(v) => set_once(&mut raw.search, v, piece),
                Piece::Filter(v) => set_once(&mut raw.filter, v, piece),
                Piece::Filtered(v) => set_once(&mut raw.filtered, v, piece),
                Piece::Page(v) => set_once(&mut raw.page, v, piece),
                Piece::Theme(v) => set_once(&mut raw.theme, v, piece),
                Piece::Permalink(p) => set_once(&mut raw.permalink, p, piece),
                Piece::Leftover => leftover.push(piece.to_string()),
            }
        }
        if !leftover.is_empty() {
            engine_debug!("token leftover pieces: {leftover:?}");
        }

        let seed = raw.seed.unwrap_or_else(|| Seed::fresh(rng));
        let mut state = PageState::fresh(seed);
        state.distances = raw.distances;
        state.permalink = raw.permalink;

        if let Some(search) = raw.search {
            if search.trim().is_empty() {
                state.reshuffle = true;
            } else {
                let (terms, filters) = self.split_search_terms(&search);
                state.search = terms;
                state.card_filter = filters;
            }
        }
        if state.card_filter.is_empty() {
            if let Some(filter) = raw.filter {
                state.card_filter = self.filter_types(filter.split_whitespace());
            }
        }
        if state.is_filtering() {
            state.filtered = raw.filtered.as_deref().map(parse_count).unwrap_or(0);
        }
        state.page = raw.page.as_deref().map(parse_count).unwrap_or(0);
        state.theme = raw
            .theme
            .and_then(|t| t.chars().next())
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8);

        Decoded { state, leftover }
    }

    /// Encodes the fields that are set, in fixed order.
    pub fn encode(&self, state: &PageState) -> String {
        let mut parts = vec![state.seed.to_token()];

        let mut distances: Vec<(char, usize)> = state
            .distances
            .iter()
            .filter_map(|(name, d)| self.config.card_type(name).map(|t| (t.prefix(), *d)))
            .collect();
        distances.sort_unstable();
        parts.extend(distances.into_iter().map(|(p, d)| format!("{p}{d}")));

        if !state.search.is_empty() {
            parts.push(format!(
                "{SEARCH_PREFIX}{}",
                urlencoding::encode(&state.search.join(" "))
            ));
        }
        if !state.card_filter.is_empty() {
            parts.push(format!(
                "{FILTER_PREFIX}{}",
                urlencoding::encode(&state.card_filter.join(" "))
            ));
        }
        if state.is_filtering() {
            parts.push(format!("{FILTERED_PREFIX}{}", state.filtered));
        }
        if state.page > 0 {
            parts.push(format!("{PAGE_PREFIX}{}", state.page));
        }
        if let Some(theme) = state.theme {
            parts.push(format!("{THEME_PREFIX}{theme}"));
        }
        parts.join(":")
    }

    fn classify(&self, piece: &str) -> Piece {
        if let Some(seed) = Seed::parse_piece(piece) {
            return Piece::Seed(seed);
        }

        let mut chars = piece.chars();
        let Some(first) = chars.next() else {
            return Piece::Leftover;
        };

        if first == 'x' {
            let Some(second) = chars.next() else {
                return Piece::Leftover;
            };
            let payload = unescape(chars.as_str());
            let key = format!("x{second}");
            return match key.as_str() {
                SEARCH_PREFIX => Piece::Search(payload),
                FILTER_PREFIX => Piece::Filter(payload),
                FILTERED_PREFIX => Piece::Filtered(payload),
                PAGE_PREFIX => Piece::Page(payload),
                THEME_PREFIX => Piece::Theme(payload),
                _ => self.permalink(second, payload),
            };
        }

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Piece::Leftover;
        }
        match (self.config.type_for_prefix(first), digits.parse::<usize>()) {
            (Some(ty), Ok(distance)) => Piece::Distance(ty.name.clone(), distance),
            _ => Piece::Leftover,
        }
    }

    fn permalink(&self, prefix: char, id: String) -> Piece {
        let ty = self
            .config
            .type_for_prefix(prefix)
            .filter(|t| self.config.permalink_types.contains(&t.name));
        match ty {
            Some(ty) if !id.is_empty() => Piece::Permalink(Permalink {
                ctype: ty.name.clone(),
                id,
            }),
            _ => Piece::Leftover,
        }
    }

    /// Splits search text into plain terms and `#name` card-type filters.
    fn split_search_terms(&self, search: &str) -> (Vec<String>, Vec<String>) {
        let mut terms = Vec::new();
        let mut filters = Vec::new();
        for term in search
            .split_whitespace()
            .take(self.config.max_query_terms)
        {
            let matched = term
                .strip_prefix('#')
                .and_then(|name| self.filter_types(std::iter::once(name)).pop());
            match matched {
                Some(ctype) if !filters.contains(&ctype) => filters.push(ctype),
                Some(_) => {}
                None => terms.push(term.to_string()),
            }
        }
        (terms, filters)
    }

    fn filter_types<'n>(&self, names: impl Iterator<Item = &'n str>) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for name in names.map(|n| n.trim_start_matches('#')) {
            if let Some(ty) = self.config.card_types.iter().find(|t| t.matches_filter(name)) {
                if !types.contains(&ty.name) {
                    types.push(ty.name.clone());
                }
            }
        }
        types
    }
}

fn unescape(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| spaced.clone())
}

/// Leading digits as a count; anything else is zero.
fn parse_count(raw: &str) -> usize {
    let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{parse_count, truncate_token, unescape};

    #[test]
    fn parse_count_reads_leading_digits() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count("3abc"), 3);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn unescape_handles_plus_and_percent() {
        assert_eq!(unescape("hello+world"), "hello world");
        assert_eq!(unescape("a%3Ab%2Bc"), "a:b+c");
        assert_eq!(unescape("%FF"), "%FF");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_token("abcdef", 4), "abcd");
        assert_eq!(truncate_token("abc", 10), "abc");
        assert_eq!(truncate_token("aé", 2), "a");
    }
}
