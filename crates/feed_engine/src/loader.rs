use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use feed_core::{BodyKind, Card, CardBody, CardTypeConfig, Deck, Seed, Slot};
use rand::Rng;
use thiserror::Error;

use crate::inventory::{timestamp_name, Inventory};

/// Timestamps at or below this are ids, not dates.
const EARLIEST_TIMESTAMP: i64 = 1_141_161_200;
const DATE_FORMAT: &str = "%B %-d, %Y";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{ctype}: no card {wanted:?} among {available} file(s)")]
    Exhausted {
        ctype: String,
        wanted: String,
        available: usize,
    },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{ctype}: card directory {path} is missing")]
    MissingDirectory { ctype: String, path: String },
}

/// Resolves ordinals and names to inventory files and reads their bodies.
pub struct CardLoader<'a> {
    root: &'a Path,
    inventory: &'a dyn Inventory,
    deck: &'a Deck,
    seed: Seed,
}

impl<'a> CardLoader<'a> {
    pub fn new(root: &'a Path, inventory: &'a dyn Inventory, deck: &'a Deck, seed: Seed) -> Self {
        Self {
            root,
            inventory,
            deck,
            seed,
        }
    }

    /// Loads the card at `ordinal` of `ctype`. Randomized types go through
    /// their shuffle ordering; others index the newest-first listing directly.
    pub fn load(&self, ctype: &CardTypeConfig, ordinal: usize) -> Result<Card, LoadError> {
        let slot = self
            .deck
            .get(&ctype.name)
            .filter(|e| e.descriptor.randomize)
            .and_then(|e| e.ordering.slot(ordinal));

        let (hidden, index) = match slot {
            Some(Slot::Item(index)) => (false, index),
            Some(Slot::Hidden) => (true, self.hidden_index(ctype, ordinal)?),
            None => (false, ordinal),
        };
        let listing = self.inventory.list(ctype, hidden);
        let Some(file) = listing.get(index) else {
            return Err(self.missing(ctype, index.to_string(), listing.len()));
        };

        let body = self.read_body(ctype, file, hidden)?;
        let mut card = Card::placeholder(&ctype.name, ordinal).with_body(body);
        card.hidden = hidden;
        Ok(card)
    }

    /// Loads a card by file name, falling back to reading `name` as an index.
    pub fn load_named(&self, ctype: &CardTypeConfig, name: &str) -> Result<Card, LoadError> {
        let listing = self.inventory.list(ctype, false);
        let index = listing
            .iter()
            .position(|f| f == name)
            .or_else(|| name.parse::<usize>().ok().filter(|i| *i < listing.len()));
        let Some(index) = index else {
            return Err(self.missing(ctype, name.to_string(), listing.len()));
        };
        let body = self.read_body(ctype, &listing[index], false)?;
        Ok(Card::placeholder(&ctype.name, index).with_body(body))
    }

    fn hidden_index(&self, ctype: &CardTypeConfig, ordinal: usize) -> Result<usize, LoadError> {
        let pool = self.inventory.list(ctype, true).len();
        if pool == 0 {
            return Err(self.missing(ctype, "hidden".to_string(), 0));
        }
        let mut rng = self.seed.rng_for(&format!("{}/hidden/{ordinal}", ctype.name));
        Ok(rng.gen_range(0..pool))
    }

    fn missing(&self, ctype: &CardTypeConfig, wanted: String, available: usize) -> LoadError {
        let dir = self.root.join(ctype.directory());
        if available == 0 && !dir.is_dir() {
            return LoadError::MissingDirectory {
                ctype: ctype.name.clone(),
                path: dir.display().to_string(),
            };
        }
        LoadError::Exhausted {
            ctype: ctype.name.clone(),
            wanted,
            available,
        }
    }

    fn read_body(&self, ctype: &CardTypeConfig, file: &str, hidden: bool) -> Result<CardBody, LoadError> {
        let relative = if hidden {
            format!("{}/hidden/{file}", ctype.directory())
        } else {
            format!("{}/{file}", ctype.directory())
        };
        let path = self.root.join(&relative);
        let io_err = |source| LoadError::Io {
            path: path.display().to_string(),
            source,
        };

        let modified = fs::metadata(&path).and_then(|m| m.modified()).map_err(io_err)?;
        let mut body = match ctype.body {
            BodyKind::Text => parse_text(&fs::read_to_string(&path).map_err(io_err)?),
            BodyKind::Simple => CardBody {
                body: fs::read_to_string(&path).map_err(io_err)?,
                ..CardBody::default()
            },
            BodyKind::Image => media_body(&relative, "Images", relative.clone()),
            BodyKind::Song if file.ends_with(".mp3") => media_body(&relative, "Songs", relative.clone()),
            BodyKind::Song => media_body(&relative, "Song Playlist", fs::read_to_string(&path).map_err(io_err)?),
        };
        body.file = relative;
        body.date = card_date(file, modified);
        Ok(body)
    }
}

/// Title line, topics line (comma separated), then the body.
fn parse_text(content: &str) -> CardBody {
    let mut lines = content.splitn(3, '\n');
    let title = lines.next().unwrap_or_default().trim_end().to_string();
    let topics = lines
        .next()
        .unwrap_or_default()
        .trim_end()
        .split(", ")
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    CardBody {
        title,
        topics,
        body: lines.next().unwrap_or_default().to_string(),
        ..CardBody::default()
    }
}

fn media_body(title: &str, topic: &str, body: String) -> CardBody {
    CardBody {
        title: title.to_string(),
        topics: vec![topic.to_string()],
        body,
        ..CardBody::default()
    }
}

fn card_date(file: &str, modified: SystemTime) -> Option<String> {
    let date = match timestamp_name(file) {
        Some(ts) if ts > EARLIEST_TIMESTAMP => DateTime::<Utc>::from_timestamp(ts, 0)?,
        Some(_) => return None,
        None => DateTime::<Utc>::from(modified),
    };
    Some(date.format(DATE_FORMAT).to_string())
}
