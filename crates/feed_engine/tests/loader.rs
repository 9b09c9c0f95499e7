use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};

use feed_core::{BodyKind, CardTypeConfig, Deck, FeedConfig, Seed, Slot};
use feed_engine::{CardLoader, DirInventory, Inventory, InventoryCache, LoadError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn config() -> FeedConfig {
    FeedConfig::new(
        vec![
            CardTypeConfig::new("news", 2, 0),
            CardTypeConfig::new("images", 1, 0)
                .randomized()
                .with_body(BodyKind::Image),
            CardTypeConfig::new("songs", 1, 0).with_body(BodyKind::Song),
            CardTypeConfig::new("quotes", 1, 0).with_body(BodyKind::Simple),
            CardTypeConfig::new("features", 1, 0),
        ],
        "news",
    )
}

struct Fixture {
    temp: TempDir,
    config: FeedConfig,
    inventory: DirInventory,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "news/1500000000", "Newest\nrust, cards\nBody text\n");
        write(root, "news/1400000000", "Older\nrust\nOlder body\n");
        write(root, "images/a.png", "png");
        write(root, "images/b.png", "png");
        write(root, "images/hidden/secret.png", "png");
        write(root, "songs/track.mp3", "mp3");
        write(root, "songs/mix", "track.mp3\nother.mp3\n");
        write(root, "quotes/12", "Stay curious.\n");

        let inventory = DirInventory::new(root, Arc::new(InventoryCache::new()));
        Self {
            temp,
            config: config(),
            inventory,
        }
    }

    fn deck(&self, seed: &Seed) -> Deck {
        Deck::build(&self.config, seed, 0, |ty| self.inventory.size(ty))
    }

    fn ty(&self, name: &str) -> &CardTypeConfig {
        self.config.card_type(name).unwrap()
    }
}

#[test]
fn text_cards_carry_title_topics_and_date() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.5).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);

    let card = loader.load(fixture.ty("news"), 0).unwrap();
    let body = card.body.unwrap();
    assert_eq!(card.num, 0);
    assert_eq!(body.title, "Newest");
    assert_eq!(body.topics, vec!["rust", "cards"]);
    assert_eq!(body.body, "Body text\n");
    assert_eq!(body.file, "news/1500000000");
    assert_eq!(body.date.as_deref(), Some("July 14, 2017"));

    let older = loader.load(fixture.ty("news"), 1).unwrap();
    assert_eq!(older.body.unwrap().title, "Older");
}

#[test]
fn media_and_simple_cards_use_their_body_kind() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.5).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);

    let single = loader.load_named(fixture.ty("songs"), "track.mp3").unwrap();
    let single = single.body.unwrap();
    assert_eq!(single.topics, vec!["Songs"]);
    assert_eq!(single.body, "songs/track.mp3");

    let playlist = loader.load_named(fixture.ty("songs"), "mix").unwrap().body.unwrap();
    assert_eq!(playlist.topics, vec!["Song Playlist"]);
    assert_eq!(playlist.body, "track.mp3\nother.mp3\n");

    let quote = loader.load(fixture.ty("quotes"), 0).unwrap().body.unwrap();
    assert_eq!(quote.body, "Stay curious.\n");
    assert_eq!(quote.title, "");
    // Small numeric names are ids, not timestamps.
    assert_eq!(quote.date, None);
}

#[test]
fn randomized_cards_follow_the_ordering() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.25).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);
    let ordering = &deck.get("images").unwrap().ordering;
    assert!(!ordering.is_empty());

    for (ordinal, slot) in ordering.slots().iter().enumerate() {
        let card = loader.load(fixture.ty("images"), ordinal).unwrap();
        let body = card.body.clone().unwrap();
        assert_eq!(body.topics, vec!["Images"]);
        match slot {
            Slot::Item(index) => {
                assert!(!card.hidden);
                let listing = fixture.inventory.list(fixture.ty("images"), false);
                assert_eq!(body.file, format!("images/{}", listing[*index]));
            }
            Slot::Hidden => {
                assert!(card.hidden);
                assert_eq!(body.file, "images/hidden/secret.png");
            }
        }
        let again = loader.load(fixture.ty("images"), ordinal).unwrap();
        assert_eq!(again.body.unwrap().file, body.file);
    }
}

#[test]
fn running_out_of_files_is_exhaustion() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.5).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);

    let err = loader.load(fixture.ty("news"), 2).unwrap_err();
    assert!(
        matches!(err, LoadError::Exhausted { available: 2, .. }),
        "unexpected error: {err}"
    );
    assert!(matches!(
        loader.load_named(fixture.ty("news"), "1234"),
        Err(LoadError::Exhausted { .. })
    ));
}

#[test]
fn named_cards_resolve_by_file_or_index() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.5).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);

    let by_name = loader.load_named(fixture.ty("news"), "1400000000").unwrap();
    assert_eq!(by_name.num, 1);
    let by_index = loader.load_named(fixture.ty("news"), "1").unwrap();
    assert_eq!(by_index.body, by_name.body);
}

#[test]
fn missing_type_directory_is_reported() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.5).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);

    let err = loader.load(fixture.ty("features"), 0).unwrap_err();
    assert!(matches!(err, LoadError::MissingDirectory { .. }), "unexpected error: {err}");
}

#[test]
fn files_removed_after_listing_fail_with_io() {
    init_logging();
    let fixture = Fixture::new();
    let seed = Seed::new(0.5).unwrap();
    let deck = fixture.deck(&seed);
    let loader = CardLoader::new(fixture.temp.path(), &fixture.inventory, &deck, seed);

    fs::remove_file(fixture.temp.path().join("news/1500000000")).unwrap();
    let err = loader.load(fixture.ty("news"), 0).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "unexpected error: {err}");
}
