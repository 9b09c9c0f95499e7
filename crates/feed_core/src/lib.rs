//! Feed core: stateless pagination and card distribution, free of I/O.
mod card;
mod config;
mod deck;
mod distribute;
mod export;
mod mode;
mod page;
mod seed;
mod shuffle;
mod theme;
mod token;
mod view_model;

pub use card::{Card, CardBody, CardKind, Heading};
pub use config::{BodyKind, CardTypeConfig, ConfigError, DefaultTheme, FeedConfig};
pub use deck::{
    anti_repeat_window, reachable_pages, virtual_pages, CardTypeDescriptor, Deck, DeckEntry,
    InventorySize,
};
pub use distribute::{boundary_offset, distribute, PlacementReport};
pub use export::{last_distances, next_state};
pub use mode::PageMode;
pub use page::Page;
pub use seed::Seed;
pub use shuffle::{ShuffleOrdering, Slot};
pub use theme::{ResolvedTheme, ThemeSet};
pub use token::{truncate_token, Decoded, PageState, Permalink, TokenCodec};
pub use view_model::{CardView, PageView};
