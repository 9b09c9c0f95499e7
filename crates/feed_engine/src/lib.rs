//! Feed engine: content inventory, card loading and request orchestration.
mod auth;
mod feed;
mod inventory;
mod loader;
mod search;

pub use auth::{AuthDecision, AuthGate, OpenGate, RequestEnv};
pub use feed::{out_of_content, FeedEngine, RenderOutcome, RenderedPage};
pub use inventory::{DirInventory, Inventory, InventoryCache};
pub use loader::{CardLoader, LoadError};
pub use search::{ScanSearch, SearchError, SearchIndex, SearchRequest, SearchResults};
