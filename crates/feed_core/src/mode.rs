use serde::Serialize;

use crate::token::PageState;

/// Which workflow renders a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    /// First page of a new feed.
    Fresh,
    /// A single card addressed by id.
    Permalink,
    /// An empty search: start over with a new seed.
    Reshuffle,
    Search,
    /// The next page of an existing feed.
    Continuation,
}

impl PageMode {
    pub fn classify(state: &PageState) -> Self {
        let searching = state.is_filtering() || state.filtered != 0;
        if state.permalink.is_none()
            && state.distances.is_empty()
            && !searching
            && state.page == 0
            && !state.reshuffle
        {
            PageMode::Fresh
        } else if state.permalink.is_some() {
            PageMode::Permalink
        } else if state.reshuffle && state.card_filter.is_empty() {
            PageMode::Reshuffle
        } else if searching {
            PageMode::Search
        } else {
            PageMode::Continuation
        }
    }
}
