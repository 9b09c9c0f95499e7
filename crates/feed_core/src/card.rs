use serde::Serialize;

/// Structural cards that frame a page but carry no content of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    Welcome,
    /// Hidden marker near the end of a page that triggers the next load.
    Scrollstone,
    /// Last card of a page that still has content after it; holds the next token.
    Tombstone,
    /// Last card when there is nothing more to load.
    Bottom,
    /// Closes a permalink page.
    Footer,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CardBody {
    pub title: String,
    pub topics: Vec<String>,
    pub body: String,
    /// Path of the backing file relative to the data root.
    pub file: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardKind {
    Content(String),
    Heading(Heading),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub kind: CardKind,
    /// Ordinal into the type's shuffle ordering, or a direct inventory index
    /// for types that are not randomized and for search or permalink cards.
    pub num: usize,
    /// Only present for cards rendered by this response.
    pub body: Option<CardBody>,
    pub permalink: bool,
    pub search_result: bool,
    /// Drawn from the type's hidden pool.
    pub hidden: bool,
}

impl Card {
    pub fn placeholder(ctype: impl Into<String>, num: usize) -> Self {
        Self {
            kind: CardKind::Content(ctype.into()),
            num,
            body: None,
            permalink: false,
            search_result: false,
            hidden: false,
        }
    }

    pub fn heading(heading: Heading) -> Self {
        Self {
            kind: CardKind::Heading(heading),
            num: 0,
            body: None,
            permalink: false,
            search_result: false,
            hidden: false,
        }
    }

    pub fn with_body(mut self, body: CardBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn ctype(&self) -> Option<&str> {
        match &self.kind {
            CardKind::Content(name) => Some(name),
            CardKind::Heading(_) => None,
        }
    }

    pub fn heading_kind(&self) -> Option<Heading> {
        match self.kind {
            CardKind::Heading(h) => Some(h),
            CardKind::Content(_) => None,
        }
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.ctype() == Some(name)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, CardKind::Heading(_))
    }
}
