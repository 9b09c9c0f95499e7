use serde::Serialize;

use crate::card::{Card, Heading};
use crate::mode::PageMode;
use crate::page::Page;
use crate::theme::ResolvedTheme;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Heading>,
    pub num: usize,
    pub title: String,
    pub topics: Vec<String>,
    pub body: String,
    pub file: String,
    pub date: Option<String>,
    pub permalink: bool,
    pub search_result: bool,
    pub hidden: bool,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        let body = card.body.clone().unwrap_or_default();
        Self {
            ctype: card.ctype().map(str::to_string),
            heading: card.heading_kind(),
            num: card.num,
            title: body.title,
            topics: body.topics,
            body: body.body,
            file: body.file,
            date: body.date,
            permalink: card.permalink,
            search_result: card.search_result,
            hidden: card.hidden,
        }
    }
}

/// What a response renders: the fresh cards of a page plus the next token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub mode: PageMode,
    pub next_token: String,
    pub theme: Option<ResolvedTheme>,
    pub cards: Vec<CardView>,
}

impl PageView {
    pub fn new(mode: PageMode, page: &Page, next_token: String, theme: Option<ResolvedTheme>) -> Self {
        Self {
            mode,
            next_token,
            theme,
            cards: page.fresh_cards().iter().map(CardView::from).collect(),
        }
    }
}
