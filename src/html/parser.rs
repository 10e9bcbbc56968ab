//! Regex tokenizer and item-card state machine for saved listing pages.
//!
//! Only the handful of tags that make up an item card matter, so the page is
//! scanned as a flat stream of start tags, end tags and text runs:
//!
//! ```text
//! <a href="/items/..." class="... rounded ... bg-slate-900 ...">
//!   <div class="icon-container"><img src="....webp"></div>
//!   <span class="text-xl font-bold"><span>NAME</span></span>
//!   <span class="text-sm">CATEGORY</span>
//!   <span class="tag">Tier 3</span>
//! </a>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Comments, start/end tags (quoted attribute values may contain `>`).
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("Invalid tag regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+)))?"#)
        .expect("Invalid attribute regex")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z]+);").expect("Invalid entity regex")
});

static FIRST_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Invalid integer regex"));

/// One item card as it appears on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub href: String,
    pub name: String,
    pub category: String,
    pub tier: Option<i64>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'h> {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(&'h str),
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for cap in TAG.captures_iter(html) {
        let Some(whole) = cap.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Text(&html[last..whole.start()]));
        }
        last = whole.end();

        let Some(tag) = cap.get(2) else {
            continue; // comment
        };
        let name = tag.as_str().to_ascii_lowercase();
        if cap.get(1).is_some_and(|m| !m.as_str().is_empty()) {
            tokens.push(Token::End { name });
        } else {
            let attrs = cap.get(3).map(|m| parse_attributes(m.as_str())).unwrap_or_default();
            tokens.push(Token::Start { name, attrs });
        }
    }

    if last < html.len() {
        tokens.push(Token::Text(&html[last..]));
    }
    tokens
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|cap| {
            let key = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((key, value))
        })
        .collect()
}

/// Decode character references (`&amp;`, `&#233;`, `&#xE9;`, ...).
///
/// Unknown named references are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |cap: &regex::Captures<'_>| {
            let body = &cap[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map(String::from).unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}

fn attr<'t>(attrs: &'t [(String, String)], key: &str) -> Option<&'t str> {
    attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// The `class` attribute contains every needle (substring match).
fn has_class(attrs: &[(String, String)], needles: &[&str]) -> bool {
    let class = attr(attrs, "class").unwrap_or("");
    needles.iter().all(|n| class.contains(n))
}

/// Nesting counters for the card currently open.
#[derive(Debug, Default)]
struct CardState {
    card: Card,
    icon_container: usize,
    name_span: usize,
    inner_name: usize,
    category_span: usize,
    tier_span: usize,
}

/// Extract every complete item card (name and image both present).
pub fn parse_cards(html: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    let mut current: Option<CardState> = None;

    for token in tokenize(html) {
        match token {
            Token::Start { name, attrs } => {
                if name == "a" {
                    let href = attr(&attrs, "href").unwrap_or("");
                    if !href.is_empty()
                        && href.contains("/items/")
                        && has_class(&attrs, &["rounded", "bg-slate-900"])
                    {
                        current = Some(CardState {
                            card: Card {
                                href: href.to_string(),
                                ..Card::default()
                            },
                            ..CardState::default()
                        });
                    }
                    continue;
                }

                let Some(state) = current.as_mut() else { continue };
                match name.as_str() {
                    "div" if has_class(&attrs, &["icon-container"]) => state.icon_container += 1,
                    "img" if state.icon_container > 0 => {
                        let src = attr(&attrs, "src").unwrap_or("");
                        if state.card.image_url.is_empty() && src.to_lowercase().ends_with(".webp") {
                            state.card.image_url = src.to_string();
                        }
                    }
                    "span" => {
                        if has_class(&attrs, &["text-xl", "font-bold"]) {
                            state.name_span += 1;
                        } else if state.name_span > 0 {
                            state.inner_name += 1;
                        }
                        if has_class(&attrs, &["text-sm"]) {
                            state.category_span += 1;
                        }
                        if has_class(&attrs, &["tag"]) {
                            state.tier_span += 1;
                        }
                    }
                    _ => {}
                }
            }
            Token::End { name } => match name.as_str() {
                "a" => {
                    if let Some(state) = current.take() {
                        if !state.card.name.is_empty() && !state.card.image_url.is_empty() {
                            cards.push(state.card);
                        }
                    }
                }
                "div" => {
                    if let Some(state) = current.as_mut() {
                        state.icon_container = state.icon_container.saturating_sub(1);
                    }
                }
                "span" => {
                    if let Some(state) = current.as_mut() {
                        if state.inner_name > 0 {
                            state.inner_name -= 1;
                        } else if state.name_span > 0 {
                            state.name_span -= 1;
                        }
                        state.category_span = state.category_span.saturating_sub(1);
                        state.tier_span = state.tier_span.saturating_sub(1);
                    }
                }
                _ => {}
            },
            Token::Text(raw) => {
                let Some(state) = current.as_mut() else { continue };
                let text = decode_entities(raw);
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                let card = &mut state.card;
                if state.inner_name > 0 && card.name.is_empty() {
                    card.name = text.to_string();
                } else if state.category_span > 0 && card.category.is_empty() {
                    card.category = text.to_string();
                } else if state.tier_span > 0 && card.tier.is_none() {
                    card.tier = FIRST_INTEGER
                        .find(text)
                        .and_then(|m| m.as_str().parse().ok());
                }
            }
        }
    }

    cards
}
