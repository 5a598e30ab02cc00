//! Deferred DOM queries.
//!
//! A [`Locator`] is only a description; it is resolved against the live DOM
//! every time it is probed, so it keeps working across re-renders and
//! unmounts. The string syntax follows the familiar browser-automation forms:
//!
//! | Expression                 | Meaning                                         |
//! |----------------------------|-------------------------------------------------|
//! | `text=点击开启`             | innermost elements containing the text (any case)|
//! | `text="点击开启"`           | innermost elements whose text is exactly that    |
//! | `button:has-text("HNU")`   | CSS matches whose text contains `HNU`            |
//! | `[data-testid=seal]`       | any other input is a plain CSS selector          |

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AppError;

const TEXT_PREFIX: &str = "text=";
const HAS_TEXT: &str = ":has-text(";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    Css { selector: String },
    Text { text: String, exact: bool },
    HasText { selector: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            exact: false,
        }
    }

    pub fn has_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::HasText {
            selector: selector.into(),
            text: text.into(),
        }
    }
}

/// Strips one pair of matching `"` or `'` quotes, if present.
fn unquote(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return Some(&raw[1..raw.len() - 1]);
        }
    }
    None
}

impl FromStr for Locator {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let expr = raw.trim();
        if expr.is_empty() {
            return Err(AppError::InvalidLocator("empty expression".into()));
        }

        if let Some(rest) = expr.strip_prefix(TEXT_PREFIX) {
            let (text, exact) = match unquote(rest) {
                Some(inner) => (inner, true),
                None => (rest, false),
            };
            if text.trim().is_empty() {
                return Err(AppError::InvalidLocator(format!("'{raw}' has no text")));
            }
            return Ok(Locator::Text {
                text: text.to_string(),
                exact,
            });
        }

        if let Some(idx) = expr.rfind(HAS_TEXT) {
            let arg = expr[idx + HAS_TEXT.len()..]
                .strip_suffix(')')
                .ok_or_else(|| AppError::InvalidLocator(format!("'{raw}' is missing ')'")))?;
            let text = unquote(arg.trim()).unwrap_or(arg.trim());
            if text.is_empty() {
                return Err(AppError::InvalidLocator(format!("'{raw}' has no text")));
            }
            let selector = expr[..idx].trim();
            return Ok(Locator::HasText {
                selector: if selector.is_empty() { "*" } else { selector }.to_string(),
                text: text.to_string(),
            });
        }

        Ok(Locator::css(expr))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => f.write_str(selector),
            Locator::Text { text, exact: true } => write!(f, "{TEXT_PREFIX}\"{text}\""),
            Locator::Text { text, exact: false } => write!(f, "{TEXT_PREFIX}{text}"),
            Locator::HasText { selector, text } => write!(f, "{selector}{HAS_TEXT}\"{text}\")"),
        }
    }
}
