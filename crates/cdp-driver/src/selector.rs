use std::fmt;
use std::time::Duration;

use crate::page::Evaluator;
use crate::poll::poll_until;
use crate::script::{self, js_string};
use crate::{CdpError, Result};

/// How to find one element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// An element of `tag` (a CSS selector) whose trimmed text equals `text`,
    /// or failing that contains it.
    Text { tag: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// A JS expression evaluating to the element or `null`.
    pub fn find_expr(&self) -> String {
        match self {
            Locator::Css(sel) => format!("document.querySelector({})", js_string(sel)),
            Locator::Text { tag, text } => format!(
                "((tag, text) => {{ const els = Array.from(document.querySelectorAll(tag)); \
                 const t = (e) => (e.innerText || e.textContent || \"\").trim(); \
                 return els.find((e) => t(e) === text) || els.find((e) => t(e).includes(text)) || null; }})({}, {})",
                js_string(tag),
                js_string(text)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => f.write_str(sel),
            Locator::Text { tag, text } => write!(f, "{tag}:text(\"{text}\")"),
        }
    }
}

/// Ordered fallback selectors for one logical form field.
///
/// Site markup changes without notice, so each field lists several
/// candidates. The first candidate that resolves to a visible element wins.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    pub field: String,
    pub candidates: Vec<Locator>,
}

impl SelectorChain {
    pub fn new(field: impl Into<String>, candidates: Vec<Locator>) -> Self {
        Self {
            field: field.into(),
            candidates,
        }
    }

    /// Convenience constructor for a chain made only of CSS selectors.
    pub fn css(field: impl Into<String>, selectors: &[&str]) -> Self {
        Self::new(field, selectors.iter().map(|s| Locator::css(*s)).collect())
    }

    pub fn with(mut self, locator: Locator) -> Self {
        self.candidates.push(locator);
        self
    }

    /// The first visible candidate right now, if any.
    pub async fn find_now<E: Evaluator>(&self, page: &E) -> Result<Option<Locator>> {
        for candidate in &self.candidates {
            let visible = page.evaluate(&script::is_visible(&candidate.find_expr())).await?;
            if visible.as_bool() == Some(true) {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }

    /// Poll the candidates in order until one is visible.
    ///
    /// Fails with [`CdpError::SelectorNotFound`] listing every candidate
    /// once `timeout` has elapsed.
    pub async fn resolve<E: Evaluator>(
        &self,
        page: &E,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Locator> {
        match poll_until(&self.field, timeout, interval, || self.find_now(page)).await {
            Ok(found) => {
                tracing::debug!(field = %self.field, selector = %found, "resolved field");
                Ok(found)
            }
            Err(CdpError::Timeout { .. }) => Err(self.not_found()),
            Err(e) => Err(e),
        }
    }

    pub fn not_found(&self) -> CdpError {
        CdpError::SelectorNotFound {
            field: self.field.clone(),
            tried: self.candidates.iter().map(ToString::to_string).collect(),
        }
    }
}
