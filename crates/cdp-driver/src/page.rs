use std::future::Future;
use std::time::Duration;

use serde_json::{json, Value};

use crate::connection::CdpConnection;
use crate::poll::poll_until;
use crate::{CdpError, Result};

/// Anything that can evaluate a JS expression and return its JSON value.
///
/// [`Page`] is the real implementation; selector resolution and login
/// detection only need this, which keeps them testable without Chrome.
pub trait Evaluator {
    fn evaluate(&self, expr: &str) -> impl Future<Output = Result<Value>> + Send;
}

// ─── Keys ─────────────────────────────────────────────────────────────────

pub mod modifiers {
    pub const ALT: u32 = 1;
    pub const CTRL: u32 = 2;
    pub const META: u32 = 4;
    pub const SHIFT: u32 = 8;
}

/// A single key press for `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub modifiers: u32,
    pub text: Option<String>,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: "Enter".into(),
            code: "Enter".into(),
            key_code: 13,
            modifiers: 0,
            text: Some("\r".into()),
        }
    }

    /// `letter` with the platform's primary modifier (Cmd on macOS, Ctrl elsewhere).
    pub fn shortcut(letter: char) -> Self {
        Self::chord(letter, primary_modifier())
    }

    pub fn chord(letter: char, modifiers: u32) -> Self {
        let upper = letter.to_ascii_uppercase();
        Self {
            key: letter.to_ascii_lowercase().to_string(),
            code: format!("Key{upper}"),
            key_code: upper as u32,
            modifiers,
            text: None,
        }
    }

    /// The `keyDown`/`keyUp` parameter pair.
    pub fn events(&self) -> [Value; 2] {
        let down_type = if self.text.is_some() && self.modifiers == 0 {
            "keyDown"
        } else {
            "rawKeyDown"
        };
        let mut down = json!({
            "type": down_type,
            "key": self.key,
            "code": self.code,
            "windowsVirtualKeyCode": self.key_code,
            "nativeVirtualKeyCode": self.key_code,
            "modifiers": self.modifiers,
        });
        if let (Some(text), 0) = (&self.text, self.modifiers) {
            down["text"] = json!(text);
            down["unmodifiedText"] = json!(text);
        }
        let up = json!({
            "type": "keyUp",
            "key": self.key,
            "code": self.code,
            "windowsVirtualKeyCode": self.key_code,
            "nativeVirtualKeyCode": self.key_code,
            "modifiers": self.modifiers,
        });
        [down, up]
    }
}

pub fn primary_modifier() -> u32 {
    if cfg!(target_os = "macos") {
        modifiers::META
    } else {
        modifiers::CTRL
    }
}

// ─── Page ─────────────────────────────────────────────────────────────────

/// One browser tab driven over its own DevTools connection.
pub struct Page {
    conn: CdpConnection,
}

impl Page {
    pub fn new(conn: CdpConnection) -> Self {
        Self { conn }
    }

    pub async fn enable(&self) -> Result<()> {
        self.conn.call("Page.enable", json!({})).await?;
        self.conn.call("Runtime.enable", json!({})).await?;
        Ok(())
    }

    pub async fn bring_to_front(&self) -> Result<()> {
        self.conn.call("Page.bringToFront", json!({})).await?;
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        tracing::info!(url, "navigating");
        let resp = self.conn.call("Page.navigate", json!({ "url": url })).await?;
        if let Some(err) = resp.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::Protocol {
                method: "Page.navigate".into(),
                code: 0,
                message: format!("{err} ({url})"),
            });
        }
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        let v = self.evaluate("window.location.href").await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    pub async fn ready_state(&self) -> Result<String> {
        let v = self.evaluate("document.readyState").await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    /// Wait for `document.readyState == "complete"`.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        poll_until(
            "page to finish loading",
            timeout,
            Duration::from_millis(250),
            || async { Ok((self.ready_state().await? == "complete").then_some(())) },
        )
        .await
    }

    /// Type `text` into the focused element as if pasted by the user.
    pub async fn insert_text(&self, text: &str) -> Result<()> {
        self.conn
            .call("Input.insertText", json!({ "text": text }))
            .await?;
        Ok(())
    }

    pub async fn press_key(&self, key: &KeyPress) -> Result<()> {
        for params in key.events() {
            self.conn.call("Input.dispatchKeyEvent", params).await?;
        }
        Ok(())
    }
}

impl Evaluator for Page {
    async fn evaluate(&self, expr: &str) -> Result<Value> {
        let resp = self
            .conn
            .call(
                "Runtime.evaluate",
                json!({
                    "expression": expr,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        evaluation_value(resp)
    }
}

fn evaluation_value(mut resp: Value) -> Result<Value> {
    if let Some(details) = resp.get("exceptionDetails") {
        let message = details
            .pointer("/exception/description")
            .and_then(Value::as_str)
            .or_else(|| details.get("text").and_then(Value::as_str))
            .unwrap_or("unknown exception");
        return Err(CdpError::Evaluation(message.to_string()));
    }
    Ok(resp
        .pointer_mut("/result/value")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_sends_text_on_keydown() {
        let [down, up] = KeyPress::enter().events();
        assert_eq!(down["type"], "keyDown");
        assert_eq!(down["text"], "\r");
        assert_eq!(down["windowsVirtualKeyCode"], 13);
        assert_eq!(up["type"], "keyUp");
        assert!(up.get("text").is_none());
    }

    #[test]
    fn shortcut_uses_primary_modifier() {
        let k = KeyPress::shortcut('s');
        assert_eq!(k.key, "s");
        assert_eq!(k.code, "KeyS");
        assert_eq!(k.key_code, 83);
        assert_eq!(k.modifiers, primary_modifier());
        let [down, _] = k.events();
        assert_eq!(down["type"], "rawKeyDown");
        assert!(down.get("text").is_none());
    }

    #[test]
    fn chord_combines_modifiers() {
        let k = KeyPress::chord('P', modifiers::CTRL | modifiers::SHIFT);
        assert_eq!(k.modifiers, 10);
        assert_eq!(k.key, "p");
    }

    #[test]
    fn evaluation_value_extracts_result() {
        let v = evaluation_value(json!({"result": {"type": "string", "value": "complete"}})).unwrap();
        assert_eq!(v, "complete");
        let v = evaluation_value(json!({"result": {"type": "undefined"}})).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn evaluation_exception_is_error() {
        let err = evaluation_value(json!({
            "result": {"type": "object"},
            "exceptionDetails": {"text": "Uncaught", "exception": {"description": "ReferenceError: x is not defined"}}
        }))
        .unwrap_err();
        assert!(matches!(err, CdpError::Evaluation(ref m) if m.contains("ReferenceError")));
    }
}
