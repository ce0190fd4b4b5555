//! Builders for the JavaScript expressions evaluated in the page.
//!
//! Every piece of caller-supplied text goes through [`js_string`]; nothing
//! is ever spliced into a script unescaped. Builders take a *find
//! expression*, a JS expression that evaluates to an element or `null`
//! (see [`crate::Locator::find_expr`]).

use serde_json::Value;

/// Encode `s` as a JavaScript string literal.
///
/// JSON string escaping, plus `</` so the literal can never close a
/// surrounding `<script>`, plus U+2028/U+2029 which older engines treat as
/// line terminators inside literals.
pub fn js_string(s: &str) -> String {
    Value::String(s.to_owned())
        .to_string()
        .replace("</", "<\\/")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Evaluates to `true` when the element exists and takes up layout space.
pub fn is_visible(find: &str) -> String {
    format!(
        "((el) => !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length))({find})"
    )
}

/// Element kinds reported by [`set_value`].
pub mod kind {
    pub const INPUT: &str = "input";
    pub const CODEMIRROR: &str = "codemirror";
    /// Focused and selected; the caller types the text with `Input.insertText`.
    pub const EDITABLE: &str = "editable";
    pub const MISSING: &str = "missing";
    pub const UNSUPPORTED: &str = "unsupported";
}

/// Set the value of a form field and report what kind of element it was.
///
/// Inputs and textareas go through the prototype's native `value` setter
/// followed by `input` and `change` events, which framework-controlled
/// fields (React, Vue) observe. CodeMirror 5 instances are set through
/// their API. Content-editable surfaces (including CodeMirror 6 and
/// ProseMirror) are only focused and selected, returning [`kind::EDITABLE`].
pub fn set_value(find: &str, value: &str) -> String {
    let v = js_string(value);
    format!(
        r#"((el, value) => {{
  if (!el) return "{missing}";
  const cm5 = el.closest && el.closest(".CodeMirror");
  if (cm5 && cm5.CodeMirror) {{
    cm5.CodeMirror.setValue(value);
    cm5.CodeMirror.save && cm5.CodeMirror.save();
    return "{codemirror}";
  }}
  const tag = el.tagName;
  if (tag === "INPUT" || tag === "TEXTAREA") {{
    const proto = tag === "INPUT" ? HTMLInputElement.prototype : HTMLTextAreaElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, "value").set;
    el.focus();
    setter.call(el, value);
    el.dispatchEvent(new Event("input", {{ bubbles: true }}));
    el.dispatchEvent(new Event("change", {{ bubbles: true }}));
    return "{input}";
  }}
  const editable = el.isContentEditable ? el : el.querySelector && el.querySelector("[contenteditable=true], [contenteditable=''], .cm-content");
  if (editable) {{
    editable.focus();
    const range = document.createRange();
    range.selectNodeContents(editable);
    const sel = window.getSelection();
    sel.removeAllRanges();
    sel.addRange(range);
    return "{editable}";
  }}
  return "{unsupported}";
}})({find}, {v})"#,
        missing = kind::MISSING,
        codemirror = kind::CODEMIRROR,
        input = kind::INPUT,
        editable = kind::EDITABLE,
        unsupported = kind::UNSUPPORTED,
    )
}

/// Scroll the element into view and click it. Evaluates to `false` when missing.
pub fn click(find: &str) -> String {
    format!(
        "((el) => {{ if (!el) return false; el.scrollIntoView({{ block: \"center\" }}); el.click(); return true; }})({find})"
    )
}

/// Focus the element without touching its contents (tag inputs).
pub fn focus(find: &str) -> String {
    format!("((el) => {{ if (!el) return false; el.focus(); return true; }})({find})")
}

/// Whether a checkbox-like toggle is currently on.
pub fn is_checked(find: &str) -> String {
    format!(
        r#"((el) => !!el && (el.checked === true || el.getAttribute("aria-checked") === "true" || el.getAttribute("aria-pressed") === "true"))({find})"#
    )
}
