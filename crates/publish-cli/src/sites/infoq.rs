use cdp_driver::{KeyPress, Locator, LoginProbe, SelectorChain};
use publish_core::Platform;

use crate::browser_flow::{SiteAction, SiteProfile};

pub const EDITOR_URL: &str = "https://xie.infoq.cn/draft/write";

pub fn profile(editor_url: Option<&str>) -> SiteProfile {
    SiteProfile {
        platform: Platform::Infoq,
        name: "InfoQ",
        editor_url: editor_url.unwrap_or(EDITOR_URL).to_string(),
        login: LoginProbe::new(&["passport.infoq.cn", "/login", "/signin"], vec![]),
        title: SelectorChain::css(
            "title",
            &[
                "textarea.draft-title",
                "input.draft-title",
                "textarea[placeholder*='标题']",
                "input[placeholder*='标题']",
                ".article-title textarea",
                ".article-title input",
            ],
        ),
        body: SelectorChain::css(
            "body",
            &[
                ".ProseMirror[contenteditable='true']",
                ".editor-content [contenteditable='true']",
                ".CodeMirror",
                ".cm-content",
                "textarea.markdown-editor",
                "[contenteditable='true']",
            ],
        ),
        tags: Some(SelectorChain::css(
            "tags",
            &[
                "input[placeholder*='标签']",
                ".tag-input input",
                ".tags-select input",
            ],
        )),
        private_toggle: None,
        draft: SiteAction {
            button: Some(SelectorChain::new(
                "draft button",
                vec![
                    Locator::css("button.save-draft"),
                    Locator::text("button", "保存草稿"),
                    Locator::text("button", "存草稿"),
                ],
            )),
            confirm: None,
            // The editor autosaves; the shortcut forces a save.
            shortcut: Some(KeyPress::shortcut('s')),
        },
        submit: SiteAction {
            button: Some(SelectorChain::new(
                "submit button",
                vec![
                    Locator::css("button.publish-btn"),
                    Locator::text("button", "提交审核"),
                    Locator::text("button", "发布"),
                ],
            )),
            confirm: Some(SelectorChain::new(
                "confirm button",
                vec![
                    Locator::text(".modal button, .dialog button", "确定"),
                    Locator::text(".modal button, .dialog button", "确认发布"),
                ],
            )),
            shortcut: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_url_override() {
        assert_eq!(profile(None).editor_url, EDITOR_URL);
        assert_eq!(
            profile(Some("https://xie.infoq.cn/edit/1")).editor_url,
            "https://xie.infoq.cn/edit/1"
        );
    }

    #[test]
    fn every_chain_has_fallbacks() {
        let p = profile(None);
        assert!(p.title.candidates.len() > 1);
        assert!(p.body.candidates.len() > 1);
        assert!(p.draft.button.is_some() && p.draft.shortcut.is_some());
        assert!(p.submit.button.is_some());
    }
}
