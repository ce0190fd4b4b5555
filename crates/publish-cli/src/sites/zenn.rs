use cdp_driver::{KeyPress, Locator, LoginProbe, SelectorChain};
use publish_core::Platform;

use crate::browser_flow::{SiteAction, SiteProfile};

pub const EDITOR_URL: &str = "https://zenn.dev/articles/new";

pub fn profile() -> SiteProfile {
    SiteProfile {
        platform: Platform::Zenn,
        name: "Zenn",
        editor_url: EDITOR_URL.to_string(),
        login: LoginProbe::new(
            &["zenn.dev/enter", "/login", "accounts.google.com", "github.com/login"],
            vec![],
        ),
        title: SelectorChain::css(
            "title",
            &[
                "textarea[placeholder='Title']",
                "textarea[placeholder*='タイトル']",
                "input[placeholder*='タイトル']",
                "input[name='title']",
            ],
        ),
        body: SelectorChain::css(
            "body",
            &[
                ".cm-content[contenteditable='true']",
                ".CodeMirror",
                "textarea[placeholder*='本文']",
                "textarea[name='body']",
            ],
        ),
        tags: Some(SelectorChain::css(
            "topics",
            &[
                "input[placeholder*='トピック']",
                "input[placeholder*='topic']",
                "input[name='topics']",
            ],
        )),
        private_toggle: None,
        draft: SiteAction {
            button: Some(SelectorChain::new(
                "draft button",
                vec![
                    Locator::text("button", "下書き保存"),
                    Locator::text("button", "Save draft"),
                ],
            )),
            confirm: None,
            shortcut: Some(KeyPress::shortcut('s')),
        },
        submit: SiteAction {
            button: Some(SelectorChain::new(
                "publish button",
                vec![
                    Locator::text("button", "公開する"),
                    Locator::text("button", "Publish"),
                ],
            )),
            confirm: None,
            shortcut: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_driver::LoginState;

    #[test]
    fn zenn_login_page_is_detected() {
        let p = profile();
        assert_eq!(
            p.login.classify("https://zenn.dev/enter?next=/articles/new", false),
            LoginState::LoginRequired
        );
        assert_eq!(
            p.login.classify("https://zenn.dev/articles/new", false),
            LoginState::LoggedIn
        );
    }
}
