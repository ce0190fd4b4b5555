use std::time::Duration;

use crate::page::Evaluator;
use crate::poll::poll_until;
use crate::script;
use crate::selector::Locator;
use crate::{CdpError, Result};

pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    LoggedIn,
    LoginRequired,
    /// Not on a login page, but no logged-in indicator is visible yet.
    Unknown,
}

/// Detects whether the session is logged in to a site.
///
/// The URL is the primary signal: any `login_url_markers` substring means a
/// login wall. `logged_in_indicators` (an avatar, a user menu) confirm the
/// session when present; with no indicators configured, not being on a
/// login page counts as logged in.
#[derive(Debug, Clone, Default)]
pub struct LoginProbe {
    pub login_url_markers: Vec<String>,
    pub logged_in_indicators: Vec<Locator>,
}

impl LoginProbe {
    pub fn new(markers: &[&str], indicators: Vec<Locator>) -> Self {
        Self {
            login_url_markers: markers.iter().map(|m| m.to_string()).collect(),
            logged_in_indicators: indicators,
        }
    }

    pub fn classify(&self, url: &str, indicator_present: bool) -> LoginState {
        let lower = url.to_ascii_lowercase();
        if self
            .login_url_markers
            .iter()
            .any(|m| lower.contains(&m.to_ascii_lowercase()))
        {
            LoginState::LoginRequired
        } else if indicator_present || self.logged_in_indicators.is_empty() {
            LoginState::LoggedIn
        } else {
            LoginState::Unknown
        }
    }

    pub async fn detect<E: Evaluator>(&self, page: &E) -> Result<LoginState> {
        let url = page.evaluate("window.location.href").await?;
        let url = url.as_str().unwrap_or_default();
        let mut present = false;
        for indicator in &self.logged_in_indicators {
            let v = page
                .evaluate(&script::is_visible(&indicator.find_expr()))
                .await?;
            if v.as_bool() == Some(true) {
                present = true;
                break;
            }
        }
        let state = self.classify(url, present);
        tracing::debug!(url, ?state, "login check");
        Ok(state)
    }

    /// Poll until the user has logged in through the visible window.
    pub async fn wait_for_login<E: Evaluator>(
        &self,
        page: &E,
        site: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<()> {
        tracing::warn!(
            "{site} requires login: please log in using the opened browser window (waiting up to {}s)",
            timeout.as_secs()
        );
        let waited = poll_until("login", timeout, interval, || async {
            Ok((self.detect(page).await? == LoginState::LoggedIn).then_some(()))
        })
        .await;
        match waited {
            Ok(()) => {
                tracing::info!("{site} login detected");
                Ok(())
            }
            Err(CdpError::Timeout { waited, .. }) => Err(CdpError::LoginTimeout { waited }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn site_login() -> LoginProbe {
        LoginProbe::new(&["/login", "signin"], vec![Locator::css(".avatar")])
    }

    #[test]
    fn login_url_wins() {
        let p = site_login();
        assert_eq!(
            p.classify("https://example.com/login?next=/write", true),
            LoginState::LoginRequired
        );
        assert_eq!(p.classify("https://example.com/SignIn", false), LoginState::LoginRequired);
    }

    #[test]
    fn indicator_confirms_session() {
        let p = site_login();
        assert_eq!(p.classify("https://example.com/write", true), LoginState::LoggedIn);
        assert_eq!(p.classify("https://example.com/write", false), LoginState::Unknown);
    }

    #[test]
    fn no_indicators_means_url_decides() {
        let p = LoginProbe::new(&["/login"], vec![]);
        assert_eq!(p.classify("https://example.com/write", false), LoginState::LoggedIn);
    }

    /// Sits on the login page for the first `login_polls` URL checks.
    struct LoginPage {
        login_polls: usize,
        url_checks: AtomicUsize,
    }

    impl Evaluator for LoginPage {
        async fn evaluate(&self, expr: &str) -> Result<Value> {
            if expr == "window.location.href" {
                let n = self.url_checks.fetch_add(1, Ordering::SeqCst);
                let url = if n < self.login_polls {
                    "https://example.com/login"
                } else {
                    "https://example.com/write"
                };
                return Ok(Value::from(url));
            }
            Ok(Value::Bool(true))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_logged_in() {
        let page = LoginPage {
            login_polls: 3,
            url_checks: AtomicUsize::new(0),
        };
        site_login()
            .wait_for_login(&page, "Example", LOGIN_TIMEOUT, LOGIN_POLL_INTERVAL)
            .await
            .unwrap();
        assert_eq!(page.url_checks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn login_timeout_is_distinct() {
        let page = LoginPage {
            login_polls: usize::MAX,
            url_checks: AtomicUsize::new(0),
        };
        let err = site_login()
            .wait_for_login(&page, "Example", Duration::from_secs(10), LOGIN_POLL_INTERVAL)
            .await
            .unwrap_err();
        assert!(matches!(err, CdpError::LoginTimeout { .. }));
        assert!(err.to_string().contains("log in"));
    }
}
