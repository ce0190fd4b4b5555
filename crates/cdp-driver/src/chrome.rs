use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::{CdpError, Result};

// ─── Discovery ────────────────────────────────────────────────────────────

/// Binary names looked up on `PATH` after the well-known install locations.
pub const BINARY_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Install locations checked for the current OS, most common first.
pub fn well_known_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ));
        paths.push(PathBuf::from(
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ));
        paths.push(PathBuf::from(
            "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
        ));
    }

    #[cfg(target_os = "windows")]
    {
        for var in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Some(base) = std::env::var_os(var) {
                paths.push(
                    PathBuf::from(base)
                        .join("Google")
                        .join("Chrome")
                        .join("Application")
                        .join("chrome.exe"),
                );
            }
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        for p in [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ] {
            paths.push(PathBuf::from(p));
        }
    }

    paths
}

/// Locate a Chrome executable.
///
/// Order: the `env_var` override, then [`well_known_paths`], then
/// [`BINARY_NAMES`] on `PATH`. An override that points at a missing file is
/// an error rather than a silent fallback.
pub fn find_chrome(env_var: &str) -> Result<PathBuf> {
    find_chrome_in(env_var, std::env::var_os(env_var), &well_known_paths())
}

fn find_chrome_in(
    env_var: &str,
    override_value: Option<OsString>,
    known: &[PathBuf],
) -> Result<PathBuf> {
    if let Some(value) = override_value.filter(|v| !v.is_empty()) {
        let path = PathBuf::from(value);
        if path.exists() {
            tracing::debug!(path = %path.display(), "using Chrome from {env_var}");
            return Ok(path);
        }
        return Err(CdpError::BadChromeOverride {
            env_var: env_var.to_string(),
            path: path.display().to_string(),
        });
    }

    if let Some(found) = known.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    for name in BINARY_NAMES {
        if let Ok(found) = which::which(name) {
            return Ok(found);
        }
    }

    let mut searched: Vec<String> = vec![format!("${env_var} (unset)")];
    searched.extend(known.iter().map(|p| p.display().to_string()));
    searched.push(format!("PATH: {}", BINARY_NAMES.join(", ")));
    Err(CdpError::ChromeNotFound {
        env_var: env_var.to_string(),
        searched,
    })
}

// ─── Launch ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub executable: PathBuf,
    pub user_data_dir: PathBuf,
    pub port: u16,
    pub headless: bool,
    pub start_url: Option<String>,
    pub extra_args: Vec<String>,
}

/// Command-line arguments for a dedicated-profile Chrome with remote debugging.
pub fn launch_args(opts: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", opts.port),
        format!("--user-data-dir={}", opts.user_data_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
    ];
    if opts.headless {
        args.push("--headless=new".to_string());
    }
    args.extend(opts.extra_args.iter().cloned());
    args.push(
        opts.start_url
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()),
    );
    args
}

/// A Chrome process started by this crate.
///
/// Stderr is drained in a background task so launch failures can report
/// what Chrome printed. Dropping the handle leaves the browser running; the
/// profile session is meant to outlive a single publish.
pub struct ChromeProcess {
    child: Child,
    stderr_buf: Arc<Mutex<String>>,
    port: u16,
}

impl ChromeProcess {
    pub fn launch(opts: &LaunchOptions) -> Result<Self> {
        tracing::info!(
            executable = %opts.executable.display(),
            profile = %opts.user_data_dir.display(),
            port = opts.port,
            "launching Chrome"
        );
        let mut cmd = Command::new(&opts.executable);
        cmd.args(launch_args(opts))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| CdpError::Launch(format!("{}: {e}", opts.executable.display())))?;

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            });
        }

        Ok(Self {
            child,
            stderr_buf,
            port: opts.port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stderr(&self) -> String {
        self.stderr_buf
            .lock()
            .ok()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Fail if Chrome already exited, e.g. because another instance owns the profile.
    pub fn ensure_running(&mut self) -> Result<()> {
        match self.child.try_wait()? {
            None => Ok(()),
            Some(status) => {
                let stderr = self.stderr();
                let mut msg = format!("Chrome exited early ({status})");
                if !stderr.is_empty() {
                    msg.push_str("\nstderr: ");
                    msg.push_str(&stderr);
                }
                Err(CdpError::Launch(msg))
            }
        }
    }

    /// Kill the browser (best-effort).
    pub async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Whether `path` looks like a Chrome binary we can run. Used by diagnostics.
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts() -> LaunchOptions {
        LaunchOptions {
            executable: PathBuf::from("/usr/bin/chromium"),
            user_data_dir: PathBuf::from("/tmp/profile"),
            port: 9333,
            headless: false,
            start_url: Some("https://example.com/edit".into()),
            extra_args: vec![],
        }
    }

    #[test]
    fn launch_args_carry_profile_and_port() {
        let args = launch_args(&opts());
        assert_eq!(args[0], "--remote-debugging-port=9333");
        assert_eq!(args[1], "--user-data-dir=/tmp/profile");
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert_eq!(args.last().unwrap(), "https://example.com/edit");
    }

    #[test]
    fn headless_and_blank_start() {
        let mut o = opts();
        o.headless = true;
        o.start_url = None;
        let args = launch_args(&o);
        assert!(args.contains(&"--headless=new".to_string()));
        assert_eq!(args.last().unwrap(), "about:blank");
    }

    #[test]
    fn override_wins_when_present() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("chrome");
        std::fs::write(&fake, "").unwrap();
        let found = find_chrome_in("X_CHROME", Some(fake.clone().into_os_string()), &[]).unwrap();
        assert_eq!(found, fake);
    }

    #[test]
    fn missing_override_is_an_error() {
        let err = find_chrome_in("X_CHROME", Some("/no/such/chrome".into()), &[]).unwrap_err();
        assert!(matches!(err, CdpError::BadChromeOverride { .. }));
        assert!(err.to_string().contains("X_CHROME"));
    }

    #[test]
    fn known_paths_are_checked_in_order() {
        let dir = TempDir::new().unwrap();
        let second = dir.path().join("second");
        std::fs::write(&second, "").unwrap();
        let known = vec![dir.path().join("first"), second.clone()];
        assert_eq!(find_chrome_in("X_CHROME", None, &known).unwrap(), second);
    }

    #[test]
    fn not_found_lists_search_locations() {
        let err = CdpError::ChromeNotFound {
            env_var: "X_CHROME".into(),
            searched: vec!["/a".into(), "/b".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a\n  /b"));
        assert!(msg.contains("set X_CHROME"));
    }
}
