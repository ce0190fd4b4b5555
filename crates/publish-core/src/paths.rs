use crate::error::{PublishError, Result};
use crate::platform::Platform;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const WT_DIR: &str = ".claude/wt";
pub const CONFIG_FILE: &str = "config.jsonc";
pub const PROFILES_DIR: &str = "browser-profiles";
pub const PUBLISH_LOG_DIR: &str = "publish";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or(PublishError::HomeNotFound)
}

pub fn wt_dir(home: &Path) -> PathBuf {
    home.join(WT_DIR)
}

pub fn config_path(home: &Path) -> PathBuf {
    wt_dir(home).join(CONFIG_FILE)
}

/// Browser profile kept between runs so the site session survives.
pub fn default_profile_dir(home: &Path, platform: Platform) -> PathBuf {
    wt_dir(home).join(PROFILES_DIR).join(platform.as_str())
}

pub fn publish_log_dir(article_dir: &Path) -> PathBuf {
    article_dir.join(PUBLISH_LOG_DIR)
}

/// Expand a leading `~/` against `home`. Other paths are returned unchanged.
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_under_claude_wt() {
        let p = config_path(Path::new("/home/u"));
        assert_eq!(p, PathBuf::from("/home/u/.claude/wt/config.jsonc"));
    }

    #[test]
    fn profile_dir_is_per_platform() {
        let p = default_profile_dir(Path::new("/home/u"), Platform::Zenn);
        assert_eq!(p, PathBuf::from("/home/u/.claude/wt/browser-profiles/zenn"));
    }

    #[test]
    fn expand_home_only_touches_tilde() {
        let home = Path::new("/home/u");
        assert_eq!(
            expand_home(Path::new("~/blog"), home),
            PathBuf::from("/home/u/blog")
        );
        assert_eq!(expand_home(Path::new("/abs"), home), PathBuf::from("/abs"));
        assert_eq!(expand_home(Path::new("rel"), home), PathBuf::from("rel"));
    }
}
