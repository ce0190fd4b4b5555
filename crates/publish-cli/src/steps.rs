//! Sequential external-tool steps for the CLI publish methods.
//!
//! A plan is an ordered list of [`PlanItem`]s built as a pure function of
//! the article and the project's on-disk state. [`run_plan`] executes it
//! strictly in order and stops at the first failure; nothing is rolled back.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use publish_core::io::{atomic_write, ensure_dir};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("step '{step}' failed with exit code {code}{}", stderr_suffix(.stderr))]
    Failed {
        step: String,
        code: i32,
        stderr: String,
    },

    #[error("'{program}' not found on PATH: {hint}")]
    MissingTool { program: String, hint: String },

    #[error("could not start step '{step}': {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: publish_core::PublishError,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Inherit the terminal (login prompts); stderr is not captured.
    pub interactive: bool,
    /// Arguments for a check run with the same program first; the step is
    /// skipped when the check succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unless: Option<Vec<String>>,
}

impl Step {
    pub fn new(name: &str, program: &str, args: &[&str], cwd: &std::path::Path) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.to_path_buf(),
            interactive: false,
            unless: None,
        }
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn unless(mut self, check: &[&str]) -> Self {
        self.unless = Some(check.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanItem {
    Run(Step),
    WriteFile {
        name: String,
        path: PathBuf,
        #[serde(skip)]
        contents: String,
    },
}

impl PlanItem {
    pub fn name(&self) -> &str {
        match self {
            PlanItem::Run(step) => &step.name,
            PlanItem::WriteFile { name, .. } => name,
        }
    }

    /// Human-readable one-liner for `--dry-run`.
    pub fn describe(&self) -> String {
        match self {
            PlanItem::Run(step) => {
                let mut line = format!(
                    "{:<10} {}  (in {})",
                    step.name,
                    step.command_line(),
                    step.cwd.display()
                );
                if let Some(check) = &step.unless {
                    line.push_str(&format!("  [skipped if `{} {}` succeeds]", step.program, check.join(" ")));
                }
                line
            }
            PlanItem::WriteFile { name, path, .. } => {
                format!("{:<10} write {}", name, path.display())
            }
        }
    }
}

pub fn step_names(plan: &[PlanItem]) -> Vec<&str> {
    plan.iter().map(PlanItem::name).collect()
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Fail early if any program the plan needs is missing.
pub fn check_tools(plan: &[PlanItem]) -> Result<(), StepError> {
    let programs: BTreeSet<&str> = plan
        .iter()
        .filter_map(|item| match item {
            PlanItem::Run(step) => Some(step.program.as_str()),
            PlanItem::WriteFile { .. } => None,
        })
        .collect();
    for program in programs {
        if which::which(program).is_err() {
            return Err(StepError::MissingTool {
                program: program.to_string(),
                hint: install_hint(program).to_string(),
            });
        }
    }
    Ok(())
}

fn install_hint(program: &str) -> &'static str {
    match program {
        "npm" | "npx" | "node" => "install Node.js 18+ from https://nodejs.org",
        "git" => "install git from https://git-scm.com",
        _ => "install it and make sure it is on PATH",
    }
}

pub fn run_step(step: &Step) -> Result<(), StepError> {
    let spawn_err = |source| StepError::Spawn {
        step: step.name.clone(),
        source,
    };

    if let Some(check) = &step.unless {
        let status = Command::new(&step.program)
            .args(check)
            .current_dir(&step.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(spawn_err)?;
        if status.success() {
            tracing::info!(step = %step.name, "nothing to do; skipping");
            return Ok(());
        }
    }

    tracing::info!(step = %step.name, cmd = %step.command_line(), "running");
    let mut cmd = Command::new(&step.program);
    cmd.args(&step.args).current_dir(&step.cwd);

    if step.interactive {
        let status = cmd.status().map_err(spawn_err)?;
        if !status.success() {
            return Err(StepError::Failed {
                step: step.name.clone(),
                code: status.code().unwrap_or(-1),
                stderr: String::new(),
            });
        }
        return Ok(());
    }

    let out = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(spawn_err)?;
    let stdout = String::from_utf8_lossy(&out.stdout);
    if !stdout.trim().is_empty() {
        tracing::debug!(step = %step.name, "{}", stdout.trim_end());
    }
    if !out.status.success() {
        return Err(StepError::Failed {
            step: step.name.clone(),
            code: out.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Run every item in order, stopping at the first failure.
pub fn run_plan(plan: &[PlanItem]) -> Result<(), StepError> {
    check_tools(plan)?;
    for item in plan {
        match item {
            PlanItem::Run(step) => run_step(step)?,
            PlanItem::WriteFile {
                name,
                path,
                contents,
            } => {
                tracing::info!(step = %name, path = %path.display(), "writing");
                let write_err = |source| StepError::Write {
                    path: path.display().to_string(),
                    source,
                };
                if let Some(parent) = path.parent() {
                    ensure_dir(parent).map_err(write_err)?;
                }
                atomic_write(path, contents.as_bytes()).map_err(write_err)?;
            }
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(name: &str, script: &str, cwd: &std::path::Path) -> PlanItem {
        PlanItem::Run(Step::new(name, "sh", &["-c", script], cwd))
    }

    #[test]
    fn steps_run_in_order() {
        let dir = TempDir::new().unwrap();
        let plan = vec![
            sh("first", "echo one >> log.txt", dir.path()),
            PlanItem::WriteFile {
                name: "write".into(),
                path: dir.path().join("public").join("a.md"),
                contents: "hello".into(),
            },
            sh("second", "echo two >> log.txt", dir.path()),
        ];
        run_plan(&plan).unwrap();
        let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(log, "one\ntwo\n");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("public/a.md")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn failure_stops_and_keeps_stderr() {
        let dir = TempDir::new().unwrap();
        let plan = vec![
            sh("broken", "echo 'token expired' >&2; exit 3", dir.path()),
            sh("after", "touch ran", dir.path()),
        ];
        let err = run_plan(&plan).unwrap_err();
        match &err {
            StepError::Failed { step, code, stderr } => {
                assert_eq!(step, "broken");
                assert_eq!(*code, 3);
                assert_eq!(stderr, "token expired\n");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("token expired"));
        assert!(!dir.path().join("ran").exists());
    }

    #[test]
    fn missing_tool_is_reported_before_running() {
        let dir = TempDir::new().unwrap();
        let plan = vec![
            sh("first", "touch ran", dir.path()),
            PlanItem::Run(Step::new("ghost", "wtpub-no-such-tool", &[], dir.path())),
        ];
        let err = run_plan(&plan).unwrap_err();
        assert!(matches!(err, StepError::MissingTool { ref program, .. } if program == "wtpub-no-such-tool"));
        assert!(!dir.path().join("ran").exists());
    }

    #[test]
    fn guarded_step_is_skipped_when_check_passes() {
        let dir = TempDir::new().unwrap();
        let guarded = |check: &str| {
            PlanItem::Run(
                Step::new("commit", "sh", &["-c", "echo ran >> log.txt"], dir.path())
                    .unless(&["-c", check]),
            )
        };
        run_plan(&[guarded("exit 0")]).unwrap();
        assert!(!dir.path().join("log.txt").exists());

        run_plan(&[guarded("exit 1")]).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("log.txt")).unwrap(),
            "ran\n"
        );
    }

    #[test]
    fn describe_shows_command_line() {
        let item = PlanItem::Run(Step::new("publish", "npx", &["qiita", "publish", "a"], std::path::Path::new("/p")));
        assert!(item.describe().contains("npx qiita publish a  (in /p)"));
    }
}
