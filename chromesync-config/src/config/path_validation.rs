//! Filesystem checks for configured browser locations.
//!
//! Loading never touches the filesystem; these checks run on demand (the CLI
//! `browsers` command, or the sync engine before it starts).

use std::fmt;
use std::path::{Path, PathBuf};

use super::config_struct::Config;

/// What is wrong with a configured path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProblem {
    Missing,
    NotAFile,
    NotADirectory,
}

impl fmt::Display for PathProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathProblem::Missing => "does not exist",
            PathProblem::NotAFile => "is not a file",
            PathProblem::NotADirectory => "is not a directory",
        })
    }
}

/// A failed check on one browser path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCheck {
    /// Browser name, the key in the `browsers` map.
    pub browser: String,
    /// `path` or `user_data_dir`
    pub field: &'static str,
    pub path: PathBuf,
    pub problem: PathProblem,
}

impl fmt::Display for PathCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "browsers.{}.{}: {} {}",
            self.browser,
            self.field,
            self.path.display(),
            self.problem
        )
    }
}

fn check_file(path: &Path) -> Option<PathProblem> {
    if !path.exists() {
        Some(PathProblem::Missing)
    } else if !path.is_file() {
        Some(PathProblem::NotAFile)
    } else {
        None
    }
}

fn check_dir(path: &Path) -> Option<PathProblem> {
    if !path.exists() {
        Some(PathProblem::Missing)
    } else if !path.is_dir() {
        Some(PathProblem::NotADirectory)
    } else {
        None
    }
}

impl Config {
    /// Check that every browser executable is a file and every user data
    /// directory is a directory. Returns the failures; empty means all good.
    pub fn check_browser_paths(&self) -> Vec<PathCheck> {
        let mut problems = Vec::new();
        for (name, browser) in &self.browsers {
            let checks = [
                ("path", &browser.path, check_file(&browser.path)),
                (
                    "user_data_dir",
                    &browser.user_data_dir,
                    check_dir(&browser.user_data_dir),
                ),
            ];
            for (field, path, problem) in checks {
                if let Some(problem) = problem {
                    log::warn!("Browser {name}: {field} {} {problem}", path.display());
                    problems.push(PathCheck {
                        browser: name.clone(),
                        field,
                        path: path.clone(),
                        problem,
                    });
                }
            }
        }
        problems
    }
}
