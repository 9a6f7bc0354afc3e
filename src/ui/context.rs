//! Terminal detection for download progress

use std::io::IsTerminal;

/// Variables set by common CI runners
const CI_MARKERS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// Decides whether downloads draw progress bars
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    progress_bars: bool,
}

impl UiContext {
    /// Inspect stderr and the process environment
    pub fn detect() -> Self {
        Self::from_signals(std::io::stderr().is_terminal(), |name| {
            std::env::var_os(name).is_some()
        })
    }

    /// Plain output, used by tests and library callers
    pub fn non_interactive() -> Self {
        Self {
            progress_bars: false,
        }
    }

    fn from_signals(stderr_is_tty: bool, is_set: impl Fn(&str) -> bool) -> Self {
        let on_ci = CI_MARKERS.iter().any(|name| is_set(name));
        Self {
            progress_bars: stderr_is_tty && !on_ci,
        }
    }

    pub fn use_fancy_output(&self) -> bool {
        self.progress_bars
    }
}
