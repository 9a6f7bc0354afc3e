//! Cache state machine
//!
//! | State | Meaning |
//! |-------|---------|
//! | Unknown | Not yet assessed |
//! | Fresh | Stored tag matches, or verification was bypassed |
//! | Stale | Needs a clean bootstrap and install |
//! | Provisioned | Install finished, tag not yet written |
//! | Tagged | Tag and build config written for the current key |
//!
//! Every decision here is a pure function so each transition can be tested
//! without touching the filesystem.

use crate::cache::key::CacheKey;
use crate::error::{PrebuildError, PrebuildResult};
use serde::Serialize;
use std::fmt;

/// Lifecycle of one cache location within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Unknown,
    Fresh,
    Stale,
    Provisioned,
    Tagged,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Provisioned => "provisioned",
            Self::Tagged => "tagged",
        };
        write!(f, "{}", name)
    }
}

/// Why a cache is considered fresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshReason {
    /// A user-supplied toolchain tree is never cleaned or bootstrapped,
    /// but the dependency set is still installed into it
    ExplicitRoot,
    /// Verification skipped on request
    Skipped,
    TagMatches,
}

/// Why a cache must be rebuilt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    Forced,
    TagMissing,
    TagMismatch { stored: String, computed: String },
}

/// Outcome of assessing a cache location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "lowercase")]
pub enum Staleness {
    Fresh(FreshReason),
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    /// State reached from `Unknown` by this verdict
    pub fn state(&self) -> CacheState {
        match self {
            Self::Fresh(_) => CacheState::Fresh,
            Self::Stale(_) => CacheState::Stale,
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh(FreshReason::ExplicitRoot) => write!(f, "fresh (explicit toolchain root)"),
            Self::Fresh(FreshReason::Skipped) => write!(f, "fresh (verification skipped)"),
            Self::Fresh(FreshReason::TagMatches) => write!(f, "fresh (tag matches)"),
            Self::Stale(StaleReason::Forced) => write!(f, "stale (forced rebuild)"),
            Self::Stale(StaleReason::TagMissing) => write!(f, "stale (no tag file)"),
            Self::Stale(StaleReason::TagMismatch { stored, computed }) => {
                write!(f, "stale (stored tag {} != {})", stored, computed)
            }
        }
    }
}

/// Inputs to the staleness decision
#[derive(Debug, Clone, Default)]
pub struct StalenessCheck {
    pub explicit_root: bool,
    pub force_build: bool,
    pub skip_verification: bool,
    /// Raw tag file contents, `None` when absent
    pub stored_tag: Option<String>,
    /// Serialized key computed for this run
    pub computed: String,
}

impl StalenessCheck {
    pub fn new(key: &CacheKey, stored_tag: Option<String>) -> Self {
        Self {
            stored_tag,
            computed: key.to_string(),
            ..Default::default()
        }
    }
}

/// Decide whether a cache location can be reused.
///
/// Rules apply in order: explicit root, force, skip, missing tag, mismatch.
pub fn assess(check: &StalenessCheck) -> Staleness {
    if check.explicit_root {
        return Staleness::Fresh(FreshReason::ExplicitRoot);
    }
    if check.force_build {
        return Staleness::Stale(StaleReason::Forced);
    }
    if check.skip_verification {
        return Staleness::Fresh(FreshReason::Skipped);
    }
    match check.stored_tag.as_deref().map(str::trim_end) {
        None => Staleness::Stale(StaleReason::TagMissing),
        Some(stored) if stored != check.computed => Staleness::Stale(StaleReason::TagMismatch {
            stored: stored.to_string(),
            computed: check.computed.clone(),
        }),
        Some(_) => Staleness::Fresh(FreshReason::TagMatches),
    }
}

/// Whether the toolchain archive must be fetched during bootstrap
pub fn needs_toolchain_download(force_bootstrap: bool, exe_exists: bool, marker_exists: bool) -> bool {
    force_bootstrap || !exe_exists || !marker_exists
}

/// Events driving the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Assessed(Staleness),
    Provisioned,
    Tagged,
}

/// Apply one event, rejecting transitions the pipeline never makes
pub fn transition(state: CacheState, event: &CacheEvent) -> PrebuildResult<CacheState> {
    use CacheState::*;
    match (state, event) {
        (Unknown, CacheEvent::Assessed(verdict)) => Ok(verdict.state()),
        (Stale, CacheEvent::Provisioned) => Ok(Provisioned),
        (Fresh | Provisioned, CacheEvent::Tagged) => Ok(Tagged),
        (from, event) => Err(PrebuildError::Internal(format!(
            "invalid cache transition from {} on {:?}",
            from, event
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(stored: Option<&str>) -> StalenessCheck {
        StalenessCheck {
            stored_tag: stored.map(str::to_string),
            computed: "1a2b3c4d_1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_tag_is_stale() {
        assert_eq!(assess(&check(None)), Staleness::Stale(StaleReason::TagMissing));
    }

    #[test]
    fn mismatched_tag_is_stale() {
        let verdict = assess(&check(Some("ffffffff_1")));
        assert_eq!(
            verdict,
            Staleness::Stale(StaleReason::TagMismatch {
                stored: "ffffffff_1".to_string(),
                computed: "1a2b3c4d_1".to_string(),
            })
        );
    }

    #[test]
    fn format_version_bump_is_stale() {
        assert!(assess(&check(Some("1a2b3c4d_0"))).is_stale());
    }

    #[test]
    fn matching_tag_is_fresh() {
        assert_eq!(
            assess(&check(Some("1a2b3c4d_1"))),
            Staleness::Fresh(FreshReason::TagMatches)
        );
    }

    #[test]
    fn trailing_newline_in_tag_is_ignored() {
        assert!(!assess(&check(Some("1a2b3c4d_1\n"))).is_stale());
    }

    #[test]
    fn force_overrides_matching_tag() {
        let mut c = check(Some("1a2b3c4d_1"));
        c.force_build = true;
        assert_eq!(assess(&c), Staleness::Stale(StaleReason::Forced));
    }

    #[test]
    fn skip_trusts_missing_tag() {
        let mut c = check(None);
        c.skip_verification = true;
        assert_eq!(assess(&c), Staleness::Fresh(FreshReason::Skipped));
    }

    #[test]
    fn force_beats_skip() {
        let mut c = check(None);
        c.skip_verification = true;
        c.force_build = true;
        assert!(assess(&c).is_stale());
    }

    #[test]
    fn explicit_root_is_never_stale() {
        let mut c = check(None);
        c.explicit_root = true;
        c.force_build = true;
        assert_eq!(assess(&c), Staleness::Fresh(FreshReason::ExplicitRoot));
    }

    #[test]
    fn toolchain_download_decision() {
        assert!(!needs_toolchain_download(false, true, true));
        assert!(needs_toolchain_download(true, true, true));
        assert!(needs_toolchain_download(false, false, true));
        assert!(needs_toolchain_download(false, true, false));
    }

    #[test]
    fn stale_path_transitions() {
        let s = transition(
            CacheState::Unknown,
            &CacheEvent::Assessed(Staleness::Stale(StaleReason::TagMissing)),
        )
        .unwrap();
        assert_eq!(s, CacheState::Stale);
        let s = transition(s, &CacheEvent::Provisioned).unwrap();
        assert_eq!(s, CacheState::Provisioned);
        let s = transition(s, &CacheEvent::Tagged).unwrap();
        assert_eq!(s, CacheState::Tagged);
    }

    #[test]
    fn fresh_path_skips_provisioning() {
        let s = transition(
            CacheState::Unknown,
            &CacheEvent::Assessed(Staleness::Fresh(FreshReason::TagMatches)),
        )
        .unwrap();
        assert_eq!(s, CacheState::Fresh);
        assert!(transition(s, &CacheEvent::Provisioned).is_err());
        assert_eq!(
            transition(s, &CacheEvent::Tagged).unwrap(),
            CacheState::Tagged
        );
    }

    #[test]
    fn invalid_transitions_are_internal_errors() {
        assert!(transition(CacheState::Unknown, &CacheEvent::Tagged).is_err());
        assert!(transition(CacheState::Stale, &CacheEvent::Tagged).is_err());
        let err = transition(
            CacheState::Tagged,
            &CacheEvent::Assessed(Staleness::Fresh(FreshReason::Skipped)),
        )
        .unwrap_err();
        assert!(matches!(err, PrebuildError::Internal(_)));
    }
}
