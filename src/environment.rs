//! # Environment
//!
//! The slice of the host environment a locator needs: the active profiles.

use crate::constants::ACTIVE_PROFILES_ENV;

/// Host environment as seen by locators
pub trait Environment: Send + Sync {
    /// Active profiles, least specific first
    fn active_profiles(&self) -> Vec<String>;
}

/// Environment with a fixed list of profiles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticEnvironment {
    profiles: Vec<String>,
}

impl StaticEnvironment {
    #[must_use]
    pub fn new<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            profiles: profiles.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma separated profile list, ignoring blanks
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|profile| !profile.is_empty()),
        )
    }
}

impl Environment for StaticEnvironment {
    fn active_profiles(&self) -> Vec<String> {
        self.profiles.clone()
    }
}

/// Environment read from the process (`ACTIVE_PROFILES=dev,k8s`)
#[derive(Debug, Clone, Default)]
pub struct ProcessEnvironment {
    inner: StaticEnvironment,
}

impl ProcessEnvironment {
    #[must_use]
    pub fn from_env() -> Self {
        let inner = std::env::var(ACTIVE_PROFILES_ENV)
            .map(|list| StaticEnvironment::parse(&list))
            .unwrap_or_default();
        Self { inner }
    }
}

impl Environment for ProcessEnvironment {
    fn active_profiles(&self) -> Vec<String> {
        self.inner.active_profiles()
    }
}
