//! Context creation parameters and loader configuration.

use std::env;
use std::ffi::OsStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{Profile, Version};

/// Environment variable overriding the GL library candidates, see `LoaderConfig::from_env()`.
pub const LIBRARY_ENV_VAR: &str = "DYNAMIC_GL_LIBRARY";

/// Describes the context the caller wants.
///
/// The surface the context renders into is passed separately to `Loader::create_context()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContextCreationRequest {
    /// Requested API version. Ignored for `Profile::Legacy`.
    pub version: Version,

    pub profile: Profile,

    /// Requests a forward-compatible context (deprecated functionality removed).
    pub forward_compatible: bool,

    /// Requests a debug context.
    pub debug: bool,

    /// Swap interval applied to the new context, if the platform supports it. `None` leaves the
    /// driver default untouched.
    pub swap_interval: Option<i32>,
}

impl ContextCreationRequest {
    /// Request for a modern context of the given version and profile.
    pub fn modern(major: u32, minor: u32, profile: Profile) -> ContextCreationRequest {
        ContextCreationRequest {
            version: Version::new(major, minor),
            profile: profile,
            .. ContextCreationRequest::default()
        }
    }

    /// Request for a plain legacy context.
    pub fn legacy() -> ContextCreationRequest {
        ContextCreationRequest::default()
    }

    pub fn with_forward_compatible(mut self, forward_compatible: bool) -> ContextCreationRequest {
        self.forward_compatible = forward_compatible;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> ContextCreationRequest {
        self.debug = debug;
        self
    }

    pub fn with_swap_interval(mut self, swap_interval: i32) -> ContextCreationRequest {
        self.swap_interval = Some(swap_interval);
        self
    }
}

/// Version 3.3 with the legacy profile.
impl Default for ContextCreationRequest {
    fn default() -> ContextCreationRequest {
        ContextCreationRequest {
            version: Version::V3_3,
            profile: Profile::Legacy,
            forward_compatible: false,
            debug: false,
            swap_interval: None,
        }
    }
}

/// Fills `request` with the default parameters (version 3.3, legacy profile).
pub fn set_default_context_creation_parameters(request: &mut ContextCreationRequest) {
    *request = ContextCreationRequest::default();
}

/// Loader-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoaderConfig {
    /// Library names or paths to probe, in order. Empty means the platform's conventional names.
    pub library_names: Vec<String>,

    /// Request used by `Loader::create_default_context()`.
    pub default_request: ContextCreationRequest,
}

impl LoaderConfig {
    /// Builds the default configuration, letting `DYNAMIC_GL_LIBRARY` override the library
    /// candidates.
    ///
    /// The variable holds one or more names separated by the platform's path separator (`;` on
    /// Windows, `:` elsewhere).
    pub fn from_env() -> LoaderConfig {
        let mut config = LoaderConfig::default();

        if let Some(value) = env::var_os(LIBRARY_ENV_VAR) {
            config.library_names = library_names(&value);
        }

        config
    }

    pub fn with_library_names<I, S>(mut self, names: I) -> LoaderConfig
        where I: IntoIterator<Item = S>, S: Into<String>
    {
        self.library_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_request(mut self, request: ContextCreationRequest) -> LoaderConfig {
        self.default_request = request;
        self
    }

    /// The candidates to probe: the configured names, or `defaults` if none are configured.
    pub(crate) fn candidates(&self, defaults: &[&str]) -> Vec<String> {
        if self.library_names.is_empty() {
            defaults.iter().map(|name| String::from(*name)).collect()
        } else {
            self.library_names.clone()
        }
    }
}

/// Splits a `PATH`-style list, dropping empty and non UTF-8 entries.
fn library_names(value: &OsStr) -> Vec<String> {
    env::split_paths(value)
        .filter_map(|path| path.to_str().map(String::from))
        .filter(|name| !name.is_empty())
        .collect()
}
