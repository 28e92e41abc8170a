//! Console configuration.
//!
//! Every setting has a default, so running without a configuration file
//! behaves exactly like the stock tool. A file is looked up in this order:
//!
//! 1. An explicit path (`--config`)
//! 2. The `POSTQCTL_CONFIG` environment variable
//! 3. `./postqctl.config.ron`
//! 4. `/etc/postqctl/postqctl.config.ron`
//!
//! ```ron
//! Config (
//!     tools: (
//!         postqueue: Some("/usr/sbin/postqueue"),
//!     ),
//!     wrap_width: 100,
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    tools::Tool,
};

pub const CONFIG_ENV: &str = "POSTQCTL_CONFIG";

const DEFAULT_PATHS: [&str; 2] = [
    "./postqctl.config.ron",
    "/etc/postqctl/postqctl.config.ron",
];

/// Explicit locations for the queue tools; unset entries are searched on `PATH`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub postqueue: Option<PathBuf>,
    pub postsuper: Option<PathBuf>,
    pub postcat: Option<PathBuf>,
}

impl ToolPaths {
    #[must_use]
    pub fn get(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Postqueue => self.postqueue.as_deref(),
            Tool::Postsuper => self.postsuper.as_deref(),
            Tool::Postcat => self.postcat.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolPaths,

    /// Column at which delay reasons are wrapped
    ///
    /// Default: 72
    pub wrap_width: usize,

    /// Prefix for every line of a wrapped delay reason
    ///
    /// Default: four spaces
    pub indent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            wrap_width: 72,
            indent: "    ".to_string(),
        }
    }
}

impl Config {
    /// Parse a RON configuration document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the document does not parse.
    pub fn parse(source: &str, origin: &Path) -> Result<Self> {
        ron::from_str(source).map_err(|e| Error::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read a configuration file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&source, path)
    }

    /// Load the first configuration file found, or the defaults when there
    /// is none.
    ///
    /// `explicit` and `from_env` must exist when given; the well-known
    /// locations are optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a named file is missing or any file
    /// found does not parse.
    pub fn load(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit.or(from_env) {
            debug!(path = %path.display(), "Loading configuration");
            return Self::from_file(path);
        }

        for path in DEFAULT_PATHS {
            let path = Path::new(path);
            if path.exists() {
                debug!(path = %path.display(), "Loading configuration");
                return Self::from_file(path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }
}
