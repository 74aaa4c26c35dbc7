//! Build identification passed down from the binary.

use std::fmt;

/// Version and source revision of the running binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub source: String,
}

impl BuildInfo {
    pub fn new(version: &str, source: &str) -> Self {
        Self {
            version: version.to_string(),
            source: source.to_string(),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.source)
    }
}
