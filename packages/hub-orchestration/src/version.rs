use serde::{Deserialize, Serialize};

/// Opaque snapshot identifier for a source's data.
///
/// The hub never orders versions itself; ordering is the dump layer's
/// business (it knows the source's versioning scheme). The core only
/// compares for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Version {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

/// Requested target version: either a concrete token or the "latest"
/// sentinel, concretized at run time against the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSpec {
    Latest,
    Exact(Version),
}

impl VersionSpec {
    /// Parse a user-supplied token; "latest" (any case) is the sentinel.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("latest") {
            VersionSpec::Latest
        } else {
            VersionSpec::Exact(Version::new(s))
        }
    }
}

impl Default for VersionSpec {
    fn default() -> Self {
        VersionSpec::Latest
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSpec::Latest => write!(f, "latest"),
            VersionSpec::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered sequence of versions needed to reach a target from the
/// currently installed version. Computed once per run, never recomputed
/// mid-cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionPath(Vec<Version>);

impl VersionPath {
    pub fn new(versions: Vec<Version>) -> Self {
        Self(versions)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn versions(&self) -> &[Version] {
        &self.0
    }

    pub fn last(&self) -> Option<&Version> {
        self.0.last()
    }

    pub fn into_versions(self) -> Vec<Version> {
        self.0
    }
}

impl std::fmt::Display for VersionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tokens: Vec<&str> = self.0.iter().map(|v| v.as_str()).collect();
        write!(f, "[{}]", tokens.join(" -> "))
    }
}
