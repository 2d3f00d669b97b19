use std::fmt;
use std::sync::Arc;

/// Vector-graphic output of one graph node.
///
/// Value type: cloning shares the text, and a new parameter value always produces a new
/// `Artifact` rather than mutating an existing one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Artifact(Arc<str>);

impl Artifact {
    pub fn new(svg: impl Into<Arc<str>>) -> Self {
        Self(svg.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same value: shared allocation or identical text.
    pub fn same(&self, other: &Artifact) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl From<String> for Artifact {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for Artifact {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for Artifact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
