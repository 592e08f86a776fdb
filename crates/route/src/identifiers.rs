//! Trip identifier handed to persistence backends.

use std::fmt;
use std::sync::Arc;

/// Backed by `Arc<str>` so every queued update can carry it cheaply.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TripIdentifier(Arc<str>);

impl TripIdentifier {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TripIdentifier {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TripIdentifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TripIdentifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
