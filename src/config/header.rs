use serde::{Serialize, Deserialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Descriptive information stored with a saved network or database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub author: String,
    pub name: String,
    pub version: String,
    /// Creation time in seconds since the Unix epoch.
    pub created: u64,
    #[serde(default)]
    pub comment: String,
}

impl Header {
    /// A header stamped with the current time.
    pub fn new(author: &str, name: &str, version: &str, comment: &str) -> Header {
        Header {
            author: author.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            created: now(),
            comment: comment.to_string(),
        }
    }

    /// Used when saving a network that never had a header.
    pub fn placeholder() -> Header {
        Header::new("UNSET AUTHOR", "UNSET NAME", "0.0", "UNSET COMMENT")
    }

    /// Copy of this header with `suffix` appended to the name.
    pub fn derived(&self, suffix: &str) -> Header {
        Header {
            name: format!("{}{}", self.name, suffix),
            ..self.clone()
        }
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
