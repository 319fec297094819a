//! User-facing notices
//!
//! Every dashboard operation reports its outcome as a `Notice` on an
//! unbounded channel. Front ends take the receiver once and render the
//! notices however they like (toast, status line, stderr).

use std::fmt;

use serde::Serialize;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message describing the outcome of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}: {}", self.title, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let notice = Notice::success("Server added", "web-1 has been added");
        assert_eq!(notice.to_string(), "Server added: web-1 has been added");
        assert!(!notice.is_error());

        let bare = Notice::error("Error", "");
        assert_eq!(bare.to_string(), "Error");
        assert!(bare.is_error());
    }

    #[test]
    fn test_serializes_level_lowercase() {
        let json = serde_json::to_string(&Notice::error("Error", "boom")).unwrap();
        assert!(json.contains("\"level\":\"error\""));
    }
}
