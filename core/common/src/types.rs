//! Common types used throughout notionsync.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Path of a document relative to the vault root.
///
/// Always uses '/' as separator regardless of platform, and never escapes
/// the vault (no `..` components).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentPath {
    components: Vec<String>,
}

impl DocumentPath {
    /// The vault root.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Create a path from string components.
    ///
    /// # Errors
    /// - Returns error if any component is empty, contains a separator, or is `..`
    pub fn from_components(components: Vec<String>) -> crate::Result<Self> {
        for comp in &components {
            if comp.is_empty() {
                return Err(crate::Error::InvalidInput(
                    "Path component cannot be empty".to_string(),
                ));
            }
            if comp.contains('/') || comp.contains('\\') {
                return Err(crate::Error::InvalidInput(
                    "Path component cannot contain separators".to_string(),
                ));
            }
            if comp == ".." {
                return Err(crate::Error::InvalidInput(
                    "Path cannot leave the vault".to_string(),
                ));
            }
        }
        Ok(Self { components })
    }

    /// Parse a vault-relative path string. Leading and trailing separators
    /// and `.` components are ignored.
    pub fn parse(path: &str) -> crate::Result<Self> {
        let components: Vec<String> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .map(String::from)
            .collect();
        Self::from_components(components)
    }

    /// Check if this is the vault root.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the file name (last component).
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(|s| s.as_str())
    }

    /// File name without its extension. Used as the remote page title.
    pub fn stem(&self) -> Option<&str> {
        let name = self.name()?;
        match name.rfind('.') {
            Some(0) | None => Some(name),
            Some(idx) => Some(&name[..idx]),
        }
    }

    /// Whether the file name carries a `.md` extension.
    pub fn is_markdown(&self) -> bool {
        self.name()
            .map(|n| n.len() > 3 && n.to_ascii_lowercase().ends_with(".md"))
            .unwrap_or(false)
    }

    /// Component-wise prefix test: `notes` matches `notes/a.md` but not
    /// `notes-old/a.md`.
    pub fn starts_with(&self, prefix: &DocumentPath) -> bool {
        self.components.starts_with(&prefix.components)
    }

    /// Join this path with a child component.
    pub fn join(&self, child: &str) -> crate::Result<Self> {
        let mut components = self.components.clone();
        components.push(child.to_string());
        Self::from_components(components)
    }

    /// Get the path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Convert to the vault-relative string form, e.g. `notes/today.md`.
    pub fn to_string_path(&self) -> String {
        self.components.join("/")
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_path())
    }
}

/// Notion integration token that zeroizes on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Expose the raw token for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_document_path_parse() {
        let path = DocumentPath::parse("/notes/daily/today.md").unwrap();
        assert_eq!(path.components(), &["notes", "daily", "today.md"]);
        assert_eq!(path.to_string_path(), "notes/daily/today.md");
    }

    #[test]
    fn test_document_path_rejects_parent_escape() {
        assert!(DocumentPath::parse("notes/../../etc/passwd").is_err());
    }

    #[test]
    fn test_document_path_stem() {
        let path = DocumentPath::parse("notes/My Page.md").unwrap();
        assert_eq!(path.stem(), Some("My Page"));

        let dotted = DocumentPath::parse("v1.2 notes.md").unwrap();
        assert_eq!(dotted.stem(), Some("v1.2 notes"));

        let hidden = DocumentPath::parse(".hidden").unwrap();
        assert_eq!(hidden.stem(), Some(".hidden"));
    }

    #[test]
    fn test_document_path_is_markdown() {
        assert!(DocumentPath::parse("a/b.md").unwrap().is_markdown());
        assert!(DocumentPath::parse("a/B.MD").unwrap().is_markdown());
        assert!(!DocumentPath::parse("a/b.txt").unwrap().is_markdown());
        assert!(!DocumentPath::parse(".md").unwrap().is_markdown());
    }

    #[test]
    fn test_document_path_prefix_is_component_wise() {
        let file = DocumentPath::parse("notes/2023/a.md").unwrap();
        assert!(file.starts_with(&DocumentPath::parse("notes").unwrap()));
        assert!(file.starts_with(&DocumentPath::parse("notes/2023").unwrap()));
        assert!(file.starts_with(&DocumentPath::root()));
        assert!(!file.starts_with(&DocumentPath::parse("note").unwrap()));
        assert!(!file.starts_with(&DocumentPath::parse("notes/2023/a").unwrap()));
    }

    #[test]
    fn test_document_path_join() {
        let path = DocumentPath::root().join("notes").unwrap().join("a.md").unwrap();
        assert_eq!(path.to_string_path(), "notes/a.md");
        assert!(path.join("x/y").is_err());
    }

    #[test]
    fn test_api_token_debug_is_redacted() {
        let token = ApiToken::new("secret_abc");
        assert_eq!(format!("{:?}", token), "ApiToken([REDACTED])");
        assert_eq!(token.expose(), "secret_abc");
        assert!(ApiToken::new("  ").is_empty());
    }

    proptest! {
        #[test]
        fn prop_parse_display_roundtrip(parts in proptest::collection::vec("[a-z0-9 ]{1,8}", 0..5)) {
            let joined = parts.join("/");
            let path = DocumentPath::parse(&joined).unwrap();
            prop_assert_eq!(DocumentPath::parse(&path.to_string_path()).unwrap(), path);
        }
    }
}
