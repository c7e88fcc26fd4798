//! Front matter parsing and sync metadata write-back.

use serde_yaml::{Mapping, Value};
use url::Url;

use notionsync_common::{Error, Result};

/// Delimiter line of a front-matter block.
const DELIMITER: &str = "---";
/// Key holding the public page URL.
pub const LINK_KEY: &str = "link";
/// Key holding the remote page id. Its presence marks a document as synced.
pub const NOTION_ID_KEY: &str = "notionID";

const DEFAULT_HOST: &str = "www.notion.so";

/// A document split into front matter and markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub front_matter: Mapping,
    /// Everything after the closing delimiter, line ending included.
    pub body: String,
}

impl Document {
    /// Remote page id from an earlier sync.
    pub fn notion_id(&self) -> Option<&str> {
        self.front_matter
            .get(NOTION_ID_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Split raw text into front matter and body.
///
/// Front matter is only recognized when the text opens with a `---` line and
/// a later line starts with `---`. Without it the whole text is the body.
///
/// # Errors
/// - `Error::Serialization` if the block is not valid YAML
/// - `Error::InvalidInput` if the block is YAML but not a mapping
pub fn parse(raw: &str) -> Result<Document> {
    let Some((yaml, body)) = split(raw) else {
        return Ok(Document {
            front_matter: Mapping::new(),
            body: raw.to_string(),
        });
    };

    let front_matter = match serde_yaml::from_str::<Value>(yaml)
        .map_err(|e| Error::Serialization(format!("Invalid front matter: {}", e)))?
    {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(Error::InvalidInput(
                "Front matter must be a mapping".to_string(),
            ))
        }
    };

    Ok(Document {
        front_matter,
        body: body.to_string(),
    })
}

fn split(raw: &str) -> Option<(&str, &str)> {
    let rest = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))?;

    if closes_block(rest) {
        return Some(("", &rest[DELIMITER.len()..]));
    }

    let mut from = 0;
    while let Some(found) = rest[from..].find("\n---") {
        let close = from + found;
        let line = &rest[close + 1..];
        if closes_block(line) {
            return Some((&rest[..close], &line[DELIMITER.len()..]));
        }
        from = close + 1;
    }

    None
}

/// Whether `line` starts with a delimiter line of exactly `---`.
fn closes_block(line: &str) -> bool {
    line.strip_prefix(DELIMITER)
        .is_some_and(|tail| tail.is_empty() || tail.starts_with('\n') || tail.starts_with("\r\n"))
}

/// Rewrite the canonical page URL onto a public vanity domain.
///
/// `https://www.notion.so/Foo-abc` with vanity `me` becomes
/// `https://me.notion.site/Foo-abc`. Other hosts and unparsable URLs are
/// returned unchanged.
pub fn vanity_url(url: &str, vanity: Option<&str>) -> String {
    let Some(vanity) = vanity.filter(|v| !v.is_empty()) else {
        return url.to_string();
    };

    match Url::parse(url) {
        Ok(mut parsed) if parsed.host_str() == Some(DEFAULT_HOST) => {
            let host = format!("{}.notion.site", vanity);
            match parsed.set_host(Some(&host)) {
                Ok(()) => parsed.to_string(),
                Err(_) => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

/// Embed the page id and URL in the document's front matter.
///
/// Existing keys keep their position; new ones are appended. The body is
/// kept as-is apart from one leading line ending. Writing the same metadata
/// twice yields the same text.
pub fn write_sync_metadata(
    raw: &str,
    page_id: &str,
    page_url: &str,
    vanity: Option<&str>,
) -> Result<String> {
    let mut document = parse(raw)?;

    document.front_matter.insert(
        Value::String(LINK_KEY.to_string()),
        Value::String(vanity_url(page_url, vanity)),
    );
    document.front_matter.insert(
        Value::String(NOTION_ID_KEY.to_string()),
        Value::String(page_id.to_string()),
    );

    let yaml = serde_yaml::to_string(&document.front_matter)
        .map_err(|e| Error::Serialization(format!("Failed to encode front matter: {}", e)))?;
    let yaml = yaml.strip_suffix('\n').unwrap_or(&yaml);

    let body = document
        .body
        .strip_prefix("\r\n")
        .or_else(|| document.body.strip_prefix('\n'))
        .unwrap_or(&document.body);

    Ok(format!("{DELIMITER}\n{yaml}\n{DELIMITER}\n{body}"))
}
