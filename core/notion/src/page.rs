//! Page objects exchanged with the remote API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::block::{Block, RichText};

/// Name of the required title property.
pub const TITLE_PROPERTY: &str = "Name";
/// Name of the optional multi-select tags property.
pub const TAGS_PROPERTY: &str = "Tags";

/// One option of a multi-select property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// Value of a single page property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(serde_json::Number),
    Url(String),
    MultiSelect(Vec<SelectOption>),
}

impl PropertyValue {
    /// Title property holding a single unstyled segment.
    pub fn title(text: impl Into<String>) -> Self {
        PropertyValue::Title(vec![RichText::plain(text)])
    }

    /// Multi-select property with one option per tag.
    pub fn multi_select<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::MultiSelect(
            tags.into_iter()
                .map(|name| SelectOption { name: name.into() })
                .collect(),
        )
    }
}

/// Named property produced from front matter.
#[derive(Debug, Clone, PartialEq)]
pub struct PageProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl PageProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// External file reference used for covers and icons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalFile {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub external: ExternalTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTarget {
    pub url: String,
}

impl ExternalFile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            kind: "external",
            external: ExternalTarget { url: url.into() },
        }
    }

    pub fn url(&self) -> &str {
        &self.external.url
    }
}

/// Parent reference of a new page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseParent {
    pub database_id: String,
}

/// Body of `POST /v1/pages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePageRequest {
    pub parent: DatabaseParent,
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<ExternalFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ExternalFile>,
    pub children: Vec<Block>,
}

impl CreatePageRequest {
    /// Start a request for `database_id` titled `title`.
    pub fn new(database_id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(TITLE_PROPERTY.to_string(), PropertyValue::title(title));
        Self {
            parent: DatabaseParent {
                database_id: database_id.into(),
            },
            properties,
            cover: None,
            icon: None,
            children: Vec::new(),
        }
    }

    /// Plain text of the title property, if present.
    pub fn title(&self) -> Option<&str> {
        match self.properties.get(TITLE_PROPERTY) {
            Some(PropertyValue::Title(segments)) => segments.first().map(|s| s.plain_text()),
            _ => None,
        }
    }
}

/// Body of `PATCH /v1/blocks/{id}/children`.
#[derive(Debug, Serialize)]
pub struct AppendChildrenRequest<'a> {
    pub children: &'a [Block],
}

/// Page returned by the create call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub id: String,
    pub url: String,
}

/// Database summary used for destination discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct TitleSegment {
    #[serde(default)]
    plain_text: String,
}

/// Raw database object as returned by search and retrieve.
#[derive(Debug, Deserialize)]
pub struct DatabaseObject {
    pub id: String,
    #[serde(default)]
    title: Vec<TitleSegment>,
    #[serde(default)]
    pub is_inline: bool,
}

impl DatabaseObject {
    /// Concatenated plain text of the database title.
    pub fn title(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }

    pub fn into_info(self) -> DatabaseInfo {
        DatabaseInfo {
            title: self.title(),
            id: self.id,
        }
    }
}

/// Response of `POST /v1/search`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<DatabaseObject>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl SearchResponse {
    /// Full-page databases only; inline databases live inside other pages and
    /// are not offered as sync destinations.
    pub fn into_databases(self) -> Vec<DatabaseInfo> {
        self.results
            .into_iter()
            .filter(|db| !db.is_inline)
            .map(DatabaseObject::into_info)
            .collect()
    }
}
