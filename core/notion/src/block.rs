//! Content nodes submitted as page children.
//!
//! A [`Block`] is a tagged node: the `object` marker is always `"block"`, the
//! block type carries kind-specific payload, and an optional child sequence
//! holds nested blocks. Rich-text segments are payload only; they are never
//! blocks themselves and never add nesting.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Object marker for submittable nodes.
pub const BLOCK_OBJECT: &str = "block";

/// Text styling flags for a rich-text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: "default".to_string(),
        }
    }
}

/// Hyperlink attached to a text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// Text payload of a rich-text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    pub link: Option<Link>,
}

/// One rich-text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextContent,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
}

impl RichText {
    /// Unstyled, unlinked text.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::styled(content, Annotations::default(), None)
    }

    /// Text with explicit annotations and an optional link.
    pub fn styled(content: impl Into<String>, annotations: Annotations, link: Option<String>) -> Self {
        let content = content.into();
        Self {
            kind: "text".to_string(),
            plain_text: content.clone(),
            href: link.clone(),
            text: TextContent {
                content,
                link: link.map(|url| Link { url }),
            },
            annotations,
        }
    }

    /// Plain text of this segment.
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }
}

/// Heading level supported by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    One,
    Two,
    Three,
}

/// Block type with its kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Paragraph { rich_text: Vec<RichText> },
    Heading { level: HeadingLevel, rich_text: Vec<RichText> },
    BulletedListItem { rich_text: Vec<RichText> },
    NumberedListItem { rich_text: Vec<RichText> },
    ToDo { rich_text: Vec<RichText>, checked: bool },
    Quote { rich_text: Vec<RichText> },
    Code { rich_text: Vec<RichText>, language: String },
    Image { url: String },
    Divider,
}

impl BlockContent {
    /// The API type name, e.g. `heading_2`.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockContent::Paragraph { .. } => "paragraph",
            BlockContent::Heading { level: HeadingLevel::One, .. } => "heading_1",
            BlockContent::Heading { level: HeadingLevel::Two, .. } => "heading_2",
            BlockContent::Heading { level: HeadingLevel::Three, .. } => "heading_3",
            BlockContent::BulletedListItem { .. } => "bulleted_list_item",
            BlockContent::NumberedListItem { .. } => "numbered_list_item",
            BlockContent::ToDo { .. } => "to_do",
            BlockContent::Quote { .. } => "quote",
            BlockContent::Code { .. } => "code",
            BlockContent::Image { .. } => "image",
            BlockContent::Divider => "divider",
        }
    }

    /// Rich-text payload, if this block type carries one.
    pub fn rich_text(&self) -> Option<&[RichText]> {
        match self {
            BlockContent::Paragraph { rich_text }
            | BlockContent::Heading { rich_text, .. }
            | BlockContent::BulletedListItem { rich_text }
            | BlockContent::NumberedListItem { rich_text }
            | BlockContent::ToDo { rich_text, .. }
            | BlockContent::Quote { rich_text }
            | BlockContent::Code { rich_text, .. } => Some(rich_text),
            BlockContent::Image { .. } | BlockContent::Divider => None,
        }
    }

    fn rich_text_mut(&mut self) -> Option<&mut Vec<RichText>> {
        match self {
            BlockContent::Paragraph { rich_text }
            | BlockContent::Heading { rich_text, .. }
            | BlockContent::BulletedListItem { rich_text }
            | BlockContent::NumberedListItem { rich_text }
            | BlockContent::ToDo { rich_text, .. }
            | BlockContent::Quote { rich_text }
            | BlockContent::Code { rich_text, .. } => Some(rich_text),
            BlockContent::Image { .. } | BlockContent::Divider => None,
        }
    }

    /// Whether the remote API accepts nested children under this type.
    pub fn accepts_children(&self) -> bool {
        matches!(
            self,
            BlockContent::Paragraph { .. }
                | BlockContent::BulletedListItem { .. }
                | BlockContent::NumberedListItem { .. }
                | BlockContent::ToDo { .. }
                | BlockContent::Quote { .. }
        )
    }
}

/// A submittable content node.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub content: BlockContent,
    children: Option<Vec<Block>>,
}

impl Block {
    /// Create a leaf block.
    pub fn new(content: BlockContent) -> Self {
        Self {
            content,
            children: None,
        }
    }

    /// Attach a child sequence. An empty sequence still counts as a nesting level.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = Some(children);
        self
    }

    /// Paragraph of unstyled text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockContent::Paragraph {
            rich_text: vec![RichText::plain(text)],
        })
    }

    /// Bulleted list item of unstyled text.
    pub fn bullet(text: impl Into<String>) -> Self {
        Self::new(BlockContent::BulletedListItem {
            rich_text: vec![RichText::plain(text)],
        })
    }

    /// The node-kind marker. Every content node is a submittable block.
    pub fn object(&self) -> &'static str {
        BLOCK_OBJECT
    }

    /// Child sequence, if present.
    pub fn children(&self) -> Option<&[Block]> {
        self.children.as_deref()
    }

    /// Mutable child sequence, created on demand.
    pub fn children_mut(&mut self) -> &mut Vec<Block> {
        self.children.get_or_insert_with(Vec::new)
    }

    /// Cut every rich-text segment down to `max_chars` characters, recursively.
    pub fn truncate_text(&mut self, max_chars: usize) {
        if let Some(segments) = self.content.rich_text_mut() {
            for segment in segments.iter_mut() {
                if segment.text.content.chars().count() > max_chars {
                    let cut: String = segment.text.content.chars().take(max_chars).collect();
                    segment.plain_text = cut.clone();
                    segment.text.content = cut;
                }
            }
        }
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.truncate_text(max_chars);
            }
        }
    }
}

#[derive(Serialize)]
struct ExternalUrl<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct BlockBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    rich_text: Option<&'a [RichText]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    file_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external: Option<ExternalUrl<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<&'a [Block]>,
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = BlockBody {
            rich_text: self.content.rich_text(),
            checked: None,
            language: None,
            file_type: None,
            external: None,
            children: self.children(),
        };
        match &self.content {
            BlockContent::ToDo { checked, .. } => body.checked = Some(*checked),
            BlockContent::Code { language, .. } => body.language = Some(language.as_str()),
            BlockContent::Image { url } => {
                body.file_type = Some("external");
                body.external = Some(ExternalUrl { url });
            }
            _ => {}
        }

        let type_name = self.content.type_name();
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("object", BLOCK_OBJECT)?;
        map.serialize_entry("type", type_name)?;
        map.serialize_entry(type_name, &body)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_serialization() {
        let json = serde_json::to_value(Block::paragraph("hello")).unwrap();
        assert_eq!(json["object"], "block");
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["paragraph"]["rich_text"][0]["text"]["content"], "hello");
        assert_eq!(json["paragraph"]["rich_text"][0]["annotations"]["color"], "default");
        assert!(json["paragraph"].get("children").is_none());
    }

    #[test]
    fn test_nested_children_serialized_inside_type_object() {
        let block = Block::bullet("parent").with_children(vec![Block::bullet("child")]);
        let json = serde_json::to_value(&block).unwrap();
        let children = json["bulleted_list_item"]["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["type"], "bulleted_list_item");
    }

    #[test]
    fn test_special_payloads() {
        let todo = Block::new(BlockContent::ToDo {
            rich_text: vec![RichText::plain("task")],
            checked: true,
        });
        assert_eq!(serde_json::to_value(&todo).unwrap()["to_do"]["checked"], true);

        let code = Block::new(BlockContent::Code {
            rich_text: vec![RichText::plain("fn main() {}")],
            language: "rust".to_string(),
        });
        assert_eq!(serde_json::to_value(&code).unwrap()["code"]["language"], "rust");

        let image = Block::new(BlockContent::Image {
            url: "https://example.com/a.png".to_string(),
        });
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["image"]["type"], "external");
        assert_eq!(json["image"]["external"]["url"], "https://example.com/a.png");

        let divider = serde_json::to_value(Block::new(BlockContent::Divider)).unwrap();
        assert_eq!(divider["divider"], serde_json::json!({}));
    }

    #[test]
    fn test_empty_children_still_present() {
        let block = Block::paragraph("x").with_children(Vec::new());
        assert_eq!(block.children().map(|c| c.len()), Some(0));
        let json = serde_json::to_value(&block).unwrap();
        assert!(json["paragraph"]["children"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_truncate_text_is_recursive() {
        let long = "x".repeat(50);
        let mut block = Block::bullet(long.clone()).with_children(vec![Block::bullet(long)]);
        block.truncate_text(10);

        let top = block.content.rich_text().unwrap();
        assert_eq!(top[0].text.content.len(), 10);
        assert_eq!(top[0].plain_text(), "xxxxxxxxxx");
        let nested = block.children().unwrap()[0].content.rich_text().unwrap();
        assert_eq!(nested[0].text.content.len(), 10);
    }

    #[test]
    fn test_link_sets_href() {
        let rt = RichText::styled("docs", Annotations::default(), Some("https://a.b".to_string()));
        assert_eq!(rt.href.as_deref(), Some("https://a.b"));
        assert_eq!(rt.text.link.as_ref().map(|l| l.url.as_str()), Some("https://a.b"));
    }
}
