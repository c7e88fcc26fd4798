//! Markdown to block conversion.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel as MdHeading, Options, Parser, Tag, TagEnd};

use crate::block::{Annotations, Block, BlockContent, HeadingLevel, RichText};

/// Characters allowed in one rich-text segment by the remote API.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;
/// Top-level blocks kept when truncation is enabled.
pub const MAX_TRUNCATED_BLOCKS: usize = 100;

/// Conversion options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Cut output to the remote API's size limits. The sync engine disables
    /// this so that limit checks see the real size.
    pub truncate: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { truncate: true }
    }
}

/// Converts a markdown body into an ordered block tree.
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, markdown: &str, options: ConvertOptions) -> Vec<Block>;
}

/// CommonMark converter backed by pulldown-cmark.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkConverter;

impl MarkdownConverter for CmarkConverter {
    fn convert(&self, markdown: &str, options: ConvertOptions) -> Vec<Block> {
        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_STRIKETHROUGH);
        opts.insert(Options::ENABLE_TASKLISTS);

        let mut builder = TreeBuilder::default();
        for event in Parser::new_ext(markdown, opts) {
            builder.handle(event);
        }
        let mut blocks = builder.finish();

        if options.truncate {
            blocks.truncate(MAX_TRUNCATED_BLOCKS);
            for block in blocks.iter_mut() {
                block.truncate_text(MAX_RICH_TEXT_CHARS);
            }
        }
        blocks
    }
}

/// Open container while walking the event stream.
enum Container {
    List {
        ordered: bool,
    },
    Item {
        ordered: bool,
        text: Option<Vec<RichText>>,
        checked: Option<bool>,
        children: Vec<Block>,
    },
    Quote {
        children: Vec<Block>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Block>,
    stack: Vec<Container>,
    segments: Vec<RichText>,
    images: Vec<String>,
    strong: usize,
    emphasis: usize,
    strike: usize,
    link: Option<String>,
    in_image: bool,
    heading: Option<HeadingLevel>,
    code: Option<(String, String)>,
}

impl TreeBuilder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => self.flush_inline(),
            Event::End(TagEnd::Paragraph) => self.flush_inline(),

            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_inline();
                self.heading = Some(match level {
                    MdHeading::H1 => HeadingLevel::One,
                    MdHeading::H2 => HeadingLevel::Two,
                    _ => HeadingLevel::Three,
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                let level = self.heading.take().unwrap_or(HeadingLevel::Three);
                let rich_text = std::mem::take(&mut self.segments);
                self.push_block(Block::new(BlockContent::Heading { level, rich_text }));
                self.flush_images();
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_inline();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or("").to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, mut text)) = self.code.take() {
                    if text.ends_with('\n') {
                        text.pop();
                    }
                    let language = if language.is_empty() {
                        "plain text".to_string()
                    } else {
                        language.to_lowercase()
                    };
                    self.push_block(Block::new(BlockContent::Code {
                        rich_text: vec![RichText::plain(text)],
                        language,
                    }));
                }
            }

            Event::Start(Tag::List(start)) => {
                self.flush_inline();
                self.stack.push(Container::List {
                    ordered: start.is_some(),
                });
            }
            Event::End(TagEnd::List(_)) => {
                self.flush_inline();
                self.stack.pop();
            }

            Event::Start(Tag::Item) => {
                let ordered = matches!(self.stack.last(), Some(Container::List { ordered: true }));
                self.stack.push(Container::Item {
                    ordered,
                    text: None,
                    checked: None,
                    children: Vec::new(),
                });
            }
            Event::TaskListMarker(done) => {
                if let Some(Container::Item { checked, .. }) = self.stack.last_mut() {
                    *checked = Some(done);
                }
            }
            Event::End(TagEnd::Item) => {
                self.flush_inline();
                if let Some(Container::Item {
                    ordered,
                    text,
                    checked,
                    children,
                }) = self.stack.pop()
                {
                    let rich_text = text.unwrap_or_default();
                    let content = match (checked, ordered) {
                        (Some(checked), _) => BlockContent::ToDo { rich_text, checked },
                        (None, true) => BlockContent::NumberedListItem { rich_text },
                        (None, false) => BlockContent::BulletedListItem { rich_text },
                    };
                    let mut block = Block::new(content);
                    if !children.is_empty() {
                        block = block.with_children(children);
                    }
                    self.push_block(block);
                }
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush_inline();
                self.stack.push(Container::Quote {
                    children: Vec::new(),
                });
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush_inline();
                if let Some(Container::Quote { mut children }) = self.stack.pop() {
                    let rich_text = match children.first() {
                        Some(Block {
                            content: BlockContent::Paragraph { .. },
                            ..
                        }) => match children.remove(0).content {
                            BlockContent::Paragraph { rich_text } => rich_text,
                            _ => Vec::new(),
                        },
                        _ => Vec::new(),
                    };
                    let mut block = Block::new(BlockContent::Quote { rich_text });
                    if !children.is_empty() {
                        block = block.with_children(children);
                    }
                    self.push_block(block);
                }
            }

            Event::Rule => {
                self.flush_inline();
                self.push_block(Block::new(BlockContent::Divider));
            }

            Event::Start(Tag::Strong) => self.strong += 1,
            Event::End(TagEnd::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::End(TagEnd::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => self.strike += 1,
            Event::End(TagEnd::Strikethrough) => self.strike = self.strike.saturating_sub(1),

            Event::Start(Tag::Link { dest_url, .. }) => self.link = Some(dest_url.to_string()),
            Event::End(TagEnd::Link) => self.link = None,

            Event::Start(Tag::Image { dest_url, .. }) => {
                if dest_url.starts_with("http://") || dest_url.starts_with("https://") {
                    self.images.push(dest_url.to_string());
                    self.in_image = true;
                }
            }
            Event::End(TagEnd::Image) => self.in_image = false,

            Event::Text(text) => {
                if let Some((_, code)) = self.code.as_mut() {
                    code.push_str(&text);
                } else if !self.in_image {
                    self.push_text(&text, false);
                }
            }
            Event::Code(text) => self.push_text(&text, true),
            Event::Html(html) | Event::InlineHtml(html) => {
                if let Some((_, code)) = self.code.as_mut() {
                    code.push_str(&html);
                } else {
                    self.push_text(html.trim_end_matches('\n'), false);
                }
            }
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),

            _ => {}
        }
    }

    fn annotations(&self, code: bool) -> Annotations {
        Annotations {
            bold: self.strong > 0,
            italic: self.emphasis > 0,
            strikethrough: self.strike > 0,
            code,
            ..Annotations::default()
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if text.is_empty() {
            return;
        }
        let annotations = self.annotations(code);
        let link = self.link.clone();

        if let Some(last) = self.segments.last_mut() {
            if last.annotations == annotations && last.href == link {
                last.text.content.push_str(text);
                last.plain_text.push_str(text);
                return;
            }
        }
        self.segments.push(RichText::styled(text, annotations, link));
    }

    /// Move collected inline text into the open list item, or emit it as a paragraph.
    fn flush_inline(&mut self) {
        if !self.segments.is_empty() {
            let segments = std::mem::take(&mut self.segments);
            match self.stack.last_mut() {
                Some(Container::Item { text: text @ None, .. }) => *text = Some(segments),
                _ => self.push_block(Block::new(BlockContent::Paragraph {
                    rich_text: segments,
                })),
            }
        }
        self.flush_images();
    }

    fn flush_images(&mut self) {
        for url in std::mem::take(&mut self.images) {
            self.push_block(Block::new(BlockContent::Image { url }));
        }
    }

    fn push_block(&mut self, block: Block) {
        for container in self.stack.iter_mut().rev() {
            match container {
                Container::Item { children, .. } | Container::Quote { children } => {
                    children.push(block);
                    return;
                }
                Container::List { .. } => continue,
            }
        }
        self.root.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_inline();
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(md: &str) -> Vec<Block> {
        CmarkConverter.convert(md, ConvertOptions { truncate: false })
    }

    fn text_of(block: &Block) -> String {
        block
            .content
            .rich_text()
            .unwrap_or_default()
            .iter()
            .map(|s| s.plain_text())
            .collect()
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let blocks = convert("# Title\n\nhello\nworld\n\n### Small\n\n###### Tiny\n");
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].content.type_name(), "heading_1");
        assert_eq!(text_of(&blocks[0]), "Title");
        assert_eq!(blocks[1].content.type_name(), "paragraph");
        assert_eq!(text_of(&blocks[1]), "hello world");
        assert_eq!(blocks[2].content.type_name(), "heading_3");
        assert_eq!(blocks[3].content.type_name(), "heading_3");
    }

    #[test]
    fn test_inline_styles_split_segments() {
        let blocks = convert("plain **bold** *it* `code` [link](https://x.y)");
        let segments = blocks[0].content.rich_text().unwrap();
        assert!(segments.iter().any(|s| s.annotations.bold && s.plain_text() == "bold"));
        assert!(segments.iter().any(|s| s.annotations.italic && s.plain_text() == "it"));
        assert!(segments.iter().any(|s| s.annotations.code && s.plain_text() == "code"));
        assert!(segments
            .iter()
            .any(|s| s.href.as_deref() == Some("https://x.y") && s.plain_text() == "link"));
    }

    #[test]
    fn test_nested_lists_become_children() {
        let blocks = convert("- a\n  - b\n    - c\n- d\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(text_of(&blocks[0]), "a");
        let b = &blocks[0].children().unwrap()[0];
        assert_eq!(text_of(b), "b");
        let c = &b.children().unwrap()[0];
        assert_eq!(text_of(c), "c");
        assert!(c.children().is_none());
        assert!(blocks[1].children().is_none());
    }

    #[test]
    fn test_ordered_and_task_items() {
        let blocks = convert("1. first\n2. second\n\n- [ ] open\n- [x] done\n");
        assert_eq!(blocks[0].content.type_name(), "numbered_list_item");
        assert_eq!(blocks[1].content.type_name(), "numbered_list_item");
        assert_eq!(
            blocks[2].content,
            BlockContent::ToDo {
                rich_text: vec![RichText::plain("open")],
                checked: false
            }
        );
        assert!(matches!(blocks[3].content, BlockContent::ToDo { checked: true, .. }));
    }

    #[test]
    fn test_code_quote_and_rule() {
        let blocks = convert("```Rust\nfn main() {}\n```\n\n> quoted\n\n---\n");
        assert_eq!(
            blocks[0].content,
            BlockContent::Code {
                rich_text: vec![RichText::plain("fn main() {}")],
                language: "rust".to_string()
            }
        );
        assert_eq!(blocks[1].content.type_name(), "quote");
        assert_eq!(text_of(&blocks[1]), "quoted");
        assert_eq!(blocks[2].content, BlockContent::Divider);
    }

    #[test]
    fn test_remote_images_become_blocks() {
        let blocks = convert("see ![alt](https://img.example/a.png)\n\n![local](attachments/b.png)");
        assert_eq!(text_of(&blocks[0]), "see ");
        assert_eq!(
            blocks[1].content,
            BlockContent::Image {
                url: "https://img.example/a.png".to_string()
            }
        );
        assert_eq!(blocks.len(), 3);
        assert_eq!(text_of(&blocks[2]), "local");
    }

    #[test]
    fn test_truncation_is_optional() {
        let md: String = (0..150).map(|i| format!("p{}\n\n", i)).collect();
        assert_eq!(convert(&md).len(), 150);
        let truncated = CmarkConverter.convert(&md, ConvertOptions::default());
        assert_eq!(truncated.len(), MAX_TRUNCATED_BLOCKS);
    }
}
