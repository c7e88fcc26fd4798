//! Notion API layer for notionsync.
//!
//! This module provides the typed content model submitted to the remote API,
//! a trait-based interface over the API itself, and the markdown converter
//! that produces content trees from document bodies.
//!
//! # Design Principles
//! - Transport isolation: the sync engine only sees [`NotionApi`]
//! - Typed payloads: blocks and properties serialize to the wire format directly
//! - No hidden retries: every failure surfaces to the caller

pub mod api;
pub mod block;
pub mod client;
pub mod markdown;
pub mod memory;
pub mod page;

pub use api::NotionApi;
pub use block::{Annotations, Block, BlockContent, HeadingLevel, RichText};
pub use client::{HttpNotionClient, NOTION_API_BASE, NOTION_VERSION};
pub use markdown::{CmarkConverter, ConvertOptions, MarkdownConverter};
pub use memory::{ApiCall, MemoryNotion};
pub use page::{
    CreatePageRequest, DatabaseInfo, ExternalFile, Page, PageProperty, PropertyValue,
    SelectOption, TAGS_PROPERTY, TITLE_PROPERTY,
};
