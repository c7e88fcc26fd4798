//! Structural limits of a single page submission.
//!
//! The remote API rejects requests whose children nest more than two levels
//! deep or carry more than a hundred blocks. Depth is a hard error; size is
//! worked around by creating the page with a head and appending the rest.

use tracing::debug;

use notionsync_common::{Error, Result};
use notionsync_notion::block::BLOCK_OBJECT;
use notionsync_notion::Block;

/// Deepest child nesting accepted in one request.
pub const MAX_NESTING_DEPTH: usize = 2;
/// Top-level blocks sent per create or append request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 99;

/// Size of a content tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Blocks at any depth.
    pub block_count: usize,
    /// Deepest chain of entered child sequences. A flat tree has depth 0.
    pub max_depth: usize,
}

impl Limits {
    /// Whether the tree has to be split across several requests.
    pub fn needs_split(&self) -> bool {
        self.block_count > MAX_BLOCKS_PER_REQUEST
    }
}

/// Walk the tree depth-first and count blocks and nesting.
///
/// Entering a child sequence adds one level even when the sequence is empty.
pub fn measure(nodes: &[Block]) -> Limits {
    let mut limits = Limits::default();
    walk(nodes, 0, &mut limits);
    limits
}

fn walk(nodes: &[Block], depth: usize, limits: &mut Limits) {
    for node in nodes {
        if node.object() == BLOCK_OBJECT {
            limits.block_count += 1;
        }
        if let Some(children) = node.children() {
            let child_depth = depth + 1;
            limits.max_depth = limits.max_depth.max(child_depth);
            walk(children, child_depth, limits);
        }
    }
}

/// Measure and reject trees nested too deeply to submit.
///
/// # Errors
/// - `Error::StructuralLimitExceeded` when the depth is above [`MAX_NESTING_DEPTH`]
pub fn validate(nodes: &[Block]) -> Result<Limits> {
    let limits = measure(nodes);
    debug!(
        "Content tree has {} blocks, max depth {}",
        limits.block_count, limits.max_depth
    );

    if limits.max_depth > MAX_NESTING_DEPTH {
        return Err(Error::StructuralLimitExceeded {
            depth: limits.max_depth,
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(limits)
}

/// Split top-level nodes into the part sent with the create call and the
/// overflow appended afterwards.
pub fn split_for_submission(mut nodes: Vec<Block>) -> (Vec<Block>, Vec<Block>) {
    if nodes.len() <= MAX_BLOCKS_PER_REQUEST {
        return (nodes, Vec::new());
    }
    let tail = nodes.split_off(MAX_BLOCKS_PER_REQUEST);
    (nodes, tail)
}

/// Consecutive append batches of the overflow.
pub fn overflow_chunks(tail: &[Block]) -> std::slice::Chunks<'_, Block> {
    tail.chunks(MAX_BLOCKS_PER_REQUEST)
}
