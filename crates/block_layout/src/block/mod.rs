//! Block Tree
//!
//! The immutable document description the solver lays out.
//!
//! # Storage
//!
//! Blocks are allocated in a [`BlockArena`] and addressed by [`BlockId`]
//! handles. Sharing a sub-tree means passing the same id to several parents;
//! the id is the block's identity, which is what the solver memoizes on.
//!
//! Constructors only accept ids already present in the arena, so a child's
//! id is always smaller than its parent's and the tree cannot contain a
//! cycle.
//!
//! # Variants
//!
//! | Block | Arrangement |
//! |-------|-------------|
//! | `Text` | one unbroken run of text |
//! | `Verbatim` | pre-formatted lines, printed as given |
//! | `Line` | children side by side |
//! | `Stack` | children on successive lines |
//! | `Wrap` | children flowed, breaking where cheapest |
//! | `Choice` | cheapest of several alternatives |
//! | `Indent` | child with shifted line starts |
//! | `MarginOverride` | child laid out against another margin |

mod combinators;

use std::fmt;

use crate::error::BlockError;

/// Index into a [`BlockArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// Range of child ids in the arena's flattened child list.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BlockRange {
    pub start: u32,
    pub len: u32,
}

impl BlockRange {
    /// Number of children in the range.
    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Check if the range is empty. Never true for ranges the arena built.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// One node of the block tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// A single unbroken line of text.
    Text(Box<str>),

    /// Pre-formatted lines. The first continues at the current column, the
    /// rest start at column 0.
    Verbatim(Box<[Box<str>]>),

    /// Children on one line, `separator` blank columns apart.
    Line {
        children: BlockRange,
        separator: usize,
    },

    /// Children on successive lines at the stack's indentation.
    Stack {
        children: BlockRange,
        break_mult: f64,
    },

    /// Children flowed left to right with optimal break placement.
    ///
    /// `prefix`, when set, is written at the start of every wrapped line,
    /// the first included.
    Wrap {
        children: BlockRange,
        separator: usize,
        break_mult: f64,
        prefix: Option<BlockId>,
    },

    /// Interchangeable renderings of the same content.
    Choice { options: BlockRange },

    /// Child whose line starts are shifted right by `amount`.
    Indent { child: BlockId, amount: usize },

    /// Child laid out against `margin` instead of the inherited one.
    MarginOverride { child: BlockId, margin: usize },
}

impl Block {
    /// Short lowercase name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Text(_) => "text",
            Block::Verbatim(_) => "verbatim",
            Block::Line { .. } => "line",
            Block::Stack { .. } => "stack",
            Block::Wrap { .. } => "wrap",
            Block::Choice { .. } => "choice",
            Block::Indent { .. } => "indent",
            Block::MarginOverride { .. } => "margin override",
        }
    }
}

/// Default multiplier for the cost of a stack's or wrap's line breaks.
pub const DEFAULT_BREAK_MULT: f64 = 1.0;

/// Append-only storage for a block tree.
///
/// The arena is plain data: once built it can be shared by reference
/// between threads, each solving its own roots.
#[derive(Clone, Debug, Default)]
pub struct BlockArena {
    blocks: Vec<Block>,
    /// Whether a line break is mandatory after the block, parallel to `blocks`.
    breaking: Vec<bool>,
    children: Vec<BlockId>,
}

impl BlockArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity for `blocks` nodes.
    pub fn with_capacity(blocks: usize) -> Self {
        Self {
            blocks: Vec::with_capacity(blocks),
            breaking: Vec::with_capacity(blocks),
            children: Vec::with_capacity(blocks),
        }
    }

    /// Number of blocks allocated so far.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if no block has been allocated.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check if `id` was allocated by this arena.
    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        id.index() < self.blocks.len()
    }

    /// Get a block by id.
    ///
    /// The id must come from this arena.
    #[inline]
    pub fn get(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Get the children addressed by a range.
    #[inline]
    pub fn children(&self, range: BlockRange) -> &[BlockId] {
        let start = range.start as usize;
        &self.children[start..start + range.len()]
    }

    /// Check if a line break is mandatory after the block.
    #[inline]
    pub fn is_breaking(&self, id: BlockId) -> bool {
        self.breaking[id.index()]
    }

    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    /// Allocate a text block.
    pub fn text(&mut self, content: impl Into<String>) -> Result<BlockId, BlockError> {
        self.text_block(content.into(), false)
    }

    /// Allocate a text block after which a line break is mandatory, such as
    /// a line comment.
    pub fn breaking_text(&mut self, content: impl Into<String>) -> Result<BlockId, BlockError> {
        self.text_block(content.into(), true)
    }

    fn text_block(&mut self, content: String, breaking: bool) -> Result<BlockId, BlockError> {
        if content.contains('\n') {
            return Err(BlockError::MultilineText { content });
        }
        self.push(Block::Text(content.into_boxed_str()), breaking)
    }

    /// Allocate a verbatim block printing `lines` exactly as given.
    ///
    /// Every line after the first starts at column 0, ignoring the current
    /// indentation.
    pub fn verbatim<I, S>(&mut self, lines: I, breaking: bool) -> Result<BlockId, BlockError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected = Vec::new();
        for line in lines {
            let line = line.into();
            if line.contains('\n') {
                return Err(BlockError::MultilineText { content: line });
            }
            collected.push(line.into_boxed_str());
        }
        if collected.is_empty() {
            return Err(BlockError::EmptyComposite { kind: "verbatim" });
        }
        self.push(Block::Verbatim(collected.into_boxed_slice()), breaking)
    }

    // ------------------------------------------------------------------
    // Composites
    // ------------------------------------------------------------------

    /// Allocate a line block.
    pub fn line(&mut self, children: &[BlockId], separator: usize) -> Result<BlockId, BlockError> {
        let range = self.alloc_children(children, "line")?;
        let breaking = self.last_breaking(children);
        self.push(
            Block::Line {
                children: range,
                separator,
            },
            breaking,
        )
    }

    /// Allocate a stack block with the default break multiplier.
    pub fn stack(&mut self, children: &[BlockId]) -> Result<BlockId, BlockError> {
        self.stack_with_break_mult(children, DEFAULT_BREAK_MULT)
    }

    /// Allocate a stack block whose line breaks cost `break_mult` times the
    /// normal surcharge.
    pub fn stack_with_break_mult(
        &mut self,
        children: &[BlockId],
        break_mult: f64,
    ) -> Result<BlockId, BlockError> {
        check_break_mult(break_mult)?;
        let range = self.alloc_children(children, "stack")?;
        let breaking = self.last_breaking(children);
        self.push(
            Block::Stack {
                children: range,
                break_mult,
            },
            breaking,
        )
    }

    /// Allocate a wrap block with the default break multiplier.
    pub fn wrap(&mut self, children: &[BlockId], separator: usize) -> Result<BlockId, BlockError> {
        self.wrap_with_break_mult(children, separator, DEFAULT_BREAK_MULT)
    }

    /// Allocate a wrap block whose line breaks cost `break_mult` times the
    /// normal surcharge.
    pub fn wrap_with_break_mult(
        &mut self,
        children: &[BlockId],
        separator: usize,
        break_mult: f64,
    ) -> Result<BlockId, BlockError> {
        self.wrap_block(children, separator, break_mult, None)
    }

    /// Allocate a wrap block repeating `prefix` at the start of every line,
    /// as in a reflowed `# ` comment.
    pub fn wrap_with_prefix(
        &mut self,
        children: &[BlockId],
        separator: usize,
        prefix: BlockId,
    ) -> Result<BlockId, BlockError> {
        self.check_known(prefix)?;
        self.wrap_block(children, separator, DEFAULT_BREAK_MULT, Some(prefix))
    }

    fn wrap_block(
        &mut self,
        children: &[BlockId],
        separator: usize,
        break_mult: f64,
        prefix: Option<BlockId>,
    ) -> Result<BlockId, BlockError> {
        check_break_mult(break_mult)?;
        let range = self.alloc_children(children, "wrap")?;
        let breaking = self.last_breaking(children);
        self.push(
            Block::Wrap {
                children: range,
                separator,
                break_mult,
                prefix,
            },
            breaking,
        )
    }

    /// Allocate a choice between `options`.
    ///
    /// A single option is returned as-is: a one-way choice is the option.
    pub fn choice(&mut self, options: &[BlockId]) -> Result<BlockId, BlockError> {
        match options {
            [] => Err(BlockError::EmptyChoice),
            [only] => {
                self.check_known(*only)?;
                Ok(*only)
            }
            _ => {
                let range = self.alloc_children(options, "choice")?;
                let breaking = options.iter().any(|&option| self.is_breaking(option));
                self.push(Block::Choice { options: range }, breaking)
            }
        }
    }

    /// Allocate an indent block.
    pub fn indent(&mut self, child: BlockId, amount: usize) -> Result<BlockId, BlockError> {
        self.check_known(child)?;
        let breaking = self.is_breaking(child);
        self.push(Block::Indent { child, amount }, breaking)
    }

    /// Allocate a block laying `child` out against `margin`.
    pub fn with_margin(&mut self, child: BlockId, margin: usize) -> Result<BlockId, BlockError> {
        self.check_known(child)?;
        let breaking = self.is_breaking(child);
        self.push(Block::MarginOverride { child, margin }, breaking)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_known(&self, id: BlockId) -> Result<(), BlockError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(BlockError::UnknownBlock(id))
        }
    }

    fn last_breaking(&self, children: &[BlockId]) -> bool {
        children.last().is_some_and(|&last| self.is_breaking(last))
    }

    fn alloc_children(
        &mut self,
        children: &[BlockId],
        kind: &'static str,
    ) -> Result<BlockRange, BlockError> {
        if children.is_empty() {
            return Err(BlockError::EmptyComposite { kind });
        }
        for &child in children {
            self.check_known(child)?;
        }
        let overflow = || BlockError::ArenaFull {
            count: self.children.len(),
        };
        let start = u32::try_from(self.children.len()).map_err(|_| overflow())?;
        let len = u32::try_from(children.len()).map_err(|_| overflow())?;
        start.checked_add(len).ok_or_else(overflow)?;
        self.children.extend_from_slice(children);
        Ok(BlockRange { start, len })
    }

    fn push(&mut self, block: Block, breaking: bool) -> Result<BlockId, BlockError> {
        let raw = u32::try_from(self.blocks.len()).map_err(|_| BlockError::ArenaFull {
            count: self.blocks.len(),
        })?;
        self.blocks.push(block);
        self.breaking.push(breaking);
        Ok(BlockId(raw))
    }
}

fn check_break_mult(value: f64) -> Result<(), BlockError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BlockError::InvalidBreakMult { value })
    }
}
