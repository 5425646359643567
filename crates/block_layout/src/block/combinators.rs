//! Composite constructors built from the core block variants.
//!
//! These cover the arrangements front ends reach for most often: delimited
//! lists, "inline or indented" bodies, and wrapping long runs of items.
//! None of them adds a new variant; the solver only ever sees core blocks.

use super::{BlockArena, BlockId};
use crate::error::BlockError;

impl BlockArena {
    /// Join `items` on one line with `joiner` after every item but the last.
    ///
    /// No joiner follows a breaking item, since the next item starts a new
    /// line anyway. The joiner text block is allocated once and shared.
    pub fn joined_line(&mut self, items: &[BlockId], joiner: &str) -> Result<BlockId, BlockError> {
        let Some((&last, init)) = items.split_last() else {
            return Err(BlockError::EmptyComposite { kind: "joined line" });
        };
        if init.is_empty() {
            return Ok(last);
        }
        let joiner = if joiner.is_empty() {
            None
        } else {
            Some(self.text(joiner)?)
        };

        let mut children = Vec::with_capacity(items.len() * 2);
        for &item in init {
            children.push(item);
            if let Some(joiner) = joiner {
                if !self.is_breaking(item) {
                    children.push(joiner);
                }
            }
        }
        children.push(last);
        self.line(&children, 0)
    }

    /// Stack `items`, each but the last followed by `joiner` on its own line.
    pub fn joined_stack(&mut self, items: &[BlockId], joiner: &str) -> Result<BlockId, BlockError> {
        let Some((&last, init)) = items.split_last() else {
            return Err(BlockError::EmptyComposite {
                kind: "joined stack",
            });
        };
        let joiner = self.text(joiner)?;
        let mut rows = Vec::with_capacity(items.len());
        for &item in init {
            rows.push(self.line(&[item, joiner], 0)?);
        }
        rows.push(last);
        self.stack(&rows)
    }

    /// Place `content` between an optional `prefix` and `suffix`, either
    /// stacked with the content indented by `amount` or all on one line.
    pub fn optionally_indented(
        &mut self,
        prefix: Option<BlockId>,
        content: BlockId,
        suffix: Option<BlockId>,
        amount: usize,
    ) -> Result<BlockId, BlockError> {
        let inline: Vec<BlockId> = prefix
            .into_iter()
            .chain(Some(content))
            .chain(suffix)
            .collect();
        let inline = self.line(&inline, 0)?;

        let indented = self.indent(content, amount)?;
        let stacked: Vec<BlockId> = prefix
            .into_iter()
            .chain(Some(indented))
            .chain(suffix)
            .collect();
        let stacked = self.stack(&stacked)?;

        self.choice(&[stacked, inline])
    }

    /// Wrap `items` when there are at least `min_items` of them; shorter runs
    /// stay on a single line.
    pub fn wrap_if_long(
        &mut self,
        items: &[BlockId],
        separator: usize,
        min_items: usize,
    ) -> Result<BlockId, BlockError> {
        if items.len() >= min_items {
            self.wrap(items, separator)
        } else {
            self.line(items, separator)
        }
    }
}
