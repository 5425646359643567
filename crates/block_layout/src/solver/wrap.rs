//! Break placement for wrap blocks.
//!
//! Finding the cheapest wrap is an optimal line-breaking problem. The state
//! is *(child index, column the child starts at)*: once both are fixed, the
//! cost of everything after is fixed too, so
//!
//! ```text
//! best(i, c) = item(i, c) + min(
//!     separator + best(i + 1, end(i, c) + separator),   // continue the line
//!     break     + best(i + 1, wrap_column),             // start a new line
//! )
//! ```
//!
//! States are kept in a table local to one wrap evaluation, so each
//! (child, column) pair is solved once. Continuing is not allowed after a
//! breaking child. On equal cost the continued line wins.
//!
//! A child that opens a line is preceded by the wrap's prefix, if any, and
//! sees a line-start context. The state therefore also records whether the
//! child opens a line.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use super::{Solver, WrapStrategy};
use crate::block::BlockId;
use crate::cost::CostPolicy;
use crate::error::LayoutError;
use crate::layout::{Context, Layout};
use crate::recursion::ensure_sufficient_stack;
use crate::width::TextWidth;

/// Fixed parameters of one wrap evaluation.
struct WrapFrame<'b> {
    children: &'b [BlockId],
    separator: usize,
    break_mult: f64,
    prefix: Option<BlockId>,
    /// Column every wrapped line starts at.
    column: usize,
    margin: usize,
    /// Whether the wrap itself starts a line.
    line_start: bool,
}

impl WrapFrame<'_> {
    /// Context for a child starting at `column`.
    ///
    /// Lines broken inside a child align with the wrap, not the outer
    /// indentation.
    fn child_ctx(&self, column: usize, line_start: bool) -> Context {
        Context {
            start_column: column,
            margin: self.margin,
            indent_base: self.column,
            line_start,
        }
    }

    /// Check if the child at `index` would start a line of the output.
    fn starts_line(&self, index: usize, opens_line: bool) -> bool {
        if index == 0 {
            self.line_start
        } else {
            opens_line
        }
    }
}

/// Solved suffixes keyed by (child index, column, child opens a wrapped line).
type WrapTable = FxHashMap<(usize, usize, bool), Layout>;

impl<W, C> Solver<'_, W, C>
where
    W: TextWidth + ?Sized,
    C: CostPolicy + ?Sized,
{
    pub(super) fn wrap(
        &mut self,
        children: &[BlockId],
        separator: usize,
        break_mult: f64,
        prefix: Option<BlockId>,
        ctx: Context,
    ) -> Result<Layout, LayoutError> {
        let frame = WrapFrame {
            children,
            separator,
            break_mult,
            prefix,
            column: ctx.start_column,
            margin: ctx.margin,
            line_start: ctx.at_line_start(),
        };

        let layout = match self.wrap_strategy {
            WrapStrategy::Optimal => {
                let mut table = WrapTable::default();
                self.wrap_suffix(&frame, 0, frame.column, true, &mut table)?
            }
            WrapStrategy::Greedy => self.wrap_greedy(&frame)?,
        };

        tracing::trace!(
            children = children.len(),
            lines = layout.height,
            cost = layout.cost.value(),
            "wrap resolved",
        );
        Ok(layout)
    }

    /// Cheapest layout of children `index..` with `children[index]` at `column`.
    ///
    /// `opens_line` is set for the first child and for every child placed
    /// right after a wrap break.
    fn wrap_suffix(
        &mut self,
        frame: &WrapFrame<'_>,
        index: usize,
        column: usize,
        opens_line: bool,
        table: &mut WrapTable,
    ) -> Result<Layout, LayoutError> {
        let key = (index, column, opens_line);
        if let Some(solved) = table.get(&key) {
            return Ok(solved.clone());
        }

        let child = frame.children[index];
        let item = self.wrap_item(frame, index, column, opens_line)?;

        let best = if index + 1 == frame.children.len() {
            item
        } else {
            let end = item.end_column(column);
            let remaining = frame.children.len() - index - 1;

            let continued = if self.arena.is_breaking(child) {
                None
            } else {
                let next = end + frame.separator;
                let rest = ensure_sufficient_stack(|| {
                    self.wrap_suffix(frame, index + 1, next, false, table)
                })?;
                let gap = self.gap(end, frame.separator, frame.margin);
                Some(Layout::concat([item.clone(), gap, rest]))
            };

            let rest = ensure_sufficient_stack(|| {
                self.wrap_suffix(frame, index + 1, frame.column, true, table)
            })?;
            let broken = Layout::concat([item, self.wrap_break(frame, remaining), rest]);

            match continued {
                Some(continued)
                    if self.cost.tie_break().order(&broken, &continued) != Ordering::Less =>
                {
                    continued
                }
                _ => broken,
            }
        };

        table.insert(key, best.clone());
        Ok(best)
    }

    /// Child `index` at `column`, behind the prefix when it opens a line.
    fn wrap_item(
        &mut self,
        frame: &WrapFrame<'_>,
        index: usize,
        column: usize,
        opens_line: bool,
    ) -> Result<Layout, LayoutError> {
        let child = frame.children[index];
        let line_start = frame.starts_line(index, opens_line);
        match frame.prefix {
            Some(prefix) if opens_line => {
                let lead = self.eval(prefix, frame.child_ctx(column, line_start))?;
                let after = lead.end_column(column);
                let item = self.eval(child, frame.child_ctx(after, false))?;
                Ok(lead.join(item))
            }
            _ => self.eval(child, frame.child_ctx(column, line_start)),
        }
    }

    /// Left-to-right fill: continue while the next child's first line fits.
    fn wrap_greedy(&mut self, frame: &WrapFrame<'_>) -> Result<Layout, LayoutError> {
        let mut parts = Vec::with_capacity(frame.children.len() * 2);
        let mut column = frame.column;

        for (i, &child) in frame.children.iter().enumerate() {
            if i > 0 {
                if !self.arena.is_breaking(frame.children[i - 1]) {
                    let next = column + frame.separator;
                    let candidate = self.eval(child, frame.child_ctx(next, false))?;
                    if next + candidate.first_line_width <= frame.margin {
                        parts.push(self.gap(column, frame.separator, frame.margin));
                        column = candidate.end_column(next);
                        parts.push(candidate);
                        continue;
                    }
                }
                parts.push(self.wrap_break(frame, frame.children.len() - i));
                column = frame.column;
            }
            let layout = self.wrap_item(frame, i, column, true)?;
            column = layout.end_column(column);
            parts.push(layout);
        }

        Ok(Layout::concat(parts))
    }

    /// A break inside the wrap with `remaining` children after it.
    fn wrap_break(&self, frame: &WrapFrame<'_>, remaining: usize) -> Layout {
        let cost = self
            .cost
            .wrap_break(frame.break_mult, frame.column, remaining)
            + self.cost.span(0, frame.column, frame.margin);
        Layout::newline(frame.column, cost)
    }
}
