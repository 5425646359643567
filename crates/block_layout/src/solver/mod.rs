//! Layout Solver
//!
//! Recursive evaluator choosing the cheapest layout of a block tree.
//!
//! # Algorithm
//!
//! `eval(block, context)` dispatches on the block variant:
//!
//! 1. **Text / Verbatim**: measure once, charge span costs
//! 2. **Line**: children at the running column, separators or mandatory
//!    breaks between them
//! 3. **Stack**: every child at the indentation column, a break before the
//!    stack when it does not start a line
//! 4. **Wrap**: dynamic program over (child, column), see [`wrap`]
//! 5. **Choice**: every option under the same context, cheapest wins
//! 6. **Indent / MarginOverride**: adjust the context, pass the child through
//!
//! # Memoization
//!
//! A block reachable from several parents, or reached again by the wrap
//! search, is evaluated under the same context many times; each ancestor
//! choice multiplies the contexts its descendants see. Results are cached by
//! `(BlockId, Context)`. The table is cleared at the start of every
//! top-level [`Solver::evaluate`], so two calls never share entries.

mod wrap;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::block::{Block, BlockArena, BlockId, DEFAULT_BREAK_MULT};
use crate::cost::{Cost, CostPolicy};
use crate::error::{LayoutError, WidthError};
use crate::layout::{Context, Layout};
use crate::recursion::ensure_sufficient_stack;
use crate::width::TextWidth;

/// How wrap blocks pick their break points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapStrategy {
    /// Minimum total cost over all break assignments (default).
    #[default]
    Optimal,

    /// Fill each line while the next child's first line fits the margin.
    ///
    /// Only equivalent to `Optimal` when line breaks are close to free.
    Greedy,
}

/// Counters from the last top-level evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Block evaluations actually computed.
    pub evaluations: usize,

    /// Evaluations answered from the memo table.
    pub memo_hits: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct MemoKey {
    block: BlockId,
    ctx: Context,
}

/// Cost-minimizing layout solver for one block arena.
///
/// Each solver owns its memo table; run independent solvers on separate
/// threads to lay out several roots in parallel.
pub struct Solver<'a, W: TextWidth + ?Sized, C: CostPolicy + ?Sized> {
    arena: &'a BlockArena,
    width: &'a W,
    cost: &'a C,
    memoize: bool,
    wrap_strategy: WrapStrategy,
    memo: FxHashMap<MemoKey, Layout>,
    text_widths: FxHashMap<BlockId, usize>,
    verbatim_widths: FxHashMap<BlockId, Rc<[usize]>>,
    stats: SolverStats,
}

impl<'a, W, C> Solver<'a, W, C>
where
    W: TextWidth + ?Sized,
    C: CostPolicy + ?Sized,
{
    /// Create a solver measuring text with `width` and scoring with `cost`.
    pub fn new(arena: &'a BlockArena, width: &'a W, cost: &'a C) -> Self {
        Self {
            arena,
            width,
            cost,
            memoize: true,
            wrap_strategy: WrapStrategy::default(),
            memo: FxHashMap::default(),
            text_widths: FxHashMap::default(),
            verbatim_widths: FxHashMap::default(),
            stats: SolverStats::default(),
        }
    }

    /// Disable the memo table. Results are identical, only slower.
    #[must_use]
    pub fn without_memo(self) -> Self {
        Self {
            memoize: false,
            ..self
        }
    }

    /// Use `strategy` for wrap blocks.
    #[must_use]
    pub fn with_wrap_strategy(self, strategy: WrapStrategy) -> Self {
        Self {
            wrap_strategy: strategy,
            ..self
        }
    }

    /// Counters from the last [`Solver::evaluate`].
    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Find the cheapest layout of `root` in `ctx`.
    ///
    /// Fails only when the width function fails, the cost policy rejects its
    /// configuration, or `root` is not in the arena. Content that cannot fit
    /// the margin still yields a layout, with overflow cost.
    pub fn evaluate(&mut self, root: BlockId, ctx: Context) -> Result<Layout, LayoutError> {
        if !self.arena.contains(root) {
            return Err(LayoutError::UnknownRoot(root));
        }
        self.cost.validate()?;

        self.memo.clear();
        self.text_widths.clear();
        self.verbatim_widths.clear();
        self.stats = SolverStats::default();

        let layout = self.eval(root, ctx)?;

        tracing::debug!(
            root = root.raw(),
            margin = ctx.margin,
            evaluations = self.stats.evaluations,
            memo_hits = self.stats.memo_hits,
            height = layout.height,
            cost = layout.cost.value(),
            "layout solved",
        );

        Ok(layout)
    }

    fn eval(&mut self, id: BlockId, ctx: Context) -> Result<Layout, LayoutError> {
        let key = MemoKey { block: id, ctx };
        if self.memoize {
            if let Some(hit) = self.memo.get(&key) {
                self.stats.memo_hits += 1;
                return Ok(hit.clone());
            }
        }

        let layout = ensure_sufficient_stack(|| self.compute(id, ctx))?;
        self.stats.evaluations += 1;

        if self.memoize {
            self.memo.insert(key, layout.clone());
        }
        Ok(layout)
    }

    fn compute(&mut self, id: BlockId, ctx: Context) -> Result<Layout, LayoutError> {
        let arena = self.arena;
        match arena.get(id) {
            Block::Text(content) => self.text(id, content, ctx),
            Block::Verbatim(lines) => self.verbatim(id, lines, ctx),
            Block::Line {
                children,
                separator,
            } => self.line(arena.children(*children), *separator, ctx),
            Block::Stack {
                children,
                break_mult,
            } => self.stack(arena.children(*children), *break_mult, ctx),
            Block::Wrap {
                children,
                separator,
                break_mult,
                prefix,
            } => self.wrap(
                arena.children(*children),
                *separator,
                *break_mult,
                *prefix,
                ctx,
            ),
            Block::Choice { options } => self.choice(arena.children(*options), ctx),
            Block::Indent { child, amount } => self.indent(*child, *amount, ctx),
            Block::MarginOverride { child, margin } => self.eval(*child, ctx.with_margin(*margin)),
        }
    }

    fn text(&mut self, id: BlockId, content: &str, ctx: Context) -> Result<Layout, LayoutError> {
        let width = match self.text_widths.get(&id) {
            Some(&width) => width,
            None => {
                let width = self.width.width(content)?;
                self.text_widths.insert(id, width);
                width
            }
        };
        let end = ctx.start_column + width;
        let cost = self.cost.span(ctx.start_column, end, ctx.margin);
        Ok(Layout::text(id, width, cost))
    }

    fn verbatim(
        &mut self,
        id: BlockId,
        lines: &[Box<str>],
        ctx: Context,
    ) -> Result<Layout, LayoutError> {
        let widths = match self.verbatim_widths.get(&id) {
            Some(widths) => Rc::clone(widths),
            None => {
                let widths = lines
                    .iter()
                    .map(|line| self.width.width(line))
                    .collect::<Result<Rc<[usize]>, WidthError>>()?;
                self.verbatim_widths.insert(id, Rc::clone(&widths));
                widths
            }
        };

        // Built verbatim blocks always hold a line.
        let Some((&first, rest)) = widths.split_first() else {
            return Ok(Layout::space(0, Cost::ZERO));
        };
        let mut cost = self
            .cost
            .span(ctx.start_column, ctx.start_column + first, ctx.margin);
        for &width in rest {
            cost += self.cost.span(0, width, ctx.margin);
        }
        Ok(Layout::verbatim(id, &widths, cost))
    }

    fn line(
        &mut self,
        children: &[BlockId],
        separator: usize,
        ctx: Context,
    ) -> Result<Layout, LayoutError> {
        let mut parts = Vec::with_capacity(children.len() * 2);
        let mut column = ctx.start_column;

        for (i, &child) in children.iter().enumerate() {
            let child_ctx = if i == 0 {
                ctx
            } else if self.arena.is_breaking(children[i - 1]) {
                parts.push(self.break_to(ctx.indent_base, DEFAULT_BREAK_MULT, ctx.margin));
                column = ctx.indent_base;
                ctx.next_line()
            } else {
                parts.push(self.gap(column, separator, ctx.margin));
                column += separator;
                ctx.at_column(column)
            };
            let layout = self.eval(child, child_ctx)?;
            column = layout.end_column(column);
            parts.push(layout);
        }

        Ok(Layout::concat(parts))
    }

    fn stack(
        &mut self,
        children: &[BlockId],
        break_mult: f64,
        ctx: Context,
    ) -> Result<Layout, LayoutError> {
        let row = ctx.next_line();
        let mut parts = Vec::with_capacity(children.len() * 2 + 1);

        if !ctx.at_line_start() {
            parts.push(self.break_to(ctx.indent_base, break_mult, ctx.margin));
        }
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                parts.push(self.break_to(ctx.indent_base, break_mult, ctx.margin));
            }
            parts.push(self.eval(child, row)?);
        }

        Ok(Layout::concat(parts))
    }

    fn choice(&mut self, options: &[BlockId], ctx: Context) -> Result<Layout, LayoutError> {
        // Built choices always hold an option.
        let Some((&first, rest)) = options.split_first() else {
            return Ok(Layout::space(0, Cost::ZERO));
        };
        let tie_break = self.cost.tie_break();
        let mut best = self.eval(first, ctx)?;
        let mut best_index = 0;

        for (index, &option) in rest.iter().enumerate() {
            let layout = self.eval(option, ctx)?;
            if tie_break.order(&layout, &best) == Ordering::Less {
                best = layout;
                best_index = index + 1;
            }
        }

        tracing::trace!(
            options = options.len(),
            chosen = best_index,
            cost = best.cost.value(),
            "choice resolved",
        );
        Ok(best)
    }

    fn indent(&mut self, child: BlockId, amount: usize, ctx: Context) -> Result<Layout, LayoutError> {
        let inner = ctx.indented(amount);
        let layout = self.eval(child, inner)?;
        if ctx.at_line_start() && amount > 0 {
            let cost = self
                .cost
                .span(ctx.start_column, inner.start_column, ctx.margin);
            Ok(Layout::space(amount, cost).join(layout))
        } else {
            Ok(layout)
        }
    }

    /// Blank columns between two children on one line.
    fn gap(&self, column: usize, separator: usize, margin: usize) -> Layout {
        Layout::space(separator, self.cost.span(column, column + separator, margin))
    }

    /// A line break to `column`, charged for the break and the padding.
    fn break_to(&self, column: usize, break_mult: f64, margin: usize) -> Layout {
        let cost = self.cost.line_break(break_mult, column) + self.cost.span(0, column, margin);
        Layout::newline(column, cost)
    }
}
