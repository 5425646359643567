//! Layout Geometry
//!
//! [`Context`] flows top-down into every evaluation; [`Layout`] flows back up.
//!
//! # Geometry
//!
//! A layout records only what a parent needs to place things around it:
//!
//! - `first_line_width`: columns written on the starting line, counted from
//!   the context's start column
//! - `last_line_width`: the same as `first_line_width` for a one-line
//!   layout, otherwise the absolute column where the final line ends
//! - `height`: number of lines, at least one
//!
//! # Deferred Text
//!
//! The text itself is kept as a [`Plan`]: a tree of references to arena
//! blocks, whitespace runs and line breaks, shared through `Rc`. Losing
//! choice options never allocate strings; only the winner at the root is
//! realized by the renderer.


use std::rc::Rc;

use smallvec::{smallvec, SmallVec};

use crate::block::BlockId;
use crate::cost::Cost;

/// Position and budget for evaluating one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    /// Column of the next character if no break occurs.
    pub start_column: usize,

    /// Page width budget.
    pub margin: usize,

    /// Column new lines start at.
    pub indent_base: usize,

    /// Nothing has been written on the current line yet.
    pub line_start: bool,
}

impl Context {
    /// Context for a root block at column 0.
    #[inline]
    pub const fn new(margin: usize) -> Self {
        Context {
            start_column: 0,
            margin,
            indent_base: 0,
            line_start: true,
        }
    }

    /// Check if nothing has been written on the current line yet.
    #[inline]
    pub const fn at_line_start(self) -> bool {
        self.line_start
    }

    /// Same context, continuing mid-line at `column`.
    #[inline]
    #[must_use = "at_column returns a new Context"]
    pub const fn at_column(self, column: usize) -> Self {
        Context {
            start_column: column,
            line_start: false,
            ..self
        }
    }

    /// Context for the first column of a fresh line.
    #[inline]
    #[must_use = "next_line returns a new Context"]
    pub const fn next_line(self) -> Self {
        Context {
            start_column: self.indent_base,
            line_start: true,
            ..self
        }
    }

    /// Shift future line starts right by `amount`.
    ///
    /// The current column moves too when nothing has been written on the
    /// line yet; mid-line, only later lines are affected.
    #[inline]
    #[must_use = "indented returns a new Context"]
    pub const fn indented(self, amount: usize) -> Self {
        let start_column = if self.line_start {
            self.start_column + amount
        } else {
            self.start_column
        };
        Context {
            start_column,
            indent_base: self.indent_base + amount,
            ..self
        }
    }

    /// Same context with new lines starting at `indent_base`.
    #[inline]
    #[must_use = "with_indent_base returns a new Context"]
    pub const fn with_indent_base(self, indent_base: usize) -> Self {
        Context {
            indent_base,
            ..self
        }
    }

    /// Same context against another margin.
    #[inline]
    #[must_use = "with_margin returns a new Context"]
    pub const fn with_margin(self, margin: usize) -> Self {
        Context { margin, ..self }
    }
}

/// Deferred text of a layout.
#[derive(Debug)]
pub(crate) enum Plan {
    /// Content of a text block.
    Text(BlockId),

    /// Lines of a verbatim block.
    Verbatim(BlockId),

    /// A run of blank columns.
    Space(usize),

    /// A line break; the new line starts at the given column.
    Newline(usize),

    /// Parts in order.
    Seq(SmallVec<[Rc<Plan>; 4]>),
}

/// Result of evaluating a block in a context.
#[derive(Clone, Debug)]
pub struct Layout {
    /// Columns written on the starting line.
    pub first_line_width: usize,

    /// Columns on the final line; absolute when `height > 1`.
    pub last_line_width: usize,

    /// Number of lines.
    pub height: usize,

    /// Total cost.
    pub cost: Cost,

    plan: Rc<Plan>,
}

impl Layout {
    /// One-line layout of a text block.
    pub(crate) fn text(id: BlockId, width: usize, cost: Cost) -> Self {
        Layout::single_line(width, cost, Plan::Text(id))
    }

    /// Layout of a verbatim block with the given line widths.
    ///
    /// `widths` must not be empty.
    pub(crate) fn verbatim(id: BlockId, widths: &[usize], cost: Cost) -> Self {
        let first = widths.first().copied().unwrap_or(0);
        let last = widths.last().copied().unwrap_or(0);
        Layout {
            first_line_width: first,
            last_line_width: last,
            height: widths.len().max(1),
            cost,
            plan: Rc::new(Plan::Verbatim(id)),
        }
    }

    /// `columns` blank columns on the current line.
    pub(crate) fn space(columns: usize, cost: Cost) -> Self {
        Layout::single_line(columns, cost, Plan::Space(columns))
    }

    /// A line break followed by padding up to `column`.
    pub(crate) fn newline(column: usize, cost: Cost) -> Self {
        Layout {
            first_line_width: 0,
            last_line_width: column,
            height: 2,
            cost,
            plan: Rc::new(Plan::Newline(column)),
        }
    }

    fn single_line(width: usize, cost: Cost, plan: Plan) -> Self {
        Layout {
            first_line_width: width,
            last_line_width: width,
            height: 1,
            cost,
            plan: Rc::new(plan),
        }
    }

    /// Check if the layout fits on one line.
    #[inline]
    pub fn is_single_line(&self) -> bool {
        self.height == 1
    }

    /// Column right after the layout, given the column it started at.
    #[inline]
    pub fn end_column(&self, start_column: usize) -> usize {
        if self.is_single_line() {
            start_column + self.first_line_width
        } else {
            self.last_line_width
        }
    }

    /// Place `next` right after `self`, continuing on `self`'s last line.
    #[must_use = "join returns the combined Layout"]
    pub(crate) fn join(mut self, next: Layout) -> Layout {
        self.extend_geometry(&next);
        self.plan = Rc::new(Plan::Seq(smallvec![self.plan, next.plan]));
        self
    }

    /// Concatenate `parts` in order, each continuing on the previous one's
    /// last line. No parts give an empty one-line layout.
    pub(crate) fn concat<I>(parts: I) -> Layout
    where
        I: IntoIterator<Item = Layout>,
    {
        let mut acc = Layout::single_line(0, Cost::ZERO, Plan::Seq(SmallVec::new()));
        let mut plans: SmallVec<[Rc<Plan>; 4]> = SmallVec::new();
        for part in parts {
            acc.extend_geometry(&part);
            plans.push(part.plan);
        }
        acc.plan = match plans.len() {
            0 => acc.plan,
            1 => plans.swap_remove(0),
            _ => Rc::new(Plan::Seq(plans)),
        };
        acc
    }

    pub(crate) fn plan(&self) -> &Plan {
        &self.plan
    }

    fn extend_geometry(&mut self, next: &Layout) {
        let first = if self.is_single_line() {
            self.first_line_width + next.first_line_width
        } else {
            self.first_line_width
        };
        let last = if !next.is_single_line() {
            next.last_line_width
        } else if !self.is_single_line() {
            self.last_line_width + next.first_line_width
        } else {
            first
        };
        self.first_line_width = first;
        self.last_line_width = last;
        self.height += next.height - 1;
        self.cost += next.cost;
    }
}
