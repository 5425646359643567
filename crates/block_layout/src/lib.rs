//! Block Layout
//!
//! Cost-minimizing layout engine for composable formatting blocks.
//!
//! # Architecture
//!
//! A front end (a source printer, a config emitter) describes *what* text
//! exists and *which* arrangements are acceptable as a tree of blocks. The
//! engine picks the arrangement with the lowest cost:
//!
//! 1. **Build**: allocate blocks in a [`BlockArena`]
//! 2. **Solve**: [`Solver::evaluate`] finds the cheapest [`Layout`] of a root
//! 3. **Render**: [`Renderer::materialize`] turns the layout into lines
//!
//! [`render`] runs all three steps after the build.
//!
//! # Modules
//!
//! - [`block`]: block variants, arena and combinators
//! - [`cost`]: cost values and the pluggable cost policy
//! - [`width`]: pluggable text width functions
//! - [`layout`]: evaluation context and layout geometry
//! - [`solver`]: memoized cost-minimizing evaluator
//! - [`render`]: plan realization into text
//!
//! # Example
//!
//! ```
//! use block_layout::{render, BlockArena, CharCount, CostModel};
//!
//! let mut arena = BlockArena::new();
//! let kw = arena.text("if ")?;
//! let x = arena.text("x")?;
//! let open = arena.text("(")?;
//! let close = arena.text(")")?;
//! let body = arena.indent(x, 2)?;
//! let stacked = arena.stack(&[open, body, close])?;
//! let cond = arena.choice(&[x, stacked])?;
//! let root = arena.line(&[kw, cond], 0)?;
//!
//! let wide = render(&arena, root, 80, &CharCount, &CostModel::default())?;
//! assert_eq!(wide, vec!["if x"]);
//!
//! let narrow = render(&arena, root, 3, &CharCount, &CostModel::default())?;
//! assert_eq!(narrow, vec!["if ", "(", "  x", ")"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod block;
pub mod cost;
pub mod error;
pub mod layout;
mod recursion;
pub mod render;
pub mod solver;
pub mod width;

use std::sync::Once;

use rayon::prelude::*;

pub use block::{Block, BlockArena, BlockId, BlockRange, DEFAULT_BREAK_MULT};
pub use cost::{Cost, CostModel, CostPolicy, TieBreak};
pub use error::{BlockError, ConfigError, LayoutError, WidthError};
pub use layout::{Context, Layout};
pub use render::{Emitter, LineEmitter, Renderer};
pub use solver::{Solver, SolverStats, WrapStrategy};
pub use width::{CharCount, StrictCharCount, TextWidth};

/// Default page width in columns.
pub const DEFAULT_MARGIN: usize = 80;

/// Lay out `root` within `margin` columns and render it as lines.
///
/// Content that cannot fit is still rendered; its overflow only shows up as
/// cost. Errors come from the width function, the cost configuration, or a
/// root id foreign to `arena`.
pub fn render<W, C>(
    arena: &BlockArena,
    root: BlockId,
    margin: usize,
    width: &W,
    cost: &C,
) -> Result<Vec<String>, LayoutError>
where
    W: TextWidth + ?Sized,
    C: CostPolicy + ?Sized,
{
    let layout = Solver::new(arena, width, cost).evaluate(root, Context::new(margin))?;
    Ok(Renderer::new(arena).materialize(&layout))
}

/// [`render`], with the lines joined by `\n`.
pub fn render_to_string<W, C>(
    arena: &BlockArena,
    root: BlockId,
    margin: usize,
    width: &W,
    cost: &C,
) -> Result<String, LayoutError>
where
    W: TextWidth + ?Sized,
    C: CostPolicy + ?Sized,
{
    render(arena, root, margin, width, cost).map(|lines| lines.join("\n"))
}

/// One root to render at one margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderRequest {
    pub root: BlockId,
    pub margin: usize,
}

/// Render several requests over one arena in parallel.
///
/// Every request gets its own solver and memo table; the arena is only
/// read. Results are in request order.
pub fn render_many<W, C>(
    arena: &BlockArena,
    requests: &[RenderRequest],
    width: &W,
    cost: &C,
) -> Vec<Result<Vec<String>, LayoutError>>
where
    W: TextWidth + Sync + ?Sized,
    C: CostPolicy + Sync + ?Sized,
{
    requests
        .par_iter()
        .map(|request| render(arena, request.root, request.margin, width, cost))
        .collect()
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=block_layout=debug`
/// for one line per solve, or `RUST_LOG=block_layout=trace` to also see
/// every choice and wrap decision.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
