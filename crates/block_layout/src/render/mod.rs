//! Rendering
//!
//! Realizes the deferred text plan of a solved [`Layout`]. No decisions are
//! made here; the solver already fixed every break and every column.
//!
//! Whitespace (separators, indentation padding) is handed to the emitter as
//! pending columns and only written once real text follows on the same
//! line, so blank lines come out empty. Spaces that are part of a text
//! block's content are written as-is.


use crate::block::{Block, BlockArena};
use crate::layout::{Layout, Plan};

/// Sink for rendered output.
pub trait Emitter {
    /// Emit a text fragment on the current line.
    fn emit(&mut self, text: &str);

    /// End the current line.
    fn emit_newline(&mut self);

    /// Emit blank columns.
    fn emit_spaces(&mut self, columns: usize);
}

/// Emitter collecting output as a list of lines.
///
/// Blank columns are held back until text follows them on the same line.
#[derive(Debug, Default)]
pub struct LineEmitter {
    lines: Vec<String>,
    current: String,
    pending: usize,
}

impl LineEmitter {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the current line and return all lines.
    pub fn finish(mut self) -> Vec<String> {
        self.lines.push(self.current);
        self.lines
    }
}

impl Emitter for LineEmitter {
    fn emit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        for _ in 0..self.pending {
            self.current.push(' ');
        }
        self.pending = 0;
        self.current.push_str(text);
    }

    fn emit_newline(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
        self.pending = 0;
    }

    fn emit_spaces(&mut self, columns: usize) {
        self.pending += columns;
    }
}

/// Turns solved layouts into text.
#[derive(Clone, Copy, Debug)]
pub struct Renderer<'a> {
    arena: &'a BlockArena,
}

impl<'a> Renderer<'a> {
    /// Create a renderer for layouts solved over `arena`.
    pub fn new(arena: &'a BlockArena) -> Self {
        Self { arena }
    }

    /// Realize `layout` as a list of lines.
    pub fn materialize(&self, layout: &Layout) -> Vec<String> {
        let mut emitter = LineEmitter::new();
        self.materialize_into(layout, &mut emitter);
        emitter.finish()
    }

    /// Realize `layout` as one string, lines joined by `\n`.
    pub fn materialize_to_string(&self, layout: &Layout) -> String {
        self.materialize(layout).join("\n")
    }

    /// Stream `layout` into any emitter.
    pub fn materialize_into<E: Emitter>(&self, layout: &Layout, emitter: &mut E) {
        // Explicit work list: plans nest as deep as the block tree.
        let mut work: Vec<&Plan> = vec![layout.plan()];
        while let Some(plan) = work.pop() {
            match plan {
                Plan::Text(id) => {
                    if let Block::Text(content) = self.arena.get(*id) {
                        emitter.emit(content);
                    }
                }
                Plan::Verbatim(id) => {
                    if let Block::Verbatim(lines) = self.arena.get(*id) {
                        for (i, line) in lines.iter().enumerate() {
                            if i > 0 {
                                emitter.emit_newline();
                            }
                            emitter.emit(line);
                        }
                    }
                }
                Plan::Space(columns) => emitter.emit_spaces(*columns),
                Plan::Newline(column) => {
                    emitter.emit_newline();
                    emitter.emit_spaces(*column);
                }
                Plan::Seq(parts) => work.extend(parts.iter().rev().map(|part| &**part)),
            }
        }
    }
}
