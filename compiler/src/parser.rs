// Composition stack machine.
//
// Consumes the token stream of a composition expression and builds one
// composite tile. Nesting is tracked with an explicit stack of frames (one
// per open parenthesis) rather than call recursion; each frame holds an
// operand stack of tiles and a stack of pending operators. Operators are
// applied only when their frame is closed, by `)` or by end of input.
//
// Preconditions: tokens come from `lexer::tokenize` against the catalog the
//                tile source serves.
// Postconditions: on success, exactly one tile is returned and every tile
//                 instance that went into it was stamped with its own
//                 namespace.
// Failure modes: tile loading/shape errors, connector arity mismatch,
//                operand stack underflow → `ComposeError` (run aborted).
//                Tokens without a semantic action, unbalanced parentheses
//                and leftover operands → warning diagnostics only.
// Side effects: advances the namespace allocator; updates the bound
//               tracker's working set.

use tracing::{debug, warn};

use crate::bounds::BoundTracker;
use crate::connect::Operator;
use crate::diag::{codes, Diagnostic};
use crate::error::{ComposeError, ComposeResult};
use crate::id::NamespaceAllocator;
use crate::lexer::{Span, Token};
use crate::rename;
use crate::source::TileSource;
use crate::tile::{Tile, TileClass};

// ── Frames ──────────────────────────────────────────────────────────────────

/// One parenthesis scope.
#[derive(Debug, Clone)]
pub struct ParserFrame {
    pub nesting_level: u32,
    /// Operand tiles, top of stack last.
    pub operands: Vec<Tile>,
    /// Pending operators, top of stack last.
    pub operators: Vec<Operator>,
    /// Where the scope was opened (the `(` token, or 0..0 for the root).
    pub opened_at: Span,
}

impl ParserFrame {
    fn new(nesting_level: u32, opened_at: Span) -> Self {
        Self {
            nesting_level,
            operands: Vec::new(),
            operators: Vec::new(),
            opened_at,
        }
    }
}

/// LIFO chain of frames. Never empty: the root frame lives for the whole
/// run.
#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<ParserFrame>,
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self {
            frames: vec![ParserFrame::new(0, Span::point(0))],
        }
    }

    /// Number of live frames, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn head(&self) -> &ParserFrame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    pub fn head_mut(&mut self) -> &mut ParserFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Push a frame one level deeper than the head.
    pub fn open(&mut self, at: Span) {
        let level = self.head().nesting_level + 1;
        self.frames.push(ParserFrame::new(level, at));
    }

    /// Pop the head frame. Returns `None` (and pops nothing) at the root.
    pub fn close(&mut self) -> Option<ParserFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }
}

// ── Machine ─────────────────────────────────────────────────────────────────

/// Result of a completed run.
#[derive(Debug)]
pub struct MachineOutput {
    pub tile: Tile,
    pub diagnostics: Vec<Diagnostic>,
}

/// The composition stack machine for one run.
pub struct StackMachine<'a, S: TileSource + ?Sized> {
    frames: FrameStack,
    source: &'a mut S,
    namespaces: &'a mut NamespaceAllocator,
    bounds: &'a mut BoundTracker,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, S: TileSource + ?Sized> StackMachine<'a, S> {
    pub fn new(
        source: &'a mut S,
        namespaces: &'a mut NamespaceAllocator,
        bounds: &'a mut BoundTracker,
    ) -> Self {
        Self {
            frames: FrameStack::new(),
            source,
            namespaces,
            bounds,
            diagnostics: Vec::new(),
        }
    }

    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Apply the semantic action of one token.
    pub fn step(&mut self, token: Token, span: Span) -> ComposeResult<()> {
        debug!(token = %token, depth = self.frames.depth(), "step");
        match token {
            Token::TileRef { name, class, param } => self.push_tile(&name, class, param),
            Token::Operator(op) => {
                self.frames.head_mut().operators.push(op);
                Ok(())
            }
            Token::LParen => {
                self.frames.open(span);
                Ok(())
            }
            Token::RParen => self.close_scope(span),
            stray @ (Token::LBracket | Token::RBracket | Token::Integer(_)) => {
                self.warn(
                    Diagnostic::warning(
                        codes::UNKNOWN_TOKEN,
                        span,
                        format!("token `{}` has no composition action; ignored", stray),
                    )
                    .with_hint("a bracketed parameter must directly follow a tile name"),
                );
                Ok(())
            }
        }
    }

    /// Treat end of input as closing every open scope, then drain the root.
    pub fn finish(mut self, end: Span) -> ComposeResult<MachineOutput> {
        while self.frames.depth() > 1 {
            let opened_at = self.frames.head().opened_at;
            self.warn(
                Diagnostic::warning(codes::UNCLOSED_OPEN, opened_at, "`(` is never closed")
                    .with_hint("closed implicitly at end of input"),
            );
            self.close_scope(end)?;
        }
        self.drain_head()?;

        let root = self.frames.head_mut();
        let mut tile = root.operands.pop().ok_or(ComposeError::EmptyComposition)?;
        let leftover = root.operands.len();
        if leftover > 0 {
            self.warn(Diagnostic::warning(
                codes::LEFTOVER_OPERANDS,
                end,
                format!(
                    "{} operand tile(s) left without an operator; result is the last one",
                    leftover
                ),
            ));
        }
        // A tile never merged still contributes its bounds.
        if let Some(label) = tile.parameter_bounds.take() {
            self.bounds.add_bound(&label)?;
        }
        Ok(MachineOutput {
            tile,
            diagnostics: self.diagnostics,
        })
    }

    fn push_tile(&mut self, name: &str, class: TileClass, param: u64) -> ComposeResult<()> {
        let mut tile = self.source.load_tile(name, class, param)?;
        class
            .check_shape(&tile)
            .and_then(|()| tile.validate())
            .map_err(|reason| ComposeError::MalformedTile {
                name: name.to_string(),
                reason,
            })?;
        let ns = rename::stamp(&mut tile, self.namespaces);
        debug!(tile = name, class = %class, param, namespace = %ns, "push operand");
        self.frames.head_mut().operands.push(tile);
        Ok(())
    }

    /// `)`: drain the head frame and hand its result to the enclosing one.
    fn close_scope(&mut self, span: Span) -> ComposeResult<()> {
        self.drain_head()?;
        match self.frames.close() {
            Some(mut frame) => {
                // A group hands exactly one tile to its parent.
                let result = frame.operands.pop();
                let leftover = frame.operands.len();
                if result.is_none() {
                    self.warn(Diagnostic::warning(
                        codes::EMPTY_GROUP,
                        frame.opened_at,
                        "empty parenthesised group",
                    ));
                } else if leftover > 0 {
                    self.warn(Diagnostic::warning(
                        codes::LEFTOVER_OPERANDS,
                        frame.opened_at,
                        format!(
                            "{} operand tile(s) left without an operator in group; group result is the last one",
                            leftover
                        ),
                    ));
                }
                self.frames.head_mut().operands.extend(result);
            }
            None => self.warn(Diagnostic::warning(
                codes::UNBALANCED_CLOSE,
                span,
                "`)` has no matching `(`",
            )),
        }
        Ok(())
    }

    /// Apply pending operators of the head frame, most recent first.
    fn drain_head(&mut self) -> ComposeResult<()> {
        let frame = self.frames.head_mut();
        while let Some(op) = frame.operators.pop() {
            let arity = op.arity();
            if frame.operands.len() < arity {
                return Err(ComposeError::StackUnderflow {
                    operator: op,
                    needed: arity,
                    available: frame.operands.len(),
                });
            }
            // Popped right-to-left; restore textual order.
            let mut operands: Vec<Tile> = (0..arity).filter_map(|_| frame.operands.pop()).collect();
            operands.reverse();
            let merged = op.apply(operands, self.bounds)?;
            frame.operands.push(merged);
        }
        Ok(())
    }

    fn warn(&mut self, diag: Diagnostic) {
        warn!(code = diag.code.0, span = %diag.span, "{}", diag.message);
        self.diagnostics.push(diag);
    }
}

/// Run the machine over a whole token stream.
pub fn run<S: TileSource + ?Sized>(
    tokens: Vec<(Token, Span)>,
    end: usize,
    source: &mut S,
    namespaces: &mut NamespaceAllocator,
    bounds: &mut BoundTracker,
) -> ComposeResult<MachineOutput> {
    let mut machine = StackMachine::new(source, namespaces, bounds);
    for (token, span) in tokens {
        machine.step(token, span)?;
    }
    machine.finish(Span::point(end))
}

// ── Tests ──
