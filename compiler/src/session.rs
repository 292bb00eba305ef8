// session.rs — Composition sessions
//
// A session owns everything that must persist across composition runs: the
// tile source and catalog, the namespace allocator (identifiers stay unique
// across every run of the session), and the bound tracker with its stored
// per-run snapshots.
//
// Preconditions: the catalog describes the tiles the source can load.
// Postconditions: after a successful run the working bounds are stored
//                 under the run's name and cleared; after a failed run
//                 they are cleared and nothing is stored.
// Failure modes: any `ComposeError` from the stack machine.
// Side effects: `info!` per completed run.

use serde::Serialize;
use tracing::{info, warn};

use crate::bounds::{Bound, BoundTracker};
use crate::catalog::Catalog;
use crate::diag::Diagnostic;
use crate::error::ComposeResult;
use crate::id::{Namespace, NamespaceAllocator};
use crate::lexer::{self, Span};
use crate::parser;
use crate::provenance::Provenance;
use crate::source::TileSource;
use crate::tile::Tile;

/// Outcome of one composition run.
#[derive(Debug, Serialize)]
pub struct Composition {
    pub name: String,
    pub expression: String,
    pub tile: Tile,
    /// Bounds stored for this run.
    pub bounds: Vec<Bound>,
    pub diagnostics: Vec<Diagnostic>,
    /// Input the tokenizer skipped.
    pub skipped: Vec<Span>,
    pub provenance: Provenance,
}

/// Cross-run composition state.
pub struct Session<S: TileSource> {
    source: S,
    catalog: Catalog,
    namespaces: NamespaceAllocator,
    bounds: BoundTracker,
}

impl<S: TileSource> Session<S> {
    pub fn new(source: S, catalog: Catalog) -> Self {
        Self {
            source,
            catalog,
            namespaces: NamespaceAllocator::new(),
            bounds: BoundTracker::new(),
        }
    }

    /// Compose `expression` as the run `name`.
    pub fn compose(&mut self, name: &str, expression: &str) -> ComposeResult<Composition> {
        let lexed = lexer::tokenize(expression, &self.catalog);
        let result = parser::run(
            lexed.tokens,
            expression.len(),
            &mut self.source,
            &mut self.namespaces,
            &mut self.bounds,
        );
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                self.bounds.reset_bounds();
                warn!(run = name, error = %e, "composition failed");
                return Err(e);
            }
        };

        self.bounds.store_bounds(name);
        let bounds = self.bounds.current().to_vec();
        self.bounds.reset_bounds();

        let provenance = Provenance::compute(expression, &output.tile);
        info!(
            run = name,
            locations = output.tile.locations.len(),
            transitions = output.tile.transitions.len(),
            bounds = bounds.len(),
            warnings = output.diagnostics.len(),
            "composition complete"
        );
        Ok(Composition {
            name: name.to_string(),
            expression: expression.to_string(),
            tile: output.tile,
            bounds,
            diagnostics: output.diagnostics,
            skipped: lexed.skipped,
            provenance,
        })
    }

    /// Bounds stored by the run `name`.
    pub fn bounds(&self, name: &str) -> Option<&[Bound]> {
        self.bounds.get_bounds(name)
    }

    pub fn bound_tracker(&self) -> &BoundTracker {
        &self.bounds
    }

    /// Clear the working bound set. Stored snapshots are kept.
    pub fn reset_bounds(&mut self) {
        self.bounds.reset_bounds();
    }

    /// Restart namespace allocation. Tiles composed before and after the
    /// reset may share identifiers.
    pub fn reset_namespaces(&mut self) {
        self.namespaces.reset();
    }

    pub fn next_namespace(&self) -> Namespace {
        self.namespaces.peek()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
