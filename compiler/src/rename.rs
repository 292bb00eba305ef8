// rename.rs — Namespace stamping for tile instances
//
// Appends `_<namespace>` to every location id, transition id and
// transition endpoint of a tile. Ids inside one tile are unique, and the
// suffix after the last `_` is the namespace, so two tiles stamped with
// different namespaces can never share an identifier.
//
// Preconditions: the tile has not been stamped before in this run.
// Postconditions: all ids carry the same fresh suffix; the allocator has
//                 advanced by one.
// Failure modes: none.
// Side effects: mutates the tile in place.

use crate::id::{Namespace, NamespaceAllocator};
use crate::tile::Tile;

/// Stamp `tile` with the allocator's next namespace.
pub fn stamp(tile: &mut Tile, namespaces: &mut NamespaceAllocator) -> Namespace {
    let ns = namespaces.alloc();
    apply(tile, ns);
    ns
}

fn apply(tile: &mut Tile, ns: Namespace) {
    let suffix = format!("_{}", ns);
    for loc in &mut tile.locations {
        loc.id.push_str(&suffix);
    }
    for t in &mut tile.transitions {
        t.id.push_str(&suffix);
        t.source.push_str(&suffix);
        t.target.push_str(&suffix);
    }
}
