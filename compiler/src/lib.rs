// tilec — tile composer
//
// Library root. A composition run flows lexer → parser (stack machine) →
// connect (operators) with rename stamping tiles and bounds tracking the
// free parameter; session ties the phases together across runs.

pub mod bounds;
pub mod catalog;
pub mod connect;
pub mod diag;
pub mod error;
pub mod id;
pub mod lexer;
pub mod parser;
pub mod provenance;
pub mod rename;
pub mod session;
pub mod source;
pub mod tile;

pub use error::{ComposeError, ComposeResult};
pub use session::{Composition, Session};
pub use tile::{Location, Role, Tile, TileClass, Transition};
