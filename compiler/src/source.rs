// source.rs — Tile sources
//
// The composition engine asks a `TileSource` for a fresh tile instance
// every time an expression references a tile. Two sources are provided:
// an in-memory map (tests, embedding) and a directory of JSON tile
// documents laid out by arity class:
//
//   <root>/accepting/<name>.json
//   <root>/binary/<name>.json
//   <root>/ternary/<name>.json
//   <root>/random/<name>.json     (optional templates for random tiles)
//
// Random-class requests go to a registered generator when one exists;
// otherwise a template of the same name is used.
//
// Preconditions: none.
// Postconditions: every returned tile is a fresh, unshared instance.
// Failure modes: missing tile, unreadable or malformed document, random
//                tile with neither generator nor template → `SourceError`.
// Side effects: `DirTileSource` reads the file system.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::{Catalog, CatalogError};
use crate::tile::{Tile, TileClass};

/// Errors raised by tile sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no {class} tile named `{name}`")]
    NotFound { name: String, class: TileClass },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid tile document: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot synthesise random tile `{name}`: no generator or template registered")]
    Unsupported { name: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Produces tile instances on demand.
pub trait TileSource {
    /// Instantiate `name`. `param` is the bracketed integer from the
    /// expression (0 when absent); only random tiles use it.
    fn load_tile(&mut self, name: &str, class: TileClass, param: u64) -> Result<Tile, SourceError>;
}

impl<S: TileSource + ?Sized> TileSource for &mut S {
    fn load_tile(&mut self, name: &str, class: TileClass, param: u64) -> Result<Tile, SourceError> {
        (**self).load_tile(name, class, param)
    }
}

/// Random-tile generator: `(name, param) -> tile`.
pub type Generator = Box<dyn FnMut(&str, u64) -> Tile>;

fn generate(
    generators: &mut HashMap<String, Generator>,
    name: &str,
    param: u64,
) -> Option<Tile> {
    generators.get_mut(name).map(|g| {
        let mut tile = g(name, param);
        if tile.name.is_empty() {
            tile.name = name.to_string();
        }
        tile
    })
}

// ── In-memory source ────────────────────────────────────────────────────────

/// Tiles held in memory, cloned on every request.
#[derive(Default)]
pub struct MemoryTileSource {
    tiles: HashMap<String, (TileClass, Tile)>,
    generators: HashMap<String, Generator>,
}

impl MemoryTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stored tile.
    pub fn insert(&mut self, name: impl Into<String>, class: TileClass, mut tile: Tile) {
        let name = name.into();
        if tile.name.is_empty() {
            tile.name = name.clone();
        }
        self.tiles.insert(name, (class, tile));
    }

    pub fn with(mut self, name: &str, class: TileClass, tile: Tile) -> Self {
        self.insert(name, class, tile);
        self
    }

    /// Register a generator for a random-class tile.
    pub fn register_generator(
        &mut self,
        name: impl Into<String>,
        generator: impl FnMut(&str, u64) -> Tile + 'static,
    ) {
        self.generators.insert(name.into(), Box::new(generator));
    }

    /// Catalog of every stored tile and generator.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::new();
        for (name, (class, _)) in &self.tiles {
            catalog.insert(name.clone(), *class)?;
        }
        for name in self.generators.keys() {
            catalog.insert(name.clone(), TileClass::Random)?;
        }
        Ok(catalog)
    }
}

impl TileSource for MemoryTileSource {
    fn load_tile(&mut self, name: &str, class: TileClass, param: u64) -> Result<Tile, SourceError> {
        if class == TileClass::Random {
            if let Some(tile) = generate(&mut self.generators, name, param) {
                return Ok(tile);
            }
        }
        match self.tiles.get(name) {
            Some((stored, tile)) if *stored == class => Ok(tile.clone()),
            _ if class == TileClass::Random => Err(SourceError::Unsupported {
                name: name.to_string(),
            }),
            _ => Err(SourceError::NotFound {
                name: name.to_string(),
                class,
            }),
        }
    }
}

// ── Directory source ────────────────────────────────────────────────────────

/// JSON tile documents under a class-partitioned directory tree.
pub struct DirTileSource {
    root: PathBuf,
    catalog: Catalog,
    generators: HashMap<String, Generator>,
}

impl DirTileSource {
    /// Scan `root` for tile documents and build the catalog.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        let mut catalog = Catalog::new();
        for class in TileClass::ALL {
            let dir = root.join(class.dir_name());
            if !dir.is_dir() {
                continue;
            }
            let entries = std::fs::read_dir(&dir).map_err(|e| SourceError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let mut names = Vec::new();
            for entry in entries {
                let path = entry
                    .map_err(|e| SourceError::Io {
                        path: dir.clone(),
                        source: e,
                    })?
                    .path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
            names.sort();
            debug!(class = %class, count = names.len(), dir = %dir.display(), "scanned tile directory");
            for name in names {
                catalog.insert(name, class)?;
            }
        }
        Ok(Self {
            root,
            catalog,
            generators: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Register a generator for a random-class tile, adding it to the
    /// catalog.
    pub fn register_generator(
        &mut self,
        name: impl Into<String>,
        generator: impl FnMut(&str, u64) -> Tile + 'static,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        self.catalog.insert(name.clone(), TileClass::Random)?;
        self.generators.insert(name, Box::new(generator));
        Ok(())
    }

    fn document_path(&self, name: &str, class: TileClass) -> PathBuf {
        self.root.join(class.dir_name()).join(format!("{}.json", name))
    }
}

/// Read one JSON tile document.
pub fn read_tile(path: &Path) -> Result<Tile, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

impl TileSource for DirTileSource {
    fn load_tile(&mut self, name: &str, class: TileClass, param: u64) -> Result<Tile, SourceError> {
        if class == TileClass::Random {
            if let Some(tile) = generate(&mut self.generators, name, param) {
                return Ok(tile);
            }
        }
        let path = self.document_path(name, class);
        if !path.is_file() {
            if class == TileClass::Random {
                return Err(SourceError::Unsupported {
                    name: name.to_string(),
                });
            }
            return Err(SourceError::NotFound {
                name: name.to_string(),
                class,
            });
        }
        let mut tile = read_tile(&path)?;
        if tile.name.is_empty() {
            tile.name = name.to_string();
        }
        Ok(tile)
    }
}
