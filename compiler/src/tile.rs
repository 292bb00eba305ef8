// tile.rs — Tile graph model
//
// A tile is a fragment of a timed automaton: locations, transitions, a
// declaration block, and the `in`/`out` boundary locations through which
// it is wired to other tiles during composition.
//
// Preconditions: none (types only, plus structural validation).
// Postconditions: `validate` accepts only tiles whose ids are unique and
//                 whose transitions reference existing locations.
// Failure modes: `validate` / `TileClass::check_shape` return `ShapeError`.
// Side effects: none.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Boundary role ───────────────────────────────────────────────────────────

/// Role of a boundary location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    In,
    Out,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::In => write!(f, "in"),
            Role::Out => write!(f, "out"),
        }
    }
}

// ── Locations and transitions ───────────────────────────────────────────────

/// A location (node) of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariant: Option<String>,
    /// Setup text attached to the location. When the location is the target
    /// of a connection, this becomes the assignment of the joining edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, rename = "final", skip_serializing_if = "std::ops::Not::not")]
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Location {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            invariant: None,
            comment: None,
            is_final: false,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_invariant(mut self, invariant: impl Into<String>) -> Self {
        self.invariant = Some(invariant.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn final_location(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// A transition (edge) of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// `;`-separated multi-assignment (clock resets, variable updates).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<String>,
}

impl Transition {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            guard: None,
            assignment: None,
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_assignment(mut self, assignment: impl Into<String>) -> Self {
        self.assignment = Some(assignment.into());
        self
    }
}

// ── Tile ────────────────────────────────────────────────────────────────────

/// An attributed directed graph fragment.
///
/// Location order is significant: boundary locations are connected in the
/// order they were declared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub declaration: String,
    /// Bound label for the tracked free parameter, e.g. `"0:5|8:inf"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_bounds: Option<String>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Tile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_declaration(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = declaration.into();
        self
    }

    pub fn with_parameter_bounds(mut self, label: impl Into<String>) -> Self {
        self.parameter_bounds = Some(label.into());
        self
    }

    /// Ids of the boundary locations with `role`, in declaration order.
    pub fn boundary(&self, role: Role) -> Vec<&str> {
        self.locations
            .iter()
            .filter(|l| l.role == Some(role))
            .map(|l| l.id.as_str())
            .collect()
    }

    pub fn boundary_count(&self, role: Role) -> usize {
        self.locations.iter().filter(|l| l.role == Some(role)).count()
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn location_mut(&mut self, id: &str) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| l.id == id)
    }

    /// Remove the boundary role from a location, keeping the location.
    pub fn clear_role(&mut self, id: &str) {
        if let Some(loc) = self.location_mut(id) {
            loc.role = None;
        }
    }

    /// Append another tile's locations, transitions and declaration block.
    ///
    /// No renaming happens here; callers guarantee disjoint ids.
    pub fn absorb(&mut self, other: Tile) {
        let Tile {
            declaration,
            locations,
            transitions,
            ..
        } = other;
        if !declaration.trim().is_empty() {
            if !self.declaration.is_empty() {
                self.declaration.push('\n');
            }
            self.declaration.push_str(&declaration);
        }
        self.locations.extend(locations);
        self.transitions.extend(transitions);
    }

    /// Check structural well-formedness.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let mut ids = HashSet::with_capacity(self.locations.len());
        for loc in &self.locations {
            if !ids.insert(loc.id.as_str()) {
                return Err(ShapeError::DuplicateLocation(loc.id.clone()));
            }
        }
        let mut edge_ids = HashSet::with_capacity(self.transitions.len());
        for t in &self.transitions {
            if !edge_ids.insert(t.id.as_str()) {
                return Err(ShapeError::DuplicateTransition(t.id.clone()));
            }
            for endpoint in [&t.source, &t.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(ShapeError::DanglingEndpoint {
                        transition: t.id.clone(),
                        location: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "tile {}: {} locations, {} transitions",
            self.name,
            self.locations.len(),
            self.transitions.len()
        )?;
        for loc in &self.locations {
            write!(f, "  loc {}", loc.id)?;
            if let Some(role) = loc.role {
                write!(f, " [{}]", role)?;
            }
            if loc.is_final {
                write!(f, " final")?;
            }
            writeln!(f)?;
        }
        for t in &self.transitions {
            write!(f, "  edge {}: {} -> {}", t.id, t.source, t.target)?;
            if let Some(g) = &t.guard {
                write!(f, " if {}", g)?;
            }
            if let Some(a) = &t.assignment {
                write!(f, " do {}", a)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ── Arity class ─────────────────────────────────────────────────────────────

/// Classification of a tile by its boundary shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileClass {
    Accepting,
    Binary,
    Ternary,
    Random,
}

impl TileClass {
    pub const ALL: [TileClass; 4] = [
        TileClass::Accepting,
        TileClass::Binary,
        TileClass::Ternary,
        TileClass::Random,
    ];

    /// Directory name used by file-backed sources.
    pub fn dir_name(self) -> &'static str {
        match self {
            TileClass::Accepting => "accepting",
            TileClass::Binary => "binary",
            TileClass::Ternary => "ternary",
            TileClass::Random => "random",
        }
    }

    /// Check that `tile` exposes the boundary shape this class promises.
    ///
    /// Only `Binary` promises a count: it is the root of a tree fan-out and
    /// must offer exactly two `out` locations. The other classes are checked
    /// by the connectors they meet.
    pub fn check_shape(self, tile: &Tile) -> Result<(), ShapeError> {
        match self {
            TileClass::Binary => {
                let outs = tile.boundary_count(Role::Out);
                if outs == 2 {
                    Ok(())
                } else {
                    Err(ShapeError::Boundary {
                        class: self,
                        expected: format!("exactly 2 `out` locations, found {}", outs),
                    })
                }
            }
            TileClass::Accepting | TileClass::Ternary | TileClass::Random => Ok(()),
        }
    }
}

impl fmt::Display for TileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A structural defect found in a tile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("duplicate location id `{0}`")]
    DuplicateLocation(String),
    #[error("duplicate transition id `{0}`")]
    DuplicateTransition(String),
    #[error("transition `{transition}` references unknown location `{location}`")]
    DanglingEndpoint { transition: String, location: String },
    #[error("{class} tile needs {expected}")]
    Boundary { class: TileClass, expected: String },
}

// ── Tests ──
