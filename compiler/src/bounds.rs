// bounds.rs — Feasible-range tracking for the free parameter
//
// Each composition run accumulates a union of intervals constraining one
// implicit numeric parameter. Tiles carry a bound label such as
// `"0:5|8:inf"`; every label met during a run narrows (or branches) the
// working set. The working set is path-insensitive: all tiles of a run feed
// the same set, whichever branch of the expression they sit in.
//
// Preconditions: none.
// Postconditions: `is_disjoint` always equals `low > high` for non-NaN bounds.
// Failure modes: unparsable labels → `BoundParseError`; the working set is
//                left untouched in that case.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// One interval for the tracked parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bound {
    /// "No bound" sentinel: the interval places no constraint.
    pub is_nan: bool,
    /// Set when an intersection left `low > high` (infeasible).
    pub is_disjoint: bool,
    pub low: f64,
    pub high: f64,
}

impl Bound {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            is_nan: false,
            is_disjoint: low > high,
            low,
            high,
        }
    }

    /// The unconstrained interval.
    pub fn nan() -> Self {
        Self {
            is_nan: true,
            is_disjoint: false,
            low: f64::NAN,
            high: f64::NAN,
        }
    }

    /// Interval intersection. An unconstrained side is the identity.
    pub fn intersect(&self, other: &Bound) -> Bound {
        if self.is_nan {
            return *other;
        }
        if other.is_nan {
            return *self;
        }
        Bound::new(self.low.max(other.low), self.high.min(other.high))
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan {
            return write!(f, "[nan]");
        }
        let side = |v: f64| {
            if v == f64::MAX {
                "inf".to_string()
            } else if v == -f64::MAX {
                "-inf".to_string()
            } else {
                v.to_string()
            }
        };
        write!(f, "[{}, {}]", side(self.low), side(self.high))?;
        if self.is_disjoint {
            write!(f, " disjoint")?;
        }
        Ok(())
    }
}

/// A bound label that could not be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundParseError {
    #[error("bound `{0}` is not of the form low:high")]
    MissingSeparator(String),
    #[error("bound side `{0}` is neither a number nor inf/nan")]
    BadSide(String),
}

// ── Label grammar ──

fn parse_side(text: &str) -> Result<Option<f64>, BoundParseError> {
    match text.trim() {
        "" | "-" | "nan" | "NaN" => Ok(None),
        "inf" | "+inf" => Ok(Some(f64::MAX)),
        "-inf" => Ok(Some(-f64::MAX)),
        s => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| BoundParseError::BadSide(s.to_string())),
    }
}

fn parse_interval(text: &str) -> Result<Bound, BoundParseError> {
    let (low, high) = text
        .split_once(':')
        .ok_or_else(|| BoundParseError::MissingSeparator(text.trim().to_string()))?;
    match (parse_side(low)?, parse_side(high)?) {
        (Some(l), Some(h)) => Ok(Bound::new(l, h)),
        _ => Ok(Bound::nan()),
    }
}

/// Parse a `|`-delimited list of `low:high` intervals.
pub fn parse_label(text: &str) -> Result<Vec<Bound>, BoundParseError> {
    text.split('|').map(parse_interval).collect()
}

// ── Tracker ──

/// Working set of intervals plus per-run snapshots.
#[derive(Debug, Clone, Default)]
pub struct BoundTracker {
    current: Vec<Bound>,
    stored: HashMap<String, Vec<Bound>>,
}

impl BoundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a bound label into the working set.
    ///
    /// On an empty set every interval is inserted (alternative initial
    /// ranges). Otherwise the first interval narrows every existing entry,
    /// and each further interval adds one new entry per pre-existing entry:
    /// a copy of that entry narrowed by the interval.
    pub fn add_bound(&mut self, text: &str) -> Result<(), BoundParseError> {
        let parsed = parse_label(text)?;
        if self.current.is_empty() {
            self.current = parsed;
            return Ok(());
        }
        let Some((first, extra)) = parsed.split_first() else {
            return Ok(());
        };
        let existing = self.current.clone();
        for bound in &mut self.current {
            *bound = bound.intersect(first);
        }
        for branch in extra {
            self.current
                .extend(existing.iter().map(|b| b.intersect(branch)));
        }
        Ok(())
    }

    /// The working set.
    pub fn current(&self) -> &[Bound] {
        &self.current
    }

    /// Snapshot the working set under `name`, replacing any earlier one.
    pub fn store_bounds(&mut self, name: impl Into<String>) {
        self.stored.insert(name.into(), self.current.clone());
    }

    pub fn get_bounds(&self, name: &str) -> Option<&[Bound]> {
        self.stored.get(name).map(Vec::as_slice)
    }

    /// Clear the working set. Stored snapshots are kept.
    pub fn reset_bounds(&mut self) {
        self.current.clear();
    }

    /// Names with a stored snapshot, sorted.
    pub fn stored_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stored.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
