// connect.rs — Composition operators and their connectors
//
// Each operator merges its operand tiles into one fresh tile and wires
// boundary locations of the left operand to boundary locations of the
// right operand(s). Operators form a closed set; adding one means adding a
// variant plus its arms in `arity`, `symbol` and `plan`.
//
// Preconditions: operands are in textual (left-to-right) order and have
//                been renamed into disjoint namespaces.
// Postconditions: the result holds every operand location and transition
//                 plus one new transition per planned connection; consumed
//                 endpoints lose their boundary role.
// Failure modes: boundary counts that do not fit the operator →
//                `ConnectionArityMismatch`; bad bound label → `Bound`.
// Side effects: feeds operand bound labels to the `BoundTracker`.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::bounds::BoundTracker;
use crate::error::ComposeError;
use crate::tile::{Role, Tile, Transition};

/// A composition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// `+`: wire the i-th `out` of the left tile to the i-th `in` of the
    /// right tile; both counts must match.
    SizeMatched,
    /// `+1`: wire only the first `out` to the first `in`.
    SingleEdge,
    /// `++`: binary-tree fan-out: the two `out`s of the first tile feed the
    /// single `in` of the second and third tiles.
    TreeFanOut,
}

impl Operator {
    pub const ALL: [Operator; 3] = [
        Operator::SizeMatched,
        Operator::SingleEdge,
        Operator::TreeFanOut,
    ];

    /// Number of operand tiles consumed.
    pub fn arity(self) -> usize {
        match self {
            Operator::SizeMatched | Operator::SingleEdge => 2,
            Operator::TreeFanOut => 3,
        }
    }

    /// Surface syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::SizeMatched => "+",
            Operator::SingleEdge => "+1",
            Operator::TreeFanOut => "++",
        }
    }

    /// Connector name, as used in logs.
    pub fn connector_name(self) -> &'static str {
        match self {
            Operator::SizeMatched => "match_inout_size",
            Operator::SingleEdge => "only_one_out",
            Operator::TreeFanOut => "tree_op",
        }
    }

    /// Merge `operands` (textual order) into one connected tile.
    pub fn apply(self, operands: Vec<Tile>, bounds: &mut BoundTracker) -> Result<Tile, ComposeError> {
        if operands.len() != self.arity() {
            return Err(ComposeError::StackUnderflow {
                operator: self,
                needed: self.arity(),
                available: operands.len(),
            });
        }
        let connections = self.plan(&operands)?;

        let mut merged = Tile::new(self.composite_name(&operands));
        for mut operand in operands {
            if let Some(label) = operand.parameter_bounds.take() {
                bounds.add_bound(&label)?;
            }
            merged.absorb(operand);
        }

        for (source, target) in &connections {
            connect_pair(&mut merged, source, target);
        }
        debug!(
            connector = self.connector_name(),
            tile = %merged.name,
            edges = connections.len(),
            "applied connector"
        );
        Ok(merged)
    }

    /// Compute `(out, in)` endpoint pairs without touching the operands.
    fn plan(self, operands: &[Tile]) -> Result<Vec<(String, String)>, ComposeError> {
        let mismatch = |detail: String| ComposeError::ConnectionArityMismatch {
            operator: self,
            detail,
        };
        match (self, operands) {
            (Operator::SizeMatched, [left, right]) => {
                let outs = left.boundary(Role::Out);
                let ins = right.boundary(Role::In);
                if outs.len() != ins.len() {
                    return Err(mismatch(format!(
                        "`{}` has {} out locations but `{}` has {} in locations",
                        left.name,
                        outs.len(),
                        right.name,
                        ins.len()
                    )));
                }
                Ok(pairs(outs, ins))
            }
            (Operator::SingleEdge, [left, right]) => {
                let out = left.boundary(Role::Out).into_iter().next();
                let inp = right.boundary(Role::In).into_iter().next();
                match (out, inp) {
                    (Some(o), Some(i)) => Ok(vec![(o.to_string(), i.to_string())]),
                    (None, _) => Err(mismatch(format!("`{}` has no out location", left.name))),
                    (_, None) => Err(mismatch(format!("`{}` has no in location", right.name))),
                }
            }
            (Operator::TreeFanOut, [root, first, second]) => {
                let outs = root.boundary(Role::Out);
                if outs.len() != 2 {
                    return Err(mismatch(format!(
                        "`{}` needs exactly 2 out locations, has {}",
                        root.name,
                        outs.len()
                    )));
                }
                let mut ins = Vec::with_capacity(2);
                for branch in [first, second] {
                    let branch_ins = branch.boundary(Role::In);
                    if branch_ins.len() != 1 {
                        return Err(mismatch(format!(
                            "`{}` needs exactly 1 in location, has {}",
                            branch.name,
                            branch_ins.len()
                        )));
                    }
                    ins.push(branch_ins[0]);
                }
                Ok(pairs(outs, ins))
            }
            _ => Err(ComposeError::StackUnderflow {
                operator: self,
                needed: self.arity(),
                available: operands.len(),
            }),
        }
    }

    fn composite_name(self, operands: &[Tile]) -> String {
        let names: Vec<&str> = operands.iter().map(|t| t.name.as_str()).collect();
        match names.as_slice() {
            [root, rest @ ..] => format!("({} {} {})", root, self.symbol(), rest.join(" ")),
            [] => String::new(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn pairs(outs: Vec<&str>, ins: Vec<&str>) -> Vec<(String, String)> {
    outs.into_iter()
        .zip(ins)
        .map(|(o, i)| (o.to_string(), i.to_string()))
        .collect()
}

/// Add the joining transition and strip both endpoint roles.
///
/// The target's comment text becomes the edge assignment, so setup that a
/// tile expects on entry runs on the edge leading into it.
fn connect_pair(tile: &mut Tile, source: &str, target: &str) {
    let assignment = tile
        .location(target)
        .and_then(|l| l.comment.as_deref())
        .and_then(normalize_assignment);

    let mut edge = Transition::new(format!("{}->{}", source, target), source, target);
    edge.assignment = assignment;
    tile.transitions.push(edge);

    tile.clear_role(source);
    tile.clear_role(target);
}

/// Normalise free text into a `;`-joined assignment list.
pub fn normalize_assignment(text: &str) -> Option<String> {
    let parts: Vec<&str> = text
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

// ── Tests ──
