// Library-level composition tests.
//
// Drives whole composition runs through `Session` over an in-memory tile
// source and checks the observable properties of the result: location and
// transition counts, boundary roles, identifier uniqueness, stored bounds
// and warnings.

use std::collections::HashSet;

use tilec::bounds::Bound;
use tilec::diag::codes;
use tilec::source::MemoryTileSource;
use tilec::tile::{Location, Role, Tile, TileClass, Transition};
use tilec::{ComposeError, Session};

// ── Test helpers ────────────────────────────────────────────────────────────

/// A chain tile: one `in`, `outs` out locations, a final body location.
fn chain(outs: usize) -> Tile {
    let mut t = Tile::new("")
        .with_location(Location::new("entry").with_role(Role::In).with_comment("c = 0"))
        .with_location(Location::new("body").final_location())
        .with_transition(Transition::new("step", "entry", "body").with_guard("c < 3"));
    for o in 0..outs {
        let id = format!("exit{o}");
        t = t
            .with_location(Location::new(id.clone()).with_role(Role::Out))
            .with_transition(Transition::new(format!("leave{o}"), "body", id));
    }
    t
}

/// Two `in` locations feeding one final location.
fn join() -> Tile {
    Tile::new("")
        .with_location(Location::new("left").with_role(Role::In))
        .with_location(Location::new("right").with_role(Role::In))
        .with_location(Location::new("done").final_location())
        .with_transition(Transition::new("l", "left", "done"))
        .with_transition(Transition::new("r", "right", "done"))
}

fn source() -> MemoryTileSource {
    MemoryTileSource::new()
        .with("t1", TileClass::Accepting, chain(1))
        .with("t2", TileClass::Accepting, chain(1))
        .with("t3", TileClass::Accepting, chain(1))
        .with("t4", TileClass::Binary, chain(2))
        .with("t5", TileClass::Ternary, chain(3))
        .with("join", TileClass::Accepting, join())
        .with(
            "lo",
            TileClass::Accepting,
            chain(1).with_parameter_bounds("0:5|8:inf"),
        )
        .with(
            "hi",
            TileClass::Accepting,
            chain(1).with_parameter_bounds("3:10"),
        )
}

fn session() -> Session<MemoryTileSource> {
    let src = source();
    let catalog = src.catalog().unwrap();
    Session::new(src, catalog)
}

fn identifiers(tile: &Tile) -> HashSet<String> {
    tile.locations
        .iter()
        .map(|l| l.id.clone())
        .chain(tile.transitions.iter().map(|t| t.id.clone()))
        .collect()
}

fn pairs(bounds: &[Bound]) -> Vec<(f64, f64)> {
    bounds.iter().map(|b| (b.low, b.high)).collect()
}

// ── Connectors ──────────────────────────────────────────────────────────────

#[test]
fn size_matched_adds_one_edge_per_out() {
    let mut s = session();
    let c = s.compose("pair", "t1 + t2").unwrap();
    let one = chain(1);
    assert_eq!(c.tile.locations.len(), 2 * one.locations.len());
    assert_eq!(c.tile.transitions.len(), 2 * one.transitions.len() + 1);
    assert_eq!(c.tile.name, "(t1 + t2)");
}

#[test]
fn size_matched_wires_every_out_in_order() {
    let mut s = session();
    let c = s.compose("wide", "t4 + join").unwrap();
    let base = chain(2).transitions.len() + join().transitions.len();
    assert_eq!(c.tile.transitions.len(), base + 2);
    let new: Vec<(&str, &str)> = c.tile.transitions[base..]
        .iter()
        .map(|t| (t.source.as_str(), t.target.as_str()))
        .collect();
    assert_eq!(new, vec![("exit0_0", "left_1"), ("exit1_0", "right_1")]);
}

#[test]
fn size_matched_mismatch_is_fatal() {
    let mut s = session();
    let err = s.compose("bad", "t4 + t2").unwrap_err();
    match err {
        ComposeError::ConnectionArityMismatch { operator, detail } => {
            assert_eq!(operator.symbol(), "+");
            assert!(detail.contains("2 out"), "detail: {detail}");
        }
        other => panic!("expected ConnectionArityMismatch, got {other:?}"),
    }
}

#[test]
fn single_edge_uses_first_out_only() {
    let mut s = session();
    let c = s.compose("one", "t4 +1 t1").unwrap();
    let new_edge = c.tile.transitions.last().unwrap();
    assert_eq!(new_edge.source, "exit0_0");
    assert_eq!(new_edge.target, "entry_1");
    // The second out stays a boundary location.
    assert_eq!(c.tile.boundary(Role::Out), vec!["exit1_0", "exit0_1"]);
}

#[test]
fn new_edge_carries_target_setup() {
    let mut s = session();
    let c = s.compose("pair", "t1 + t2").unwrap();
    let edge = c.tile.transitions.last().unwrap();
    assert_eq!(edge.id, "exit0_0->entry_1");
    assert_eq!(edge.assignment.as_deref(), Some("c = 0"));
    assert!(edge.guard.is_none());
}

#[test]
fn consumed_endpoints_lose_roles() {
    let mut s = session();
    let c = s.compose("pair", "t1 + t2").unwrap();
    assert_eq!(c.tile.boundary(Role::In), vec!["entry_0"]);
    assert_eq!(c.tile.boundary(Role::Out), vec!["exit0_1"]);
    assert!(c.tile.location("exit0_0").unwrap().role.is_none());
    assert!(c.tile.location("entry_1").unwrap().role.is_none());
}

#[test]
fn tree_fan_out_with_grouped_branches() {
    let mut s = session();
    let c = s.compose("tree", "t4 ++ (t1 + t3) (t2 + t3)").unwrap();
    let leaves = chain(2).transitions.len() + 4 * chain(1).transitions.len();
    let locations = chain(2).locations.len() + 4 * chain(1).locations.len();
    assert_eq!(c.tile.locations.len(), locations);
    // Two tree edges plus one size-matched edge per branch.
    assert_eq!(c.tile.transitions.len(), leaves + 4);
    assert_eq!(c.tile.name, "(t4 ++ (t1 + t3) (t2 + t3))");
    assert!(c.tile.validate().is_ok());
}

#[test]
fn tree_fan_out_needs_two_outs_on_root() {
    let mut s = session();
    let err = s.compose("bad", "t5 ++ t1 t2").unwrap_err();
    assert!(matches!(err, ComposeError::ConnectionArityMismatch { .. }));
}

/// One `in`, one `out`, nothing marked final.
fn plain() -> Tile {
    Tile::new("")
        .with_location(Location::new("i").with_role(Role::In))
        .with_location(Location::new("o").with_role(Role::Out))
        .with_transition(Transition::new("e", "i", "o"))
}

#[test]
fn tiles_without_final_location_compose() {
    let src = MemoryTileSource::new()
        .with("t1", TileClass::Accepting, plain())
        .with("t2", TileClass::Accepting, plain())
        .with("t3", TileClass::Accepting, plain());
    let catalog = src.catalog().unwrap();
    let mut s = Session::new(src, catalog);

    let c = s.compose("r", "t1 + t2").unwrap();
    assert!(c.diagnostics.is_empty());
    assert_eq!(c.tile.transitions.len(), 3);
    assert_eq!(c.tile.transitions[2].id, "o_0->i_1");

    let c = s.compose("r", "(t1 + t2) + t3").unwrap();
    assert_eq!(c.tile.boundary(Role::In), vec!["i_2"]);
    assert_eq!(c.tile.boundary(Role::Out), vec!["o_4"]);
    assert!(c.tile.locations.iter().all(|l| !l.is_final));
}

#[test]
fn ternary_class_shape_is_left_to_connectors() {
    let src = source().with("fan", TileClass::Ternary, chain(2));
    let catalog = src.catalog().unwrap();
    let mut s = Session::new(src, catalog);
    let c = s.compose("tree", "fan ++ t1 t2").unwrap();
    assert_eq!(c.tile.boundary(Role::Out), vec!["exit0_1", "exit0_2"]);
}

// ── Grouping and renaming ───────────────────────────────────────────────────

#[test]
fn grouping_either_way_composes() {
    let mut s = session();
    let left = s.compose("left", "(t1 + t2) + t3").unwrap();
    let right = s.compose("right", "t1 + (t2 + t3)").unwrap();
    assert_eq!(left.tile.locations.len(), right.tile.locations.len());
    assert_eq!(left.tile.transitions.len(), right.tile.transitions.len());
    assert!(!left.tile.locations.is_empty());
    assert!(identifiers(&left.tile).is_disjoint(&identifiers(&right.tile)));
}

#[test]
fn repeated_reference_gets_fresh_namespace() {
    let mut s = session();
    let c = s.compose("twice", "t1 + t1").unwrap();
    assert!(c.tile.validate().is_ok());
    let ids = identifiers(&c.tile);
    assert!(ids.contains("entry_0") && ids.contains("entry_1"));
}

#[test]
fn deep_nesting_does_not_recurse() {
    let mut s = session();
    let depth = 2_000;
    let expr = format!("{}t1{}", "(".repeat(depth), ")".repeat(depth));
    let c = s.compose("deep", &expr).unwrap();
    assert!(c.diagnostics.is_empty());
    assert_eq!(c.tile.name, "t1");
}

// ── Bounds ──────────────────────────────────────────────────────────────────

#[test]
fn bound_label_on_fresh_run_is_stored_as_is() {
    let mut s = session();
    let c = s.compose("lo", "lo").unwrap();
    assert_eq!(pairs(&c.bounds), vec![(0.0, 5.0), (8.0, f64::MAX)]);
    assert_eq!(pairs(s.bounds("lo").unwrap()), pairs(&c.bounds));
}

#[test]
fn merged_bounds_intersect() {
    let mut s = session();
    let c = s.compose("both", "lo + hi").unwrap();
    assert_eq!(pairs(&c.bounds), vec![(3.0, 5.0), (8.0, 10.0)]);
    assert!(c.bounds.iter().all(|b| !b.is_disjoint));
}

#[test]
fn runs_do_not_share_bounds() {
    let mut s = session();
    s.compose("first", "lo + hi").unwrap();
    let second = s.compose("second", "t1 + t2").unwrap();
    assert!(second.bounds.is_empty());
    assert_eq!(s.bounds("first").unwrap().len(), 2);
}

// ── Recovery ────────────────────────────────────────────────────────────────

#[test]
fn stray_bracket_warns_once_and_keeps_result() {
    let mut s = session();
    let clean = s.compose("clean", "t1 + t2").unwrap();
    s.reset_namespaces();
    let noisy = s.compose("noisy", "t1 + t2 ]").unwrap();
    assert_eq!(noisy.diagnostics.len(), 1);
    assert_eq!(noisy.diagnostics[0].code, codes::UNKNOWN_TOKEN);
    assert_eq!(clean.tile, noisy.tile);
}

#[test]
fn unclosed_group_closes_at_end() {
    let mut s = session();
    let c = s.compose("open", "t1 + (t2 + t3").unwrap();
    assert_eq!(c.diagnostics.len(), 1);
    assert_eq!(c.diagnostics[0].code, codes::UNCLOSED_OPEN);
    assert_eq!(c.tile.name, "(t1 + (t2 + t3))");
}

#[test]
fn unknown_characters_are_skipped() {
    let mut s = session();
    let c = s.compose("junk", "t1 + $t2").unwrap();
    assert_eq!(c.skipped.len(), 1);
    assert_eq!(c.tile.name, "(t1 + t2)");
}

#[test]
fn operator_without_operands_underflows() {
    let mut s = session();
    let err = s.compose("short", "t1 +").unwrap_err();
    assert!(matches!(
        err,
        ComposeError::StackUnderflow {
            needed: 2,
            available: 1,
            ..
        }
    ));
}

#[test]
fn nothing_to_compose() {
    let mut s = session();
    let err = s.compose("empty", "  ").unwrap_err();
    assert!(matches!(err, ComposeError::EmptyComposition));
}
