//! Net builder: lowers parsed MIR functions into a Petri net.
//!
//! Per function: a CFG place per non-cleanup basic block (plus entry/exit),
//! one transition per CFG edge, and — for edges the parser identified as a
//! lock acquire or guard drop — the mutex's free/held places wired in so
//! that at most one transition can hold a given mutex at a time. See
//! `spec.md` §4.C for the construction this mirrors exactly.

use std::collections::HashSet;

use tracing::debug;

use crate::mir::{MirFunction, Terminator};
use crate::net::{Arc, PetriNet, Place, PlaceKind, Transition, TransitionKind, Warning};
use crate::parser::{extract_first_local, is_mutex_lock_callee};

/// Build a Petri net from parsed functions. Deterministic and idempotent:
/// calling this twice on the same input yields the same ids, insertion
/// order, and arc-counter assignment.
pub fn build(functions: &[MirFunction], entry_fn: &str, max_fns: Option<usize>) -> PetriNet {
    let mut net = PetriNet::default();
    let mut ctx = BuildContext::default();

    let fns_to_process = match max_fns {
        Some(n) => &functions[..functions.len().min(n)],
        None => functions,
    };

    for func in fns_to_process {
        build_function(func, entry_fn, &mut net, &mut ctx);
    }

    debug!(
        places = net.places.len(),
        transitions = net.transitions.len(),
        arcs = net.arcs.len(),
        "built net"
    );

    net
}

#[derive(Default)]
struct BuildContext {
    seen_places: HashSet<String>,
    seen_transitions: HashSet<String>,
    arc_counter: u64,
}

impl BuildContext {
    fn add_place(&mut self, net: &mut PetriNet, place: Place) {
        if self.seen_places.insert(place.id.clone()) {
            if place.init_tokens > 0 {
                net.initial_marking
                    .insert(place.id.clone(), place.init_tokens);
            }
            net.places.push(place);
        }
    }

    fn add_transition(&mut self, net: &mut PetriNet, transition: Transition) {
        if self.seen_transitions.insert(transition.id.clone()) {
            net.transitions.push(transition);
        }
    }

    fn add_arc(&mut self, net: &mut PetriNet, source: &str, target: &str) {
        self.arc_counter += 1;
        net.arcs.push(Arc {
            id: format!("arc_{}", self.arc_counter),
            source: source.to_string(),
            target: target.to_string(),
            weight: 1,
        });
    }

    fn ensure_mutex_places(&mut self, net: &mut PetriNet, key: &str) {
        self.add_place(
            net,
            Place {
                id: format!("p_mutex_{key}_free"),
                name: format!("mutex_{key}_free"),
                kind: PlaceKind::MutexFree,
                init_tokens: 1,
                capacity: None,
            },
        );
        self.add_place(
            net,
            Place {
                id: format!("p_mutex_{key}_held"),
                name: format!("mutex_{key}_held"),
                kind: PlaceKind::MutexHeld,
                init_tokens: 0,
                capacity: None,
            },
        );
    }
}

/// What a terminator's CFG edge should do to a mutex, if anything.
enum Resource {
    None,
    Lock(String),
    Unlock(String),
}

fn build_function(func: &MirFunction, entry_fn: &str, net: &mut PetriNet, ctx: &mut BuildContext) {
    let f = &func.name;
    let is_entry = f == entry_fn;

    let p_entry_id = format!("p_{f}_entry");
    ctx.add_place(
        net,
        Place {
            id: p_entry_id.clone(),
            name: format!("{f}_entry"),
            kind: PlaceKind::Cfg,
            init_tokens: if is_entry { 1 } else { 0 },
            capacity: None,
        },
    );

    let p_exit_id = format!("p_{f}_exit");
    ctx.add_place(
        net,
        Place {
            id: p_exit_id.clone(),
            name: format!("{f}_exit"),
            kind: PlaceKind::Cfg,
            init_tokens: 0,
            capacity: None,
        },
    );

    let non_cleanup: Vec<&crate::mir::BasicBlock> =
        func.basic_blocks.iter().filter(|b| !b.is_cleanup).collect();
    let bb_places: HashSet<u32> = non_cleanup.iter().map(|b| b.id).collect();

    for bb in &non_cleanup {
        let pid = format!("p_{f}_bb{}", bb.id);
        ctx.add_place(
            net,
            Place {
                id: pid,
                name: format!("{f}_bb{}", bb.id),
                kind: PlaceKind::Cfg,
                init_tokens: 0,
                capacity: None,
            },
        );
    }

    if let Some(first_bb) = non_cleanup.first() {
        let t_id = format!("t_{f}_start");
        ctx.add_transition(
            net,
            Transition {
                id: t_id.clone(),
                name: format!("{f}_start"),
                kind: TransitionKind::Cfg,
                op: None,
            },
        );
        ctx.add_arc(net, &p_entry_id, &t_id);
        ctx.add_arc(net, &t_id, &format!("p_{f}_bb{}", first_bb.id));
    }

    for bb in &non_cleanup {
        let src_place = format!("p_{f}_bb{}", bb.id);
        let bb_label = format!("bb{}", bb.id);

        let Some(terminator) = &bb.terminator else {
            net.warnings.push(Warning {
                function: f.clone(),
                basic_block: bb_label,
                line: bb.line,
                reason: "no terminator found".to_string(),
                callee: None,
            });
            continue;
        };

        let (targets, resource) = successors_and_resource(func, terminator, f, &bb_label, bb.line, net);

        for target_bb in &targets {
            if !bb_places.contains(target_bb) {
                // Target is a cleanup block (or otherwise never got a place
                // in step 2) — no place to route this edge to, so skip the
                // whole transition rather than leave a dangling arc.
                continue;
            }
            let t_id = format!("t_{f}_bb{}_to_bb{}", bb.id, target_bb);
            let kind = match &resource {
                Resource::Lock(_) => TransitionKind::Lock,
                Resource::Unlock(_) => TransitionKind::Unlock,
                Resource::None => TransitionKind::Cfg,
            };
            let op = match &resource {
                Resource::Lock(key) | Resource::Unlock(key) => Some(key.clone()),
                Resource::None => None,
            };
            ctx.add_transition(
                net,
                Transition {
                    id: t_id.clone(),
                    name: format!("{f}_bb{}_to_bb{}", bb.id, target_bb),
                    kind,
                    op,
                },
            );
            ctx.add_arc(net, &src_place, &t_id);
            ctx.add_arc(net, &t_id, &format!("p_{f}_bb{target_bb}"));

            match &resource {
                Resource::Lock(key) => {
                    ctx.ensure_mutex_places(net, key);
                    ctx.add_arc(net, &format!("p_mutex_{key}_free"), &t_id);
                    ctx.add_arc(net, &t_id, &format!("p_mutex_{key}_held"));
                }
                Resource::Unlock(key) => {
                    ctx.ensure_mutex_places(net, key);
                    ctx.add_arc(net, &format!("p_mutex_{key}_held"), &t_id);
                    ctx.add_arc(net, &t_id, &format!("p_mutex_{key}_free"));
                }
                Resource::None => {}
            }
        }

        if matches!(terminator, Terminator::Return) {
            let t_id = format!("t_{f}_bb{}_return", bb.id);
            ctx.add_transition(
                net,
                Transition {
                    id: t_id.clone(),
                    name: format!("{f}_bb{}_return", bb.id),
                    kind: TransitionKind::Cfg,
                    op: None,
                },
            );
            ctx.add_arc(net, &src_place, &t_id);
            ctx.add_arc(net, &t_id, &p_exit_id);
        }
    }
}

/// The successor basic-block list and resource action for a terminator,
/// per the table in `spec.md` §4.C. Warnings for irrecoverable irregularities
/// (drop of a non-guard, an unresolvable lock call, an unrecognized callee)
/// are appended to `net` here.
fn successors_and_resource(
    func: &MirFunction,
    terminator: &Terminator,
    function: &str,
    bb_label: &str,
    line: usize,
    net: &mut PetriNet,
) -> (Vec<u32>, Resource) {
    match terminator {
        Terminator::Goto { target } => (vec![*target], Resource::None),
        Terminator::Return => (vec![], Resource::None),
        Terminator::SwitchInt { targets } => (targets.clone(), Resource::None),
        Terminator::Drop {
            local,
            return_target,
            ..
        } => {
            let resource = match func.guard_to_mutex_key.get(local) {
                Some(key) => Resource::Unlock(key.clone()),
                None => {
                    net.warnings.push(Warning {
                        function: function.to_string(),
                        basic_block: bb_label.to_string(),
                        line,
                        reason: format!("drop({local}) not in guard binding table"),
                        callee: Some("drop".to_string()),
                    });
                    Resource::None
                }
            };
            (vec![*return_target], resource)
        }
        Terminator::Call {
            callee,
            args,
            return_target,
            ..
        } => {
            let resource = if is_mutex_lock_callee(callee) {
                match extract_first_local(args) {
                    Some(local) => Resource::Lock(func.resolve_mutex_key(&local)),
                    None => {
                        net.warnings.push(Warning {
                            function: function.to_string(),
                            basic_block: bb_label.to_string(),
                            line,
                            reason: "Mutex::lock call but no local in args".to_string(),
                            callee: Some(callee.clone()),
                        });
                        Resource::None
                    }
                }
            } else {
                net.warnings.push(Warning {
                    function: function.to_string(),
                    basic_block: bb_label.to_string(),
                    line,
                    reason: "unrecognized call, treated as CFG edge".to_string(),
                    callee: Some(callee.clone()),
                });
                Resource::None
            };
            (vec![*return_target], resource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const MINIMAL_MIR: &str = r#"
fn main() -> () {
    let _1: std::sync::Mutex<i32>;
    let _2: std::sync::MutexGuard<'_, i32>;
    bb0: {
        _2 = std::sync::Mutex::<i32>::lock(move _1) -> [return: bb1, unwind: bb2];
    }
    bb1: {
        drop(_2) -> [return: bb2, unwind: bb2];
    }
    bb2: {
        return;
    }
}
"#;

    #[test]
    fn mutex_places_exist_with_correct_initial_marking() {
        let funcs = parse(MINIMAL_MIR).unwrap();
        let net = build(&funcs, "main", None);
        let free = net.place_by_id("p_mutex__1_free").unwrap();
        let held = net.place_by_id("p_mutex__1_held").unwrap();
        assert_eq!(free.init_tokens, 1);
        assert_eq!(held.init_tokens, 0);
    }

    #[test]
    fn entry_place_has_single_initial_token_for_entry_fn() {
        let funcs = parse(MINIMAL_MIR).unwrap();
        let net = build(&funcs, "main", None);
        let entry = net.place_by_id("p_main_entry").unwrap();
        assert_eq!(entry.init_tokens, 1);
        let exit = net.place_by_id("p_main_exit").unwrap();
        assert_eq!(exit.init_tokens, 0);
    }

    #[test]
    fn lock_transition_has_mutex_arcs() {
        let funcs = parse(MINIMAL_MIR).unwrap();
        let net = build(&funcs, "main", None);
        let lock_t = net
            .transitions
            .iter()
            .find(|t| t.kind == TransitionKind::Lock && t.op.as_deref() == Some("_1"))
            .unwrap();
        let arcs: Vec<(&str, &str)> = net
            .arcs
            .iter()
            .map(|a| (a.source.as_str(), a.target.as_str()))
            .collect();
        assert!(arcs.contains(&("p_mutex__1_free", lock_t.id.as_str())));
        assert!(arcs.contains(&(lock_t.id.as_str(), "p_mutex__1_held")));
    }

    #[test]
    fn unlock_transition_has_mutex_arcs() {
        let funcs = parse(MINIMAL_MIR).unwrap();
        let net = build(&funcs, "main", None);
        let unlock_t = net
            .transitions
            .iter()
            .find(|t| t.kind == TransitionKind::Unlock && t.op.as_deref() == Some("_1"))
            .unwrap();
        let arcs: Vec<(&str, &str)> = net
            .arcs
            .iter()
            .map(|a| (a.source.as_str(), a.target.as_str()))
            .collect();
        assert!(arcs.contains(&("p_mutex__1_held", unlock_t.id.as_str())));
        assert!(arcs.contains(&(unlock_t.id.as_str(), "p_mutex__1_free")));
    }

    #[test]
    fn switch_int_fans_out_to_distinct_transitions() {
        let mir = r#"
fn main() -> () {
    bb0: {
        switchInt(move _4) -> [0: bb1, 1: bb2, otherwise: bb3];
    }
    bb1: {
        return;
    }
    bb2: {
        return;
    }
    bb3: {
        return;
    }
}
"#;
        let funcs = parse(mir).unwrap();
        let net = build(&funcs, "main", None);
        let from_bb0: Vec<&Transition> = net
            .transitions
            .iter()
            .filter(|t| t.id.starts_with("t_main_bb0_to_bb"))
            .collect();
        assert_eq!(from_bb0.len(), 3);
    }

    #[test]
    fn unrecognized_callee_yields_cfg_transition_and_warning() {
        let mir = r#"
fn main() -> () {
    bb0: {
        _1 = foo::bar(move _2) -> [return: bb1, unwind: bb2];
    }
    bb1: {
        return;
    }
}
"#;
        let funcs = parse(mir).unwrap();
        let net = build(&funcs, "main", None);
        let t = net
            .transitions
            .iter()
            .find(|t| t.id == "t_main_bb0_to_bb1")
            .unwrap();
        assert_eq!(t.kind, TransitionKind::Cfg);
        assert!(net
            .warnings
            .iter()
            .any(|w| w.reason == "unrecognized call, treated as CFG edge" && w.callee.as_deref() == Some("foo::bar")));
    }

    #[test]
    fn missing_terminator_emits_warning_and_no_outgoing_transition() {
        let mir = r#"
fn main() -> () {
    bb0: {
        _1 = const 0_i32;
    }
}
"#;
        let funcs = parse(mir).unwrap();
        let net = build(&funcs, "main", None);
        assert!(net
            .warnings
            .iter()
            .any(|w| w.reason == "no terminator found"));
        assert!(!net.transitions.iter().any(|t| t.id.starts_with("t_main_bb0_to")));
    }

    #[test]
    fn cleanup_blocks_contribute_nothing() {
        let mir = r#"
fn main() -> () {
    bb0: {
        return;
    }
    bb1 (cleanup): {
        return;
    }
}
"#;
        let funcs = parse(mir).unwrap();
        let net = build(&funcs, "main", None);
        assert!(net.place_by_id("p_main_bb1").is_none());
        assert!(!net.transitions.iter().any(|t| t.id.contains("bb1")));
    }

    #[test]
    fn edge_into_a_cleanup_block_produces_no_dangling_arc() {
        let mir = r#"
fn main() -> () {
    bb0: {
        goto -> bb1;
    }
    bb1 (cleanup): {
        return;
    }
}
"#;
        let funcs = parse(mir).unwrap();
        let net = build(&funcs, "main", None);
        assert!(!net.transitions.iter().any(|t| t.id == "t_main_bb0_to_bb1"));
        let live_ids: HashSet<&str> = net
            .places
            .iter()
            .map(|p| p.id.as_str())
            .chain(net.transitions.iter().map(|t| t.id.as_str()))
            .collect();
        for arc in &net.arcs {
            assert!(live_ids.contains(arc.source.as_str()));
            assert!(live_ids.contains(arc.target.as_str()));
        }
    }

    #[test]
    fn max_fns_limits_translated_functions() {
        let mir = r#"
fn main() -> () {
    bb0: {
        return;
    }
}
fn helper() -> () {
    bb0: {
        return;
    }
}
"#;
        let funcs = parse(mir).unwrap();
        assert_eq!(funcs.len(), 2);
        let net = build(&funcs, "main", Some(1));
        assert!(net.place_by_id("p_main_entry").is_some());
        assert!(net.place_by_id("p_helper_entry").is_none());
    }

    #[test]
    fn idempotent_construction_yields_equal_triples() {
        let funcs = parse(MINIMAL_MIR).unwrap();
        let net_a = build(&funcs, "main", None);
        let net_b = build(&funcs, "main", None);
        let triples = |net: &PetriNet| -> Vec<(String, String, String)> {
            net.arcs
                .iter()
                .map(|a| (a.id.clone(), a.source.clone(), a.target.clone()))
                .collect()
        };
        assert_eq!(triples(&net_a), triples(&net_b));
    }

    #[test]
    fn mutex_subnet_token_conservation() {
        let funcs = parse(MINIMAL_MIR).unwrap();
        let net = build(&funcs, "main", None);
        let free = net.place_by_id("p_mutex__1_free").unwrap();
        let held = net.place_by_id("p_mutex__1_held").unwrap();
        assert_eq!(free.init_tokens + held.init_tokens, 1);
    }
}
