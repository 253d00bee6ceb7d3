//! Petri-net data model: a bipartite place/transition graph.
//!
//! Places and transitions connect only through arcs, and arcs only ever
//! join a place to a transition or a transition to a place — the
//! bipartite invariant is enforced structurally by [`crate::builder`],
//! not by this module, since these types carry no behavior of their own.

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Cfg,
    MutexFree,
    MutexHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Cfg,
    Lock,
    Unlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub kind: PlaceKind,
    pub init_tokens: u64,
    pub capacity: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub kind: TransitionKind,
    /// The mutex key this transition acts on, set when `kind != Cfg`.
    pub op: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arc {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// A tolerated local irregularity, recorded rather than raised. See
/// `spec.md` §4.B/§4.C for the full catalogue of reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub function: String,
    pub basic_block: String,
    pub line: usize,
    pub reason: String,
    pub callee: Option<String>,
}

/// The synthesized net: insertion-ordered places/transitions/arcs, an
/// initial marking holding only non-zero entries, and the warnings
/// collected along the way. Write-once: nothing here is mutated once
/// [`crate::builder::build`] returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PetriNet {
    pub places: Vec<Place>,
    pub transitions: Vec<Transition>,
    pub arcs: Vec<Arc>,
    pub initial_marking: IndexMap<String, u64>,
    pub warnings: Vec<Warning>,
}

impl PetriNet {
    pub fn place_by_id(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    pub fn transition_by_id(&self, id: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    /// Serialize the net to the JSON shape backing the CLI's `--dump-json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_includes_top_level_fields() {
        let net = PetriNet::default();
        let json = net.to_json().unwrap();
        for field in ["places", "transitions", "arcs", "initial_marking", "warnings"] {
            assert!(json.contains(field));
        }
    }
}
