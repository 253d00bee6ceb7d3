//! MIR data model for mir2pnml.
//!
//! Pure data: identity, structure, and the two binding tables a function
//! accumulates while its basic blocks are scanned. Nothing here mutates
//! after parsing — a [`MirFunction`] is write-once, like [`crate::net::PetriNet`].

use indexmap::IndexMap;

/// A `let [mut] _N: TYPE;` declaration, recorded once before the first
/// basic block of its function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    /// The local's identity, e.g. `_3`.
    pub name: String,
    /// The free-form type string as it appeared in the dump.
    pub ty: String,
    pub is_mut: bool,
}

/// The final instruction of a basic block, determining its successors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Goto {
        target: u32,
    },
    Return,
    SwitchInt {
        /// Every `bbN` occurrence in the target list, left to right,
        /// duplicates preserved.
        targets: Vec<u32>,
    },
    Drop {
        local: String,
        return_target: u32,
        unwind_target: Option<u32>,
    },
    Call {
        lhs: Option<String>,
        callee: String,
        args: String,
        return_target: u32,
        unwind_target: Option<u32>,
    },
}

/// A maximal straight-line sequence of statements ending in one terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: u32,
    pub is_cleanup: bool,
    /// Opaque statement lines, retained only for diagnostics.
    pub statements: Vec<String>,
    /// Absent when no recognizable terminator was found in the block body.
    pub terminator: Option<Terminator>,
    /// Approximate source line of the block header, for warnings.
    pub line: usize,
}

/// One parsed function: its locals, its basic blocks in source order, and
/// the two auxiliary relations the parser accumulates while scanning them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirFunction {
    pub name: String,
    pub locals: Vec<LocalDecl>,
    pub basic_blocks: Vec<BasicBlock>,
    /// `_i = &_j;` → `ref_to_base[_i] = _j`. Single-level; not transitively
    /// resolved here (the builder's key resolution does one lookup).
    pub ref_to_base: IndexMap<String, String>,
    /// Guard local → canonical mutex-key local, populated at lock call
    /// sites and propagated through `unwrap`/`expect`.
    pub guard_to_mutex_key: IndexMap<String, String>,
}

impl MirFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Resolve `local` through `ref_to_base` one level, falling back to the
    /// local itself when it is not a recorded reference.
    pub fn resolve_mutex_key(&self, local: &str) -> String {
        self.ref_to_base
            .get(local)
            .cloned()
            .unwrap_or_else(|| local.to_string())
    }

    pub fn block(&self, id: u32) -> Option<&BasicBlock> {
        self.basic_blocks.iter().find(|b| b.id == id)
    }
}
