//! Regex-driven MIR text parser.
//!
//! Splits the input into functions by brace-balancing, then classifies
//! each function body's lines in order: scope/debug lines are skipped,
//! `let` declarations are collected before the first basic block, and
//! basic-block bodies are scanned for reference assignments and a
//! terminator. See `spec.md` §4.B for the exact grammar this follows.
//!
//! Best-effort by contract: a hard [`ParseError`] is raised only for
//! structural catastrophe (unbalanced braces). Everything else —
//! missing terminators, malformed calls, unrecognized callees — is
//! tolerated here and surfaced later as a warning by [`crate::builder`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::mir::{BasicBlock, LocalDecl, MirFunction, Terminator};

static FN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fn\s+(\w+)\s*\([^)]*\)\s*->\s*[^{]*\{").unwrap());
static LET_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^let\s+(mut\s+)?(_\d+)\s*:\s*([^;]+);").unwrap());
static REF_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(_\d+)\s*=\s*&(_\d+)\s*;").unwrap());
static BB_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bb(\d+)\s*(?:\(cleanup\))?\s*:\s*\{").unwrap());
static BB_HEADER_SEARCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*bb(\d+)\s*(?:\(cleanup\))?\s*:\s*\{").unwrap());
static SCOPE_OR_DEBUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(scope\s+\d+|debug\s+)").unwrap());
static GOTO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"goto\s*->\s*bb(\d+)\s*;").unwrap());
static RETURN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"return\s*;").unwrap());
static DROP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"drop\s*\(([^)]+)\)\s*->\s*\[return:\s*bb(\d+)(?:,\s*unwind:\s*(?:bb(\d+)|continue|terminate[^\]]*))?\]\s*;",
    )
    .unwrap()
});
static SWITCH_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"switchInt\s*\([^)]+\)\s*->\s*\[([^\]]+)\]\s*;").unwrap());
static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(\w+)\s*=\s*)?([^(]+)\(([^)]*)\)\s*->\s*\[return:\s*bb(\d+)(?:,\s*unwind:\s*(?:bb(\d+)|continue|terminate[^\]]*))?\]\s*;",
    )
    .unwrap()
});
static SWITCH_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"bb(\d+)").unwrap());
static FIRST_LOCAL_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|,)\s*(?:move\s+)?(_\d+)\b").unwrap());

/// Parse MIR text into a function list, or fail with a structural
/// [`ParseError`]. See `spec.md` §4.B.
pub fn parse(text: &str) -> Result<Vec<MirFunction>, ParseError> {
    let mut functions = Vec::new();
    let mut pos = 0usize;

    while let Some(caps) = FN_HEADER.captures_at(text, pos) {
        let m = caps.get(0).unwrap();
        let fn_name = caps.get(1).unwrap().as_str().to_string();
        let fn_start_line = text[..m.start()].matches('\n').count() + 1;

        let body_start = m.end();
        let mut depth = 1i32;
        let mut i = body_start;
        let bytes = text.as_bytes();
        while i < bytes.len() && depth > 0 {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        if depth > 0 {
            let mut err = ParseError::new("unbalanced braces in function body")
                .with_function(fn_name)
                .with_line(fn_start_line);
            if let Some(last_bb) = BB_HEADER_SEARCH
                .captures_iter(&text[body_start..i])
                .last()
            {
                err = err.with_basic_block(format!("bb{}", &last_bb[1]));
            }
            return Err(err);
        }
        let fn_body = &text[body_start..i - 1];
        let func = parse_function_body(&fn_name, fn_body, fn_start_line)?;
        debug!(function = %func.name, blocks = func.basic_blocks.len(), "parsed function");
        functions.push(func);
        pos = i;
    }

    Ok(functions)
}

fn parse_function_body(
    fn_name: &str,
    body: &str,
    fn_start_line: usize,
) -> Result<MirFunction, ParseError> {
    let mut func = MirFunction::new(fn_name);
    let lines: Vec<&str> = body.split('\n').collect();
    let mut seen_bb = false;
    let mut i = 0usize;

    while i < lines.len() {
        let stripped = lines[i].trim();

        if SCOPE_OR_DEBUG.is_match(stripped) {
            i += 1;
            continue;
        }

        if !seen_bb {
            if let Some(caps) = LET_DECL.captures(stripped) {
                func.locals.push(LocalDecl {
                    name: caps.get(2).unwrap().as_str().to_string(),
                    ty: caps.get(3).unwrap().as_str().trim().to_string(),
                    is_mut: caps.get(1).is_some(),
                });
                i += 1;
                continue;
            }
        }

        if let Some(caps) = BB_HEADER.captures(stripped) {
            seen_bb = true;
            let bb_id: u32 = caps.get(1).unwrap().as_str().parse().unwrap_or(0);
            let is_cleanup = lines[i].contains("(cleanup)");
            let line = fn_start_line + i + 1;

            let mut block_lines: Vec<String> = Vec::new();
            let mut j = i + 1;
            while j < lines.len() {
                let bl = lines[j];
                let bl_stripped = bl.trim();
                if BB_HEADER.is_match(bl_stripped) {
                    break;
                }
                if bl_stripped == "}" {
                    j += 1;
                    break;
                }
                block_lines.push(bl_stripped.to_string());
                if let Some(caps) = REF_ASSIGN.captures(bl_stripped) {
                    func.ref_to_base
                        .entry(caps.get(1).unwrap().as_str().to_string())
                        .or_insert_with(|| caps.get(2).unwrap().as_str().to_string());
                }
                j += 1;
            }

            let terminator = find_terminator(&block_lines, &mut func);

            func.basic_blocks.push(BasicBlock {
                id: bb_id,
                is_cleanup,
                statements: block_lines,
                terminator,
                line,
            });
            i = j;
            continue;
        }

        i += 1;
    }

    Ok(func)
}

/// Scan a block's lines from the end; the first one that matches any
/// terminator pattern (priority: goto, return, drop, switchInt, call)
/// becomes the block's terminator.
fn find_terminator(block_lines: &[String], func: &mut MirFunction) -> Option<Terminator> {
    for line in block_lines.iter().rev() {
        if let Some(caps) = GOTO.captures(line) {
            return Some(Terminator::Goto {
                target: caps.get(1).unwrap().as_str().parse().unwrap_or(0),
            });
        }
        if RETURN.is_match(line) {
            return Some(Terminator::Return);
        }
        if let Some(caps) = DROP.captures(line) {
            return Some(Terminator::Drop {
                local: caps.get(1).unwrap().as_str().trim().to_string(),
                return_target: caps.get(2).unwrap().as_str().parse().unwrap_or(0),
                unwind_target: caps.get(3).and_then(|g| g.as_str().parse().ok()),
            });
        }
        if let Some(caps) = SWITCH_INT.captures(line) {
            let targets = SWITCH_TARGET
                .captures_iter(caps.get(1).unwrap().as_str())
                .filter_map(|c| c.get(1).unwrap().as_str().parse().ok())
                .collect();
            return Some(Terminator::SwitchInt { targets });
        }
        if let Some(caps) = CALL.captures(line) {
            let lhs = caps.get(1).map(|g| g.as_str().to_string());
            let callee = caps.get(2).unwrap().as_str().trim().to_string();
            let args = caps.get(3).unwrap().as_str().trim().to_string();
            let return_target = caps.get(4).unwrap().as_str().parse().unwrap_or(0);
            let unwind_target = caps.get(5).and_then(|g| g.as_str().parse().ok());

            bind_guard(func, &callee, &args, lhs.as_deref());

            return Some(Terminator::Call {
                lhs,
                callee,
                args,
                return_target,
                unwind_target,
            });
        }
    }
    None
}

/// Guard binding: lock calls bind a fresh guard to its resolved mutex key;
/// `unwrap`/`expect` on an existing guard propagates the binding. See
/// `spec.md` §4.B "Guard binding".
fn bind_guard(func: &mut MirFunction, callee: &str, args: &str, lhs: Option<&str>) {
    let Some(lhs) = lhs else { return };

    if is_mutex_lock_callee(callee) {
        if let Some(first_arg) = extract_first_local(args) {
            let key = func.resolve_mutex_key(&first_arg);
            func.guard_to_mutex_key
                .entry(lhs.to_string())
                .or_insert(key);
        }
    } else if callee.contains("::unwrap") || callee.contains("::expect") {
        if let Some(first_arg) = extract_first_local(args) {
            if let Some(key) = func.guard_to_mutex_key.get(&first_arg).cloned() {
                func.guard_to_mutex_key.entry(lhs.to_string()).or_insert(key);
            }
        }
    }
}

/// A callee matches the mutex-lock shape when it contains both `Mutex`
/// and `lock`, or the literal `mutex::lock` case-insensitively.
pub fn is_mutex_lock_callee(callee: &str) -> bool {
    (callee.contains("Mutex") && callee.contains("lock"))
        || callee.to_lowercase().contains("mutex::lock")
}

/// Extract the first local (`_N`) from a call's argument string, skipping
/// a leading `move`.
pub fn extract_first_local(args: &str) -> Option<String> {
    FIRST_LOCAL_ARG
        .captures(args.trim())
        .map(|c| c.get(1).unwrap().as_str().to_string())
}
