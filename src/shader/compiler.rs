//! Shader Source Compiler
//!
//! Flattens a node graph into one complete shader source string. The
//! static fragments of every reachable node are concatenated in pre-order
//! (a node's declarations appear before its inputs'), and the instance
//! fragments are concatenated in post-order inside `main` (a node's
//! statements appear after everything it depends on), with the root's own
//! instance fragment closing the function.
//!
//! A visited set keyed on node UUID guarantees each node is emitted
//! exactly once even when several parents share it. The set is local to
//! one invocation; compiling the vertex and fragment roots of a program
//! is two fully independent walks, even when the two graphs share nodes.

use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::errors::{EmberError, Result};
use crate::shader::node::{ShaderNodeRef, Slot};

const STATIC_HEADER: &str = "// THIS IS GENERATED CODE!\n\n";
const MAIN_HEADER: &str = "// This is generated code, do not try to directly modify!\n\nvoid main() {\n";
const MAIN_FOOTER: &str = "\n}\n// This is generated code, do not try to directly modify!\n";

/// Generates complete shader source for the graph rooted at `root`.
///
/// Pure function of the graph: the same graph always produces the same
/// bytes. Fails only if the graph turns out to be cyclic, which is a
/// structural bug in the caller's graph: shared nodes are fine, cycles
/// are not.
pub fn generate(root: &ShaderNodeRef) -> Result<String> {
    let mut static_code = String::from(STATIC_HEADER);
    static_code.push_str(root.static_code());

    let mut main_code = String::from(MAIN_HEADER);

    let mut visited = FxHashSet::default();
    let mut on_path = FxHashSet::default();
    on_path.insert(root.uuid());

    for slot in root.inputs() {
        visit(slot, &mut visited, &mut on_path, &mut static_code, &mut main_code)?;
    }

    // The root itself is never entered into the visited set; its instance
    // fragment always terminates the function body.
    main_code.push_str(root.instance_code());
    main_code.push_str(MAIN_FOOTER);

    static_code.push_str(&main_code);
    Ok(static_code)
}

fn visit(
    slot: &Slot,
    visited: &mut FxHashSet<Uuid>,
    on_path: &mut FxHashSet<Uuid>,
    static_code: &mut String,
    main_code: &mut String,
) -> Result<()> {
    // Unconnected inputs contribute nothing.
    let Some(node) = slot else {
        return Ok(());
    };

    let id = node.uuid();
    if on_path.contains(&id) {
        return Err(EmberError::ShaderGraphCycle { node: id });
    }
    if !visited.insert(id) {
        // Shared sub-expression, already emitted.
        return Ok(());
    }

    // Forward order: declarations before the inputs'.
    static_code.push_str(node.static_code());

    on_path.insert(id);
    for child in node.inputs() {
        visit(child, visited, on_path, static_code, main_code)?;
    }
    on_path.remove(&id);

    // Tail order: statements after everything they depend on.
    main_code.push_str(node.instance_code());
    Ok(())
}
