//! Energy-focused syntax tree walk
//!
//! Walks a tree-sitter parse of Python source, one handler per node kind,
//! tracking nested-scope context: the loop stack (its length is the current
//! loop nesting depth), the stack of open blocks (penalties project onto the
//! top), and the enclosing function names (for recursion detection). All
//! traversal state lives in a [`WalkState`] passed by reference through the
//! recursion, so a walk is re-entrant and testable in isolation.

use crate::models::{BlockMetrics, BlockType, Issue, IssueCategory};
use tree_sitter::Node;

/// Base energy costs per construct, calibrated for realistic penalties
pub(crate) const STATEMENT_ENERGY: f64 = 0.8;
pub(crate) const ARITHMETIC_ENERGY: f64 = 1.2;
pub(crate) const CONDITIONAL_ENERGY: f64 = 2.0;
pub(crate) const LOOP_ENERGY: f64 = 4.0;
pub(crate) const FUNCTION_CALL_ENERGY: f64 = 2.5;
pub(crate) const COMPREHENSION_ENERGY: f64 = 3.0;
pub(crate) const ALLOCATION_ENERGY: f64 = 2.0;

/// Flat impact charged once per directly recursive function
const RECURSION_IMPACT: f64 = 12.0;

/// Calls considered expensive by bare or dotted name
const EXPENSIVE_NAMES: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "open",
    "re.compile",
    "sorted",
    "glob.glob",
    "os.walk",
    "os.listdir",
    "subprocess",
    "pickle.loads",
    "pickle.dumps",
    "json.loads",
    "json.dumps",
];

/// Dotted-name prefixes that mark a call expensive regardless of the suffix
const EXPENSIVE_PREFIXES: &[&str] = &["re.", "os.", "glob."];

/// Node kinds the walk dispatches on; everything else falls through to a
/// plain visit of the children
enum NodeKind {
    Module,
    FunctionDef,
    Loop,
    Conditional,
    ListComp,
    DictComp,
    SetComp,
    ListLit,
    DictLit,
    SetLit,
    Call,
    BinOp,
    Other,
}

impl NodeKind {
    fn of(node: &Node) -> NodeKind {
        match node.kind() {
            "module" => NodeKind::Module,
            "function_definition" | "async_function_definition" => NodeKind::FunctionDef,
            "for_statement" | "while_statement" => NodeKind::Loop,
            "if_statement" => NodeKind::Conditional,
            "list_comprehension" => NodeKind::ListComp,
            "dictionary_comprehension" => NodeKind::DictComp,
            "set_comprehension" => NodeKind::SetComp,
            "list" => NodeKind::ListLit,
            "dictionary" => NodeKind::DictLit,
            "set" => NodeKind::SetLit,
            "call" => NodeKind::Call,
            "binary_operator" => NodeKind::BinOp,
            _ => NodeKind::Other,
        }
    }
}

/// Mutable traversal state threaded through one walk
pub(crate) struct WalkState<'s> {
    source: &'s [u8],
    depth_sensitivity: f64,
    loop_stack: Vec<u32>,
    block_stack: Vec<BlockMetrics>,
    function_stack: Vec<String>,
    pub(crate) issues: Vec<Issue>,
    pub(crate) blocks: Vec<BlockMetrics>,
}

impl<'s> WalkState<'s> {
    pub(crate) fn new(source: &'s [u8], depth_sensitivity: f64) -> Self {
        Self {
            source,
            depth_sensitivity,
            loop_stack: Vec::new(),
            block_stack: Vec::new(),
            function_stack: Vec::new(),
            issues: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn loop_depth(&self) -> usize {
        self.loop_stack.len()
    }
}

/// Visit one node, dispatching on its kind
pub(crate) fn visit(node: Node, state: &mut WalkState) {
    match NodeKind::of(&node) {
        NodeKind::Module => {
            open_block(BlockType::Module, &node, STATEMENT_ENERGY, state);
            visit_children(node, state);
            close_block(state);
        }
        NodeKind::FunctionDef => visit_function(node, state),
        NodeKind::Loop => visit_loop(node, state),
        NodeKind::Conditional => {
            open_block(BlockType::Conditional, &node, CONDITIONAL_ENERGY, state);
            visit_children(node, state);
            close_block(state);
        }
        NodeKind::ListComp => visit_list_comprehension(node, state),
        NodeKind::DictComp => visit_comprehension(node, "dict comprehension", state),
        NodeKind::SetComp => visit_comprehension(node, "set comprehension", state),
        NodeKind::ListLit => {
            allocation_in_loop(&node, "list", state);
            visit_children(node, state);
        }
        NodeKind::DictLit => {
            allocation_in_loop(&node, "dict", state);
            visit_children(node, state);
        }
        NodeKind::SetLit => {
            allocation_in_loop(&node, "set", state);
            visit_children(node, state);
        }
        NodeKind::Call => visit_call(node, state),
        NodeKind::BinOp => {
            // Background hum of arithmetic, charged to the open block
            // without a discrete finding.
            penalize(state, ARITHMETIC_ENERGY * 0.05);
            visit_children(node, state);
        }
        NodeKind::Other => visit_children(node, state),
    }
}

fn visit_children(node: Node, state: &mut WalkState) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, state);
    }
}

fn visit_function(node: Node, state: &mut WalkState) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, state.source).to_string())
        .unwrap_or_default();
    state.function_stack.push(name);

    open_block(BlockType::Function, &node, FUNCTION_CALL_ENERGY, state);
    let current = state.function_stack.last().cloned().unwrap_or_default();
    if !current.is_empty() {
        check_recursion(node, &current, state);
    }
    visit_children(node, state);
    close_block(state);

    state.function_stack.pop();
}

fn visit_loop(node: Node, state: &mut WalkState) {
    // The block's depth counts only the loops enclosing this one; the loop
    // itself contributes to detection depth from here on.
    open_block(BlockType::Loop, &node, LOOP_ENERGY, state);
    state.loop_stack.push(start_line(&node));
    let depth = state.loop_depth();

    if depth >= 2 {
        let impact = 6.0 * (1.0 + depth as f64 * 0.4);
        add_issue(
            state,
            IssueCategory::NestedLoops,
            "Nested loops detected",
            &node,
            2,
            Some(format!("depth {depth}")),
            impact,
        );
        penalize(state, impact);
    }

    if depth > 2 {
        let impact = 8.0 * depth as f64;
        add_issue(
            state,
            IssueCategory::LoopDepth,
            "High loop nesting depth",
            &node,
            depth.min(3) as u8,
            Some(format!("depth {depth}")),
            impact,
        );
        penalize(state, impact);
    }

    visit_children(node, state);
    state.loop_stack.pop();
    close_block(state);
}

fn visit_list_comprehension(node: Node, state: &mut WalkState) {
    open_block(BlockType::Comprehension, &node, COMPREHENSION_ENERGY, state);
    let depth = state.loop_depth();
    if depth >= 1 {
        let impact = COMPREHENSION_ENERGY * (1.0 + depth as f64 * 0.3);
        add_issue(
            state,
            IssueCategory::ListCreationInLoop,
            "List comprehension inside loop (consider pre-allocating)",
            &node,
            1,
            None,
            impact,
        );
        penalize(state, impact);
    }
    visit_children(node, state);
    close_block(state);
}

fn visit_comprehension(node: Node, kind: &str, state: &mut WalkState) {
    open_block(BlockType::Comprehension, &node, COMPREHENSION_ENERGY, state);
    allocation_in_loop(&node, kind, state);
    visit_children(node, state);
    close_block(state);
}

fn visit_call(node: Node, state: &mut WalkState) {
    let mut expensive: Option<String> = None;

    match node.child_by_field_name("function") {
        Some(func) if func.kind() == "identifier" => {
            let name = node_text(&func, state.source);

            // Builtin container constructors are allocations, not calls.
            if matches!(name, "list" | "dict" | "set" | "tuple") {
                allocation_in_loop(&node, name, state);
                return;
            }

            // Uppercase names are class instantiation by convention.
            if name.chars().next().is_some_and(char::is_uppercase) {
                object_creation(&node, name, state);
                return;
            }

            if EXPENSIVE_NAMES.contains(&name) {
                expensive = Some(name.to_string());
            }
        }
        Some(func) if func.kind() == "attribute" => {
            let full = qualified_name(&func, state.source);
            if EXPENSIVE_NAMES.contains(&full.as_str())
                || EXPENSIVE_PREFIXES.iter().any(|p| full.starts_with(p))
            {
                expensive = Some(full);
            }
        }
        _ => {}
    }

    if let Some(name) = expensive {
        let depth = state.loop_depth();
        if depth >= 1 {
            let impact = FUNCTION_CALL_ENERGY * (1.5 + depth as f64 * 0.4);
            add_issue(
                state,
                IssueCategory::ExpensiveOperation,
                format!("Expensive operation inside loop: {name}"),
                &node,
                2,
                Some(name),
                impact,
            );
            penalize(state, impact);
        } else {
            add_issue(
                state,
                IssueCategory::ExpensiveOperation,
                format!("Expensive operation: {name}"),
                &node,
                1,
                Some(name),
                FUNCTION_CALL_ENERGY,
            );
        }
    }

    visit_children(node, state);
}

/// Record an allocation occurring inside at least one loop; no-op outside
fn allocation_in_loop(node: &Node, kind: &str, state: &mut WalkState) {
    let depth = state.loop_depth();
    if depth < 1 {
        return;
    }

    let impact = ALLOCATION_ENERGY * (1.0 + depth as f64 * 0.6);
    penalize(state, impact);

    if kind.contains("object") || kind.chars().next().is_some_and(char::is_uppercase) {
        add_issue(
            state,
            IssueCategory::ObjectCreationInLoop,
            "Object creation inside loop",
            node,
            2,
            None,
            impact,
        );
    } else {
        add_issue(
            state,
            IssueCategory::AllocationInLoop,
            format!("{} allocation inside loop", capitalize(kind)),
            node,
            2,
            Some(kind.to_string()),
            impact,
        );
    }
}

fn object_creation(node: &Node, name: &str, state: &mut WalkState) {
    let depth = state.loop_depth();
    if depth < 1 {
        return;
    }

    let impact = FUNCTION_CALL_ENERGY * (1.0 + depth as f64 * 0.3);
    add_issue(
        state,
        IssueCategory::ObjectCreationInLoop,
        format!("Object creation inside loop: {name}"),
        node,
        2,
        Some(name.to_string()),
        impact,
    );
    penalize(state, impact);
}

/// Flag a function that calls itself by name anywhere in its body; the first
/// match short-circuits so a function is charged once no matter how many
/// recursive call sites it has
fn check_recursion(node: Node, name: &str, state: &mut WalkState) {
    let Some((call, via_self)) = find_recursive_call(node, name, state.source) else {
        return;
    };
    let message = if via_self {
        "Recursive method call detected"
    } else {
        "Recursion detected"
    };
    add_issue(
        state,
        IssueCategory::Recursion,
        message,
        &call,
        2,
        Some(name.to_string()),
        RECURSION_IMPACT,
    );
    penalize(state, RECURSION_IMPACT);
}

fn find_recursive_call<'t>(node: Node<'t>, name: &str, source: &[u8]) -> Option<(Node<'t>, bool)> {
    if node.kind() == "call" {
        if let Some(func) = node.child_by_field_name("function") {
            if func.kind() == "identifier" && node_text(&func, source) == name {
                return Some((node, false));
            }
            if func.kind() == "attribute" {
                let object_is_self = func
                    .child_by_field_name("object")
                    .is_some_and(|o| o.kind() == "identifier" && node_text(&o, source) == "self");
                let attr_matches = func
                    .child_by_field_name("attribute")
                    .is_some_and(|a| node_text(&a, source) == name);
                if object_is_self && attr_matches {
                    return Some((node, true));
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_recursive_call(child, name, source) {
            return Some(found);
        }
    }
    None
}

/// Rebuild a dotted path like `os.path.join` from nested attribute access
fn qualified_name(node: &Node, source: &[u8]) -> String {
    let attr = node
        .child_by_field_name("attribute")
        .map(|n| node_text(&n, source))
        .unwrap_or("");
    match node.child_by_field_name("object") {
        Some(obj) if obj.kind() == "identifier" => {
            format!("{}.{}", node_text(&obj, source), attr)
        }
        Some(obj) if obj.kind() == "attribute" => {
            format!("{}.{}", qualified_name(&obj, source), attr)
        }
        _ => attr.to_string(),
    }
}

fn open_block(block_type: BlockType, node: &Node, base_energy: f64, state: &mut WalkState) {
    let depth = state.loop_depth() as u32 + 1;
    state.block_stack.push(BlockMetrics::new(
        block_type,
        start_line(node),
        end_line(node),
        base_energy,
        depth,
    ));
}

fn close_block(state: &mut WalkState) {
    if let Some(mut block) = state.block_stack.pop() {
        block.finalize(state.depth_sensitivity);
        state.blocks.push(block);
    }
}

fn penalize(state: &mut WalkState, penalty: f64) {
    if let Some(block) = state.block_stack.last_mut() {
        block.operation_penalties += penalty;
    }
}

fn add_issue(
    state: &mut WalkState,
    category: IssueCategory,
    message: impl Into<String>,
    node: &Node,
    severity: u8,
    detail: Option<String>,
    impact: f64,
) {
    state.issues.push(Issue {
        category,
        message: message.into(),
        line: Some(start_line(node)),
        column: Some(column(node)),
        severity,
        detail,
        estimated_impact: Some(impact),
    });
}

fn start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn end_line(node: &Node) -> u32 {
    node.end_position().row as u32 + 1
}

fn column(node: &Node) -> u32 {
    node.start_position().column as u32
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("list"), "List");
        assert_eq!(capitalize("dict comprehension"), "Dict comprehension");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_expensive_names_cover_dotted_and_bare() {
        assert!(EXPENSIVE_NAMES.contains(&"sorted"));
        assert!(EXPENSIVE_NAMES.contains(&"re.compile"));
        assert!(EXPENSIVE_PREFIXES.iter().any(|p| "os.scandir".starts_with(p)));
    }
}
