//! Cyclomatic complexity signal
//!
//! Counts decision points per function over the tree-sitter parse and
//! reports the maximum across the file. Used by the scoring engine's
//! complexity component; `None` on unparsable source.

use tree_sitter::{Node, Parser};

/// Maximum cyclomatic complexity of any single function in the source
///
/// Returns `Some(0)` for a file without functions and `None` when the
/// source does not parse.
pub fn max_cyclomatic_complexity(source: &str) -> Option<u32> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser.set_language(&language.into()).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }

    let mut functions = Vec::new();
    collect_functions(root, &mut functions);
    Some(
        functions
            .iter()
            .map(complexity_of)
            .max()
            .unwrap_or(0),
    )
}

fn collect_functions<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if matches!(node.kind(), "function_definition" | "async_function_definition") {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, out);
    }
}

/// Cyclomatic complexity of one function: 1 plus one per decision point
fn complexity_of(node: &Node) -> u32 {
    let mut complexity = 1;

    fn count_branches(node: &Node, complexity: &mut u32) {
        match node.kind() {
            "if_statement" | "elif_clause" | "while_statement" | "for_statement" => {
                *complexity += 1;
            }
            "except_clause" => {
                *complexity += 1;
            }
            "boolean_operator" => {
                *complexity += 1;
            }
            "conditional_expression" => {
                *complexity += 1;
            }
            "list_comprehension" | "dictionary_comprehension" | "set_comprehension" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "if_clause" {
                        *complexity += 1;
                    }
                }
            }
            "match_statement" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "case_clause" {
                        *complexity += 1;
                    }
                }
            }
            "with_statement" => {
                *complexity += 1;
            }
            "assert_statement" => {
                *complexity += 1;
            }
            _ => {}
        }

        for child in node.children(&mut node.walk()) {
            count_branches(&child, complexity);
        }
    }

    count_branches(node, &mut complexity);
    complexity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_function_is_one() {
        let source = "def f():\n    return 1\n";
        assert_eq!(max_cyclomatic_complexity(source), Some(1));
    }

    #[test]
    fn test_branches_add_up() {
        let source = "\
def f(x):
    if x > 0 and x < 10:
        for i in range(x):
            if i % 2:
                x += 1
    return x
";
        // base 1 + if + boolean + for + inner if
        assert_eq!(max_cyclomatic_complexity(source), Some(5));
    }

    #[test]
    fn test_max_across_functions() {
        let source = "\
def simple():
    return 1

def branchy(x):
    if x:
        return 1
    if not x:
        return 2
    return 3
";
        assert_eq!(max_cyclomatic_complexity(source), Some(3));
    }

    #[test]
    fn test_no_functions_is_zero() {
        assert_eq!(max_cyclomatic_complexity("x = 1\n"), Some(0));
    }

    #[test]
    fn test_unparsable_is_none() {
        assert_eq!(max_cyclomatic_complexity("def broken(:\n"), None);
    }
}
