//! Python source analysis
//!
//! Parses source with tree-sitter and runs the energy-focused walk over the
//! resulting tree. Two entry points: [`Analyzer::analyze`] for a whole file
//! and [`Analyzer::analyze_fragment`] for a snippet out of full-file context
//! (live-editing feedback), which wraps the snippet so it parses standalone
//! and maps line numbers back to the caller's coordinates.

mod visitor;

use crate::models::{BlockMetrics, Issue};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Findings from one walk: flat issues plus block metrics in the order each
/// block was closed (post-order)
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub issues: Vec<Issue>,
    pub blocks: Vec<BlockMetrics>,
}

/// Outcome of analyzing one source unit
///
/// Unparsable source is a distinct outcome rather than an error or a silent
/// empty result, so callers choose their own policy. [`into_parts`] gives
/// the lenient empty-findings reading for callers that do not care.
///
/// [`into_parts`]: AnalysisOutcome::into_parts
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Parsed(Analysis),
    ParseFailed,
}

impl AnalysisOutcome {
    pub fn parse_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::ParseFailed)
    }

    /// Issues and blocks, empty when the source did not parse
    pub fn into_parts(self) -> (Vec<Issue>, Vec<BlockMetrics>) {
        match self {
            AnalysisOutcome::Parsed(analysis) => (analysis.issues, analysis.blocks),
            AnalysisOutcome::ParseFailed => (Vec::new(), Vec::new()),
        }
    }
}

/// How to wrap a fragment so it parses standalone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Module,
    Loop,
    Function,
}

/// Parses Python source and runs the energy walk
#[derive(Debug, Clone)]
pub struct Analyzer {
    depth_sensitivity: f64,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self { depth_sensitivity: 0.3 }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the depth sensitivity coefficient used when blocks finalize
    pub fn with_depth_sensitivity(depth_sensitivity: f64) -> Self {
        Self { depth_sensitivity }
    }

    /// Analyze a full source unit
    pub fn analyze(&self, source: &str) -> AnalysisOutcome {
        let Some(tree) = parse(source) else {
            return AnalysisOutcome::ParseFailed;
        };
        let root = tree.root_node();
        if root.has_error() {
            debug!("source contains syntax errors, reporting parse failure");
            return AnalysisOutcome::ParseFailed;
        }

        let mut state = visitor::WalkState::new(source.as_bytes(), self.depth_sensitivity);
        visitor::visit(root, &mut state);
        AnalysisOutcome::Parsed(Analysis {
            issues: state.issues,
            blocks: state.blocks,
        })
    }

    /// Analyze a fragment for live-editing feedback
    ///
    /// The fragment is wrapped in a minimal synthetic header matching `kind`
    /// (a one-iteration loop or a function definition), the same walk runs
    /// rooted at the synthetic construct, and reported line numbers are
    /// shifted so they refer to the original file, where the fragment
    /// started at `start_line` (1-based). Returns issues only.
    pub fn analyze_fragment(&self, fragment: &str, kind: FragmentKind, start_line: u32) -> Vec<Issue> {
        let (wrapped, header_lines) = match kind {
            FragmentKind::Loop => (format!("for _ in range(1):\n{}", indent(fragment)), 1i64),
            FragmentKind::Function => (format!("def _wrapper():\n{}", indent(fragment)), 1i64),
            FragmentKind::Module => (fragment.to_string(), 0i64),
        };

        let Some(tree) = parse(&wrapped) else {
            return Vec::new();
        };
        let root = tree.root_node();
        if root.has_error() {
            return Vec::new();
        }

        let target = match kind {
            FragmentKind::Loop => find_first(root, &["for_statement", "while_statement"]),
            FragmentKind::Function => {
                find_first(root, &["function_definition", "async_function_definition"])
            }
            FragmentKind::Module => Some(root),
        };
        let Some(target) = target else {
            return Vec::new();
        };

        let mut state = visitor::WalkState::new(wrapped.as_bytes(), self.depth_sensitivity);
        visitor::visit(target, &mut state);

        let shift = start_line as i64 - 1 - header_lines;
        let mut issues = state.issues;
        for issue in &mut issues {
            if let Some(line) = issue.line {
                issue.line = Some((line as i64 + shift).max(1) as u32);
            }
        }
        issues
    }
}

fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    if parser.set_language(&language.into()).is_err() {
        debug!("failed to load the Python grammar");
        return None;
    }
    parser.parse(source, None)
}

fn indent(fragment: &str) -> String {
    fragment
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_first<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_first(child, kinds) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockType, IssueCategory};

    fn analyze(source: &str) -> Analysis {
        match Analyzer::new().analyze(source) {
            AnalysisOutcome::Parsed(analysis) => analysis,
            AnalysisOutcome::ParseFailed => panic!("expected source to parse"),
        }
    }

    #[test]
    fn test_empty_source_yields_module_block_only() {
        let analysis = analyze("");
        assert!(analysis.issues.is_empty());
        assert_eq!(analysis.blocks.len(), 1);
        assert_eq!(analysis.blocks[0].block_type, BlockType::Module);
        assert_eq!(analysis.blocks[0].depth, 1);
    }

    #[test]
    fn test_parse_failure_is_distinct_and_degrades_to_empty() {
        let outcome = Analyzer::new().analyze("def broken(:\n    pass\n");
        assert!(outcome.parse_failed());
        let (issues, blocks) = outcome.into_parts();
        assert!(issues.is_empty());
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_single_loop_with_list_literal() {
        let source = "for i in range(10):\n    x = [i]\n";
        let analysis = analyze(source);

        assert_eq!(analysis.issues.len(), 1);
        let issue = &analysis.issues[0];
        assert_eq!(issue.category, IssueCategory::AllocationInLoop);
        assert_eq!(issue.severity, 2);
        assert_eq!(issue.line, Some(2));
        // 2.0 * (1 + 1*0.6)
        assert!((issue.estimated_impact.unwrap() - 3.2).abs() < 1e-9);

        let loops: Vec<_> = analysis
            .blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Loop)
            .collect();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].depth, 1);
        assert!(!analysis
            .blocks
            .iter()
            .any(|b| b.block_type == BlockType::Comprehension));
    }

    #[test]
    fn test_three_nested_loops() {
        let source = "\
for i in range(3):
    for j in range(3):
        for k in range(3):
            pass
";
        let analysis = analyze(source);

        let nested: Vec<_> = analysis
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::NestedLoops)
            .collect();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].line, Some(2));
        assert_eq!(nested[1].line, Some(3));
        // 6.0 * (1 + 2*0.4) on the second loop
        assert!((nested[0].estimated_impact.unwrap() - 10.8).abs() < 1e-9);

        let deep: Vec<_> = analysis
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::LoopDepth)
            .collect();
        assert_eq!(deep.len(), 1);
        assert_eq!(deep[0].severity, 3);
        assert!((deep[0].estimated_impact.unwrap() - 24.0).abs() < 1e-9);

        // Blocks close innermost-first; loop depths are 1/2/3 outermost-in.
        let loop_depths: Vec<u32> = analysis
            .blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Loop)
            .map(|b| b.depth)
            .collect();
        assert_eq!(loop_depths, vec![3, 2, 1]);
    }

    #[test]
    fn test_direct_recursion_charged_once() {
        let source = "\
def fib(n):
    if n < 2:
        return n
    return fib(n - 1) + fib(n - 2)
";
        let analysis = analyze(source);
        let recursion: Vec<_> = analysis
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Recursion)
            .collect();
        assert_eq!(recursion.len(), 1);
        assert_eq!(recursion[0].message, "Recursion detected");
        assert!((recursion[0].estimated_impact.unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_method_recursion_via_self() {
        let source = "\
class Tree:
    def walk(self, node):
        for child in node.children:
            self.walk(child)
";
        let analysis = analyze(source);
        let recursion: Vec<_> = analysis
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Recursion)
            .collect();
        assert_eq!(recursion.len(), 1);
        assert_eq!(recursion[0].message, "Recursive method call detected");
        assert_eq!(recursion[0].detail.as_deref(), Some("walk"));
    }

    #[test]
    fn test_expensive_operation_severity_depends_on_loop() {
        let outside = analyze("data = sorted(items)\n");
        let issue = &outside.issues[0];
        assert_eq!(issue.category, IssueCategory::ExpensiveOperation);
        assert_eq!(issue.severity, 1);
        assert!((issue.estimated_impact.unwrap() - 2.5).abs() < 1e-9);

        let inside = analyze("for row in rows:\n    data = sorted(row)\n");
        let issue = &inside.issues[0];
        assert_eq!(issue.severity, 2);
        // 2.5 * (1.5 + 1*0.4)
        assert!((issue.estimated_impact.unwrap() - 4.75).abs() < 1e-9);
    }

    #[test]
    fn test_dotted_expensive_names_and_prefixes() {
        let analysis = analyze("import re\npattern = re.compile(r'x+')\nentries = os.listdir(path)\n");
        let expensive: Vec<_> = analysis
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::ExpensiveOperation)
            .collect();
        assert_eq!(expensive.len(), 2);
        assert_eq!(expensive[0].detail.as_deref(), Some("re.compile"));
        assert_eq!(expensive[1].detail.as_deref(), Some("os.listdir"));
    }

    #[test]
    fn test_constructor_call_shadows_expensive_argument() {
        // list(...) is an allocation and its arguments are not inspected,
        // so the sorted() inside is not separately flagged.
        let analysis = analyze("for i in range(3):\n    x = list(sorted(i))\n");
        assert_eq!(analysis.issues.len(), 1);
        assert_eq!(analysis.issues[0].category, IssueCategory::AllocationInLoop);
        assert_eq!(analysis.issues[0].detail.as_deref(), Some("list"));
    }

    #[test]
    fn test_uppercase_call_is_object_creation() {
        let analysis = analyze("for i in range(3):\n    w = Widget(i)\n");
        assert_eq!(analysis.issues.len(), 1);
        let issue = &analysis.issues[0];
        assert_eq!(issue.category, IssueCategory::ObjectCreationInLoop);
        assert_eq!(issue.detail.as_deref(), Some("Widget"));
        // 2.5 * (1 + 1*0.3)
        assert!((issue.estimated_impact.unwrap() - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_uppercase_call_outside_loop_is_silent() {
        let analysis = analyze("w = Widget()\n");
        assert!(analysis.issues.is_empty());
    }

    #[test]
    fn test_list_comprehension_inside_loop() {
        let analysis = analyze("for i in range(3):\n    squares = [x * x for x in range(i)]\n");
        let comp_issues: Vec<_> = analysis
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::ListCreationInLoop)
            .collect();
        assert_eq!(comp_issues.len(), 1);
        assert_eq!(comp_issues[0].severity, 1);
        // 3.0 * (1 + 1*0.3)
        assert!((comp_issues[0].estimated_impact.unwrap() - 3.9).abs() < 1e-9);
        assert!(analysis
            .blocks
            .iter()
            .any(|b| b.block_type == BlockType::Comprehension));
    }

    #[test]
    fn test_dict_comprehension_in_loop_reports_allocation() {
        let analysis = analyze("for i in range(3):\n    d = {x: x for x in range(i)}\n");
        let issue = analysis
            .issues
            .iter()
            .find(|i| i.category == IssueCategory::AllocationInLoop)
            .expect("allocation issue");
        assert_eq!(issue.message, "Dict comprehension allocation inside loop");
    }

    #[test]
    fn test_top_level_comprehension_is_quiet() {
        let analysis = analyze("squares = [x * x for x in range(10)]\n");
        assert!(analysis.issues.is_empty());
        assert!(analysis
            .blocks
            .iter()
            .any(|b| b.block_type == BlockType::Comprehension));
    }

    #[test]
    fn test_arithmetic_hums_into_current_block() {
        let analysis = analyze("x = 1 + 2\n");
        assert!(analysis.issues.is_empty());
        let module = &analysis.blocks[0];
        assert!((module.operation_penalties - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_conditional_depth_inside_loop() {
        let analysis = analyze("for i in range(3):\n    if i > 1:\n        pass\n");
        let conditional = analysis
            .blocks
            .iter()
            .find(|b| b.block_type == BlockType::Conditional)
            .expect("conditional block");
        assert_eq!(conditional.depth, 2);
    }

    #[test]
    fn test_fragment_loop_lines_map_back() {
        let issues = Analyzer::new().analyze_fragment("x = [1, 2]", FragmentKind::Loop, 10);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::AllocationInLoop);
        assert_eq!(issues[0].line, Some(10));
    }

    #[test]
    fn test_fragment_function_detects_recursion() {
        let issues =
            Analyzer::new().analyze_fragment("return _wrapper()", FragmentKind::Function, 5);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Recursion);
        assert_eq!(issues[0].line, Some(5));
    }

    #[test]
    fn test_fragment_module_offset() {
        let issues = Analyzer::new().analyze_fragment(
            "for i in range(3):\n    x = [i]",
            FragmentKind::Module,
            100,
        );
        let allocation = issues
            .iter()
            .find(|i| i.category == IssueCategory::AllocationInLoop)
            .expect("allocation issue");
        assert_eq!(allocation.line, Some(101));
    }

    #[test]
    fn test_unparsable_fragment_returns_no_issues() {
        let issues = Analyzer::new().analyze_fragment("def broken(:", FragmentKind::Module, 1);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_determinism_across_runs() {
        let source = "\
def process(rows):
    out = []
    for row in rows:
        for cell in row:
            out.append(sorted(cell))
    return out
";
        let first = analyze(source);
        let second = analyze(source);
        assert_eq!(first.issues, second.issues);
        assert_eq!(first.blocks, second.blocks);
    }
}
