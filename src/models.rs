//! Core data models for ecoscan
//!
//! These models are shared between the analyzer, the scoring engine, and the
//! reporters: detected issues, per-block energy accounting, grades, and the
//! final report contract every output format consumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories of energy-impacting code patterns
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    NestedLoops,
    LoopDepth,
    AllocationInLoop,
    ListCreationInLoop,
    ObjectCreationInLoop,
    Recursion,
    ExpensiveOperation,
    CyclomaticComplexity,
    StructuralWarning,
}

impl IssueCategory {
    /// Stable snake_case name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::NestedLoops => "nested_loops",
            IssueCategory::LoopDepth => "loop_depth",
            IssueCategory::AllocationInLoop => "allocation_in_loop",
            IssueCategory::ListCreationInLoop => "list_creation_in_loop",
            IssueCategory::ObjectCreationInLoop => "object_creation_in_loop",
            IssueCategory::Recursion => "recursion",
            IssueCategory::ExpensiveOperation => "expensive_operation",
            IssueCategory::CyclomaticComplexity => "cyclomatic_complexity",
            IssueCategory::StructuralWarning => "structural_warning",
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nested_loops" => Ok(IssueCategory::NestedLoops),
            "loop_depth" => Ok(IssueCategory::LoopDepth),
            "allocation_in_loop" => Ok(IssueCategory::AllocationInLoop),
            "list_creation_in_loop" => Ok(IssueCategory::ListCreationInLoop),
            "object_creation_in_loop" => Ok(IssueCategory::ObjectCreationInLoop),
            "recursion" => Ok(IssueCategory::Recursion),
            "expensive_operation" => Ok(IssueCategory::ExpensiveOperation),
            "cyclomatic_complexity" => Ok(IssueCategory::CyclomaticComplexity),
            "structural_warning" => Ok(IssueCategory::StructuralWarning),
            _ => Err(format!("unknown issue category '{s}'")),
        }
    }
}

/// A single detected energy-impacting issue
///
/// Created by the visitor during traversal and immutable afterwards.
/// `severity` is 1-3; `estimated_impact`, when present, is non-negative and
/// feeds directly into the issue component of the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub category: IssueCategory,
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    pub severity: u8,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub estimated_impact: Option<f64>,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {})", self.message, line),
            None => f.write_str(&self.message),
        }
    }
}

/// Kind of syntactic region a [`BlockMetrics`] accounts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Module,
    Function,
    Loop,
    Conditional,
    Comprehension,
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Module => f.write_str("module"),
            BlockType::Function => f.write_str("function"),
            BlockType::Loop => f.write_str("loop"),
            BlockType::Conditional => f.write_str("conditional"),
            BlockType::Comprehension => f.write_str("comprehension"),
        }
    }
}

/// Energy accounting for one code block (module, function, loop, conditional,
/// or comprehension)
///
/// Lifecycle: created when the visitor enters a block-forming construct,
/// penalties accumulate while its subtree is visited, then [`finalize`]
/// derives `total_energy` and `energy_per_line` exactly once when the block
/// is closed. Both derived fields are 0 until then.
///
/// [`finalize`]: BlockMetrics::finalize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMetrics {
    pub block_type: BlockType,
    pub start_line: u32,
    pub end_line: u32,
    pub base_energy: f64,
    /// Loop-nesting depth captured when the block was opened, >= 1
    pub depth: u32,
    pub operation_penalties: f64,
    pub total_energy: f64,
    pub energy_per_line: f64,
}

impl BlockMetrics {
    pub fn new(block_type: BlockType, start_line: u32, end_line: u32, base_energy: f64, depth: u32) -> Self {
        Self {
            block_type,
            start_line,
            end_line,
            base_energy,
            depth,
            operation_penalties: 0.0,
            total_energy: 0.0,
            energy_per_line: 0.0,
        }
    }

    /// Lines spanned by the block, floored at 1
    pub fn line_count(&self) -> u32 {
        (self.end_line.saturating_sub(self.start_line) + 1).max(1)
    }

    /// Derive total energy and energy density:
    ///
    /// `total_energy = base_energy × (1 + (depth − 1) × k) + operation_penalties`
    ///
    /// where `k` is the depth sensitivity coefficient.
    pub fn finalize(&mut self, depth_sensitivity: f64) {
        let depth_multiplier = 1.0 + (self.depth.saturating_sub(1)) as f64 * depth_sensitivity;
        self.total_energy = self.base_energy * depth_multiplier + self.operation_penalties;
        self.energy_per_line = self.total_energy / self.line_count() as f64;
    }
}

/// Energy grade band (A-F) with its inclusive score range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnergyGrade {
    pub letter: &'static str,
    pub score_min: u32,
    pub score_max: u32,
    pub description: &'static str,
    pub icon: &'static str,
}

/// The six grade bands, best to worst, covering 0-100 contiguously
pub const GRADES: [EnergyGrade; 6] = [
    EnergyGrade { letter: "A", score_min: 90, score_max: 100, description: "Excellent efficiency", icon: "🌟" },
    EnergyGrade { letter: "B", score_min: 75, score_max: 89, description: "Good efficiency", icon: "👍" },
    EnergyGrade { letter: "C", score_min: 60, score_max: 74, description: "Moderate inefficiencies", icon: "⚠️" },
    EnergyGrade { letter: "D", score_min: 45, score_max: 59, description: "Needs optimization", icon: "🔋" },
    EnergyGrade { letter: "E", score_min: 30, score_max: 44, description: "Poor efficiency", icon: "🔥" },
    EnergyGrade { letter: "F", score_min: 0, score_max: 29, description: "Critical inefficiencies", icon: "💀" },
];

impl EnergyGrade {
    /// Map a numeric score to its grade band. Scores outside 0-100 are
    /// clamped first, so the lookup is total.
    pub fn from_score(score: u32) -> EnergyGrade {
        let score = score.min(100);
        for grade in GRADES {
            if score >= grade.score_min && score <= grade.score_max {
                return grade;
            }
        }
        GRADES[GRADES.len() - 1]
    }
}

/// Named intermediate values of one scoring run, for transparency
///
/// Component values are rounded to 2 decimal places for display; the exact
/// raw penalty lives on [`EnergyReport::raw_penalty`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentBreakdown {
    pub raw_penalty: f64,
    pub energy_component: f64,
    pub issue_component: f64,
    pub complexity_component: f64,
    pub score: u32,
    pub scaling_constant: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub formula: &'static str,
}

/// Full energy analysis report
///
/// The single output contract consumed by every reporter. `hotspot` is an
/// index into `blocks` rather than a copy, so the relation survives
/// serialization without duplicating the block.
#[derive(Debug, Clone, Serialize)]
pub struct EnergyReport {
    pub score: u32,
    pub grade: EnergyGrade,
    pub issues: Vec<Issue>,
    pub blocks: Vec<BlockMetrics>,
    /// Index of the hotspot block in `blocks`, if any non-module block exists
    pub hotspot: Option<usize>,
    pub filename: String,
    pub source_lines: usize,
    pub raw_penalty: f64,
    pub components: ComponentBreakdown,
}

impl EnergyReport {
    /// The hotspot block, if one was selected
    pub fn hotspot(&self) -> Option<&BlockMetrics> {
        self.hotspot.and_then(|idx| self.blocks.get(idx))
    }

    /// Line range of the hotspot for targeted refactoring
    pub fn hotspot_region(&self) -> Option<(u32, u32)> {
        self.hotspot().map(|b| (b.start_line, b.end_line))
    }

    /// Group issues by category, preserving per-category traversal order
    pub fn issues_by_category(&self) -> BTreeMap<IssueCategory, Vec<&Issue>> {
        let mut grouped: BTreeMap<IssueCategory, Vec<&Issue>> = BTreeMap::new();
        for issue in &self.issues {
            grouped.entry(issue.category).or_default().push(issue);
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_applies_depth_multiplier() {
        let mut block = BlockMetrics::new(BlockType::Loop, 5, 14, 4.0, 3);
        block.operation_penalties = 2.5;
        block.finalize(0.3);

        // 4.0 * (1 + 2*0.3) + 2.5 = 8.9 over 10 lines
        assert!((block.total_energy - 8.9).abs() < 1e-9);
        assert!((block.energy_per_line - 0.89).abs() < 1e-9);
    }

    #[test]
    fn test_finalize_depth_one_has_no_multiplier() {
        let mut block = BlockMetrics::new(BlockType::Function, 1, 1, 2.5, 1);
        block.finalize(0.3);
        assert!((block.total_energy - 2.5).abs() < 1e-9);
        // single-line block: density equals total
        assert!((block.energy_per_line - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_derived_fields_zero_before_finalize() {
        let block = BlockMetrics::new(BlockType::Conditional, 3, 7, 2.0, 2);
        assert_eq!(block.total_energy, 0.0);
        assert_eq!(block.energy_per_line, 0.0);
    }

    #[test]
    fn test_grade_boundaries() {
        let cases = [
            (0, "F"),
            (29, "F"),
            (30, "E"),
            (44, "E"),
            (45, "D"),
            (59, "D"),
            (60, "C"),
            (74, "C"),
            (75, "B"),
            (89, "B"),
            (90, "A"),
            (100, "A"),
        ];
        for (score, letter) in cases {
            assert_eq!(EnergyGrade::from_score(score).letter, letter, "score {score}");
        }
    }

    #[test]
    fn test_grade_bands_are_contiguous() {
        for window in GRADES.windows(2) {
            assert_eq!(window[0].score_min, window[1].score_max + 1);
        }
        assert_eq!(GRADES[0].score_max, 100);
        assert_eq!(GRADES[GRADES.len() - 1].score_min, 0);
    }

    #[test]
    fn test_grade_clamps_out_of_range() {
        assert_eq!(EnergyGrade::from_score(250).letter, "A");
    }

    #[test]
    fn test_issue_category_round_trip() {
        for category in [
            IssueCategory::NestedLoops,
            IssueCategory::LoopDepth,
            IssueCategory::AllocationInLoop,
            IssueCategory::ListCreationInLoop,
            IssueCategory::ObjectCreationInLoop,
            IssueCategory::Recursion,
            IssueCategory::ExpensiveOperation,
            IssueCategory::CyclomaticComplexity,
            IssueCategory::StructuralWarning,
        ] {
            let parsed: IssueCategory = category.as_str().parse().expect("parse category");
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_hotspot_accessor_resolves_index() {
        let mut block = BlockMetrics::new(BlockType::Loop, 2, 6, 4.0, 1);
        block.finalize(0.3);
        let report = EnergyReport {
            score: 80,
            grade: EnergyGrade::from_score(80),
            issues: vec![],
            blocks: vec![block],
            hotspot: Some(0),
            filename: "sample.py".to_string(),
            source_lines: 6,
            raw_penalty: 11.2,
            components: ComponentBreakdown {
                raw_penalty: 11.2,
                energy_component: 4.0,
                issue_component: 0.0,
                complexity_component: 0.0,
                score: 80,
                scaling_constant: 100.0,
                alpha: 0.6,
                beta: 0.6,
                gamma: 0.2,
                formula: "Score = 100 × e^(-Penalty / S)",
            },
        };

        assert_eq!(report.hotspot_region(), Some((2, 6)));
        assert_eq!(report.hotspot().map(|b| b.block_type), Some(BlockType::Loop));
    }
}
