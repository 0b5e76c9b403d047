//! Rule weights for energy impact scoring
//!
//! Maps each issue category to a penalty weight. The table is an explicit
//! value handed to the scoring engine at construction, so two engines can run
//! with different weights side by side.

use crate::models::IssueCategory;
use std::collections::HashMap;

/// Fallback weight for categories without an explicit entry
pub const DEFAULT_WEIGHT: u32 = 3;

/// Cyclomatic complexity threshold; only the excess above it is penalized
pub const CYCLOMATIC_COMPLEXITY_THRESHOLD: u32 = 10;

/// Category-to-weight mapping, immutable after construction
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: HashMap<IssueCategory, u32>,
}

impl Default for WeightTable {
    fn default() -> Self {
        let weights = HashMap::from([
            (IssueCategory::NestedLoops, 8),
            (IssueCategory::LoopDepth, 5),
            (IssueCategory::AllocationInLoop, 6),
            (IssueCategory::ListCreationInLoop, 5),
            (IssueCategory::ObjectCreationInLoop, 6),
            (IssueCategory::Recursion, 7),
            (IssueCategory::ExpensiveOperation, 6),
            (IssueCategory::CyclomaticComplexity, 4),
            (IssueCategory::StructuralWarning, 2),
        ]);
        Self { weights }
    }
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Penalty weight for a category, falling back to [`DEFAULT_WEIGHT`]
    pub fn get(&self, category: IssueCategory) -> u32 {
        self.weights.get(&category).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Override a single weight, builder style
    pub fn with_weight(mut self, category: IssueCategory, weight: u32) -> Self {
        self.weights.insert(category, weight);
        self
    }
}
