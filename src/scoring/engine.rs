//! Hybrid energy scoring engine
//!
//! Combines three weighted components into a raw penalty and maps it onto
//! 0-100 through exponential decay:
//!
//! ```text
//! RawPenalty = α × Energy + β × Issues + γ × Complexity
//! Score      = 100 × e^(-RawPenalty / S)
//! ```
//!
//! The energy component sums block energies normalized per 20-line unit, so
//! tiny snippets do not trivially score as perfect and large files are not
//! punished linearly. The issue component is dampened sub-linearly
//! (power 0.95), the complexity component logarithmically.

use crate::models::{
    BlockMetrics, BlockType, ComponentBreakdown, EnergyGrade, EnergyReport, Issue, IssueCategory,
};
use crate::rules::{WeightTable, CYCLOMATIC_COMPLEXITY_THRESHOLD};
use tracing::debug;

/// Raw penalty never reaches exactly zero for scored input
const MIN_PENALTY: f64 = 0.1;

/// Flat impact of one synthesized structural warning
const STRUCTURAL_WARNING_IMPACT: f64 = 2.0;

const FORMULA: &str = "Score = 100 × e^(-Penalty / S)";

/// Engine tuning, immutable once the engine is built
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub weights: WeightTable,
    /// Multiply category weight by issue severity when no impact estimate
    pub use_severity: bool,
    pub cc_threshold: u32,
    /// Energy component weight
    pub alpha: f64,
    /// Issue component weight
    pub beta: f64,
    /// Complexity component weight
    pub gamma: f64,
    pub depth_sensitivity: f64,
    /// Decay constant S; higher is more lenient
    pub scaling_constant: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            use_severity: true,
            cc_threshold: CYCLOMATIC_COMPLEXITY_THRESHOLD,
            alpha: 0.6,
            beta: 0.6,
            gamma: 0.2,
            depth_sensitivity: 0.3,
            // Chosen so a bare module block (an empty file) still rounds to
            // a perfect score.
            scaling_constant: 100.0,
        }
    }
}

/// Stateless-per-call scorer over issues, blocks, and optional external
/// signals
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: EngineConfig,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Total block energy normalized per 20-line unit
    fn energy_component(&self, blocks: &[BlockMetrics]) -> f64 {
        if blocks.is_empty() {
            return 0.0;
        }

        let total_energy: f64 = blocks.iter().map(|b| b.total_energy).sum();
        let total_lines: u32 = blocks.iter().map(BlockMetrics::line_count).sum();
        total_energy / (total_lines as f64 / 20.0).max(1.0)
    }

    /// Sum of per-issue penalties with sub-linear dampening
    fn issue_component(&self, issues: &[Issue]) -> f64 {
        if issues.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for issue in issues {
            if let Some(impact) = issue.estimated_impact {
                total += impact;
            } else {
                let weight = self.config.weights.get(issue.category) as f64;
                if self.config.use_severity {
                    total += weight * issue.severity as f64;
                } else {
                    total += weight;
                }
            }
        }

        if total > 0.0 {
            // Nearly linear: a harsher exponent was tried and deliberately
            // relaxed to keep penalties impactful.
            total.powf(0.95) * 2.0
        } else {
            0.0
        }
    }

    /// Logarithmic penalty for complexity above the threshold
    fn complexity_component(&self, cyclomatic_complexity: Option<u32>) -> f64 {
        let Some(cc) = cyclomatic_complexity else {
            return 0.0;
        };
        if cc <= self.config.cc_threshold {
            return 0.0;
        }

        let excess = (cc - self.config.cc_threshold) as f64;
        let weight = self.config.weights.get(IssueCategory::CyclomaticComplexity) as f64;
        (1.0 + excess).ln() * weight
    }

    fn raw_penalty(&self, energy: f64, issue: f64, complexity: f64) -> f64 {
        let total =
            self.config.alpha * energy + self.config.beta * issue + self.config.gamma * complexity;
        total.max(MIN_PENALTY)
    }

    /// Exponential decay onto 0-100, rounded to the nearest integer
    fn efficiency_score(&self, penalty: f64) -> u32 {
        if penalty <= 0.0 {
            return 100;
        }
        let score = 100.0 * (-penalty / self.config.scaling_constant).exp();
        score.clamp(0.0, 100.0).round() as u32
    }

    /// Pick the block most worth refactoring
    ///
    /// Large blocks (> 10 lines) are ranked mostly by raw total energy;
    /// small blocks mostly by energy density, because a small hot block is
    /// actionable in a way a big merely-busy block may not be. The
    /// module-level block never qualifies. Ties keep the first maximal
    /// block in traversal order.
    fn find_hotspot(&self, blocks: &[BlockMetrics]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, block) in blocks.iter().enumerate() {
            if block.block_type == BlockType::Module {
                continue;
            }

            let lines = block.line_count() as f64;
            let density = block.energy_per_line * lines;
            let weight = if lines > 10.0 {
                block.total_energy * 0.7 + density * 0.3
            } else {
                block.total_energy * 0.4 + density * 0.6
            };

            match best {
                Some((_, best_weight)) if weight <= best_weight => {}
                _ => best = Some((idx, weight)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Build an [`EnergyReport`] from one analysis pass
    ///
    /// `structural_warnings_count` external linter messages are folded into
    /// the issue list as flat low-severity issues before scoring, so an
    /// external signal runs through the same penalty pipeline.
    pub fn compute_report(
        &self,
        mut issues: Vec<Issue>,
        blocks: Vec<BlockMetrics>,
        source_code: &str,
        filename: &str,
        cyclomatic_complexity: Option<u32>,
        structural_warnings_count: usize,
    ) -> EnergyReport {
        for _ in 0..structural_warnings_count {
            issues.push(Issue {
                category: IssueCategory::StructuralWarning,
                message: "Structural warning".to_string(),
                line: None,
                column: None,
                severity: 1,
                detail: None,
                estimated_impact: Some(STRUCTURAL_WARNING_IMPACT),
            });
        }

        let energy = self.energy_component(&blocks);
        let issue = self.issue_component(&issues);
        let complexity = self.complexity_component(cyclomatic_complexity);
        let raw_penalty = self.raw_penalty(energy, issue, complexity);
        let score = self.efficiency_score(raw_penalty);
        let grade = EnergyGrade::from_score(score);
        let hotspot = self.find_hotspot(&blocks);

        debug!(
            "scored {}: {} ({}) penalty {:.2} [energy {:.2}, issues {:.2}, complexity {:.2}]",
            if filename.is_empty() { "<source>" } else { filename },
            score,
            grade.letter,
            raw_penalty,
            energy,
            issue,
            complexity
        );

        EnergyReport {
            score,
            grade,
            issues,
            blocks,
            hotspot,
            filename: filename.to_string(),
            source_lines: source_code.lines().count(),
            raw_penalty,
            components: ComponentBreakdown {
                raw_penalty: round2(raw_penalty),
                energy_component: round2(energy),
                issue_component: round2(issue),
                complexity_component: round2(complexity),
                score,
                scaling_constant: self.config.scaling_constant,
                alpha: self.config.alpha,
                beta: self.config.beta,
                gamma: self.config.gamma,
                formula: FORMULA,
            },
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
