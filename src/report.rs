use std::fmt;

use crate::analyzer::AnalysisSummary;
use crate::board::BoardState;
use crate::error::{BoardError, Result};
use crate::state::ScriptNode;

pub const HIGH_COMPLEXITY: u32 = 10;
pub const MANY_FILES: usize = 20;
const MAIN_FUNCTIONS_LISTED: usize = 5;
const DEFAULT_SCRIPT_TYPE: &str = "Python module";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouplingScore {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for CouplingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very high",
        };
        f.write_str(label)
    }
}

/// Connections over the number of possible directed pairs among the
/// secondary scripts. Fewer than two secondaries counts as low.
pub fn coupling_score(secondary_count: usize, connection_count: usize) -> CouplingScore {
    let possible = secondary_count * secondary_count.saturating_sub(1);
    if possible == 0 {
        return CouplingScore::Low;
    }
    let ratio = connection_count as f64 / possible as f64;
    if ratio < 0.1 {
        CouplingScore::Low
    } else if ratio < 0.3 {
        CouplingScore::Medium
    } else if ratio < 0.5 {
        CouplingScore::High
    } else {
        CouplingScore::VeryHigh
    }
}

fn summary(node: &ScriptNode) -> AnalysisSummary {
    node.analysis.as_ref().map(AnalysisSummary::from_value).unwrap_or_default()
}

/// Plain-text summary of the board. `generated_at` is printed verbatim.
pub fn build_report(board: &BoardState, generated_at: &str) -> Result<String> {
    let main = board.registry.main().ok_or(BoardError::NoMainScript)?;
    let main_summary = summary(main);
    let secondaries: Vec<(&ScriptNode, AnalysisSummary)> = board
        .registry
        .iter()
        .filter(|n| !n.is_main())
        .map(|n| (n, summary(n)))
        .collect();

    let mut out = Vec::new();
    out.push("=== SCRIPT BOARD REPORT ===".to_string());
    out.push(String::new());
    out.push(format!("Generated: {}", generated_at));
    out.push(format!("Main script: {}", main.name));
    out.push(format!("Secondary scripts: {}", secondaries.len()));
    out.push(format!("Connections: {}", board.connections.len()));
    out.push(format!(
        "Coupling: {}",
        coupling_score(secondaries.len(), board.connections.len())
    ));

    out.push(String::new());
    out.push("=== MAIN SCRIPT ===".to_string());
    if let Some(kind) = &main_summary.script_type {
        out.push(format!("Type: {}", kind));
    }
    if !main_summary.functions.is_empty() {
        out.push(format!("Functions: {}", main_summary.functions.len()));
        for f in main_summary.functions.iter().take(MAIN_FUNCTIONS_LISTED) {
            out.push(format!("  - {} (complexity: {})", f.name, f.complexity));
        }
    }
    if !main_summary.classes.is_empty() {
        out.push(format!("Classes: {}", main_summary.classes.len()));
        for c in &main_summary.classes {
            out.push(format!("  - {}", c.name));
        }
    }

    out.push(String::new());
    out.push("=== SECONDARY SCRIPTS ===".to_string());
    for (node, s) in &secondaries {
        out.push(String::new());
        out.push(format!("{}:", node.name));
        out.push(format!(
            "  - Type: {}",
            s.script_type.as_deref().unwrap_or(DEFAULT_SCRIPT_TYPE)
        ));
        out.push(format!(
            "  - Imports main script: {}",
            if node.imports_main { "yes" } else { "no" }
        ));
        if !s.functions.is_empty() {
            out.push(format!("  - Functions: {}", s.functions.len()));
        }
        if !s.classes.is_empty() {
            out.push(format!("  - Classes: {}", s.classes.len()));
        }
    }

    out.push(String::new());
    out.push("=== DEPENDENCIES ===".to_string());
    if board.connections.is_empty() {
        out.push("No direct dependencies detected.".to_string());
    }
    for conn in board.connections.iter() {
        out.push(String::new());
        out.push(format!("{} -> {}:", conn.source, conn.target));
        if !conn.entities.functions.is_empty() {
            out.push(format!("  Imported functions: {}", conn.entities.functions.join(", ")));
        }
        if !conn.entities.classes.is_empty() {
            out.push(format!("  Imported classes: {}", conn.entities.classes.join(", ")));
        }
    }

    out.push(String::new());
    out.push("=== RECOMMENDATIONS ===".to_string());
    let complex: Vec<String> = std::iter::once((main, &main_summary))
        .chain(secondaries.iter().map(|(n, s)| (*n, s)))
        .flat_map(|(node, s)| {
            s.functions
                .iter()
                .filter(|f| f.complexity > HIGH_COMPLEXITY)
                .map(move |f| format!("{}:{}", node.name, f.name))
        })
        .collect();
    if !complex.is_empty() {
        out.push(String::new());
        out.push(format!("High complexity functions (>{}):", HIGH_COMPLEXITY));
        out.extend(complex.iter().map(|f| format!("  - {}", f)));
        out.push("  Consider refactoring these functions.".to_string());
    }
    if board.registry.len() > MANY_FILES {
        out.push(String::new());
        out.push("Project with many files".to_string());
        out.push("  Consider organizing the code into packages.".to_string());
    }

    out.push(String::new());
    out.push("=== END OF REPORT ===".to_string());
    Ok(out.join("\n"))
}
