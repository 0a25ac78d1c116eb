use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

use crate::config::DIAGNOSTIC_SOURCE;
use crate::lint::Problem;

/// Converts checker problems into LSP diagnostics.
///
/// Each diagnostic covers the part of the line past `max_length`.
pub fn to_diagnostics(problems: &[Problem], max_length: u32) -> Vec<Diagnostic> {
    problems
        .iter()
        .map(|problem| Diagnostic {
            range: Range {
                start: Position {
                    line: problem.line,
                    character: max_length,
                },
                end: Position {
                    line: problem.line,
                    character: u32::MAX,
                },
            },
            severity: Some(DiagnosticSeverity::WARNING),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: problem.message.clone(),
            ..Default::default()
        })
        .collect()
}
