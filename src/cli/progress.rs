// src/cli/progress.rs — Terminal progress renderer for the refinement loop

use crate::core::types::ProgressEvent;

/// One stderr line per event.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Generated { chars } => format!("[draft] initial notebook ({chars} chars)"),
        ProgressEvent::RoundStart { round, total } => {
            format!("[round {round}/{total}] critiquing...")
        }
        ProgressEvent::Critiqued { round, chars } => {
            format!("[round {round}]   critique: {chars} chars")
        }
        ProgressEvent::Revised { round, chars } => {
            format!("[round {round}]   revised: {chars} chars")
        }
        ProgressEvent::Summarized { round, chars } => {
            format!("[round {round}]   summary: {chars} chars")
        }
        ProgressEvent::Complete { rounds, calls } => {
            format!("[done] rounds={rounds} completions={calls}")
        }
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for results.
/// Returns a closure suitable for `NotebookPipeline::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_start_format() {
        assert_eq!(
            format_event(&ProgressEvent::RoundStart { round: 1, total: 3 }),
            "[round 1/3] critiquing..."
        );
    }

    #[test]
    fn test_generated_format() {
        assert_eq!(
            format_event(&ProgressEvent::Generated { chars: 812 }),
            "[draft] initial notebook (812 chars)"
        );
    }

    #[test]
    fn test_complete_format() {
        assert_eq!(
            format_event(&ProgressEvent::Complete { rounds: 2, calls: 5 }),
            "[done] rounds=2 completions=5"
        );
    }

    #[test]
    fn test_revised_and_summary_format() {
        assert_eq!(
            format_event(&ProgressEvent::Revised { round: 2, chars: 40 }),
            "[round 2]   revised: 40 chars"
        );
        assert_eq!(
            format_event(&ProgressEvent::Summarized { round: 2, chars: 9 }),
            "[round 2]   summary: 9 chars"
        );
    }
}
