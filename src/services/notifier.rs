//! Digest formatting for the integration engine's per-tick summary
//! (spec.md §4.4 step 8). The `Notifier` port itself lives in
//! `domain::ports`; this module only builds the message strings.

use crate::domain::models::Task;

/// One line per merged task, or a short "nothing merged" message.
pub fn format_merge_digest(merged: &[Task]) -> String {
    if merged.is_empty() {
        return "integration tick: nothing merged".to_string();
    }
    let mut lines = vec![format!("integration tick: {} merged", merged.len())];
    for task in merged {
        lines.push(format!("  #{} {} (branch {})", task.id, task.title, task.branch));
    }
    lines.join("\n")
}

pub fn format_failure_notification(task: &Task, reason: &str) -> String {
    format!("task #{} \"{}\" failed: {reason}", task.id, task.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskCreator;

    #[test]
    fn empty_merge_list_reports_nothing_merged() {
        assert_eq!(format_merge_digest(&[]), "integration tick: nothing merged");
    }

    #[test]
    fn digest_lists_every_merged_task() {
        let t1 = Task::new("Add flag X", "", "/repo", TaskCreator::Director, "");
        let t2 = Task::new("Fix bug Y", "", "/repo", TaskCreator::Director, "");
        let digest = format_merge_digest(&[t1, t2]);
        assert!(digest.contains("2 merged"));
        assert!(digest.contains("Add flag X"));
        assert!(digest.contains("Fix bug Y"));
    }
}
