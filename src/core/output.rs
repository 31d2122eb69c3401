//! Terminal rendering for CLI surfaces.
//!
//! Failure summaries for fan-out errors and the `discover` listing.

use crate::core::record::DedupedView;
use colored::Colorize;

/// One-line summary of per-team failures: the first `shown` messages, each
/// flattened and clipped to `width` chars, then a count of the rest.
pub fn failure_summary(messages: &[String], shown: usize, width: usize) -> String {
    let mut parts = messages
        .iter()
        .take(shown)
        .map(|m| one_line(m, width))
        .collect::<Vec<_>>();
    let hidden = messages.len().saturating_sub(shown);
    if hidden > 0 {
        parts.push(format!("and {} more", hidden));
    }
    parts.join("; ")
}

fn one_line(message: &str, width: usize) -> String {
    let flat = message.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(width) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// Human-readable listing of a discovery view, one bot per line.
pub fn render_view(view: &DedupedView) -> String {
    if view.records.is_empty() {
        return "No CA bots found in any team.".to_string();
    }
    let mut records = view.records.iter().collect::<Vec<_>>();
    records.sort_by(|a, b| a.bot_name.cmp(&b.bot_name));

    let mut lines = Vec::with_capacity(records.len() + 1);
    for record in records {
        let channel = if record.channel.is_empty() {
            String::new()
        } else {
            format!(" #{}", record.channel)
        };
        lines.push(format!(
            "{} {}{}",
            record.bot_name.bright_cyan().bold(),
            record.team,
            channel.dimmed()
        ));
    }
    let mut teams = view.teams.clone();
    teams.sort();
    lines.push(format!("teams: {}", teams.join(", ")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::DiscoveryRecord;

    #[test]
    fn failure_summary_flattens_clips_and_counts() {
        let msgs = vec![
            "eng: permission\n denied".to_string(),
            "ops: timed out waiting for the mount".to_string(),
            "infra: gone".to_string(),
        ];
        assert_eq!(
            failure_summary(&msgs, 2, 12),
            "eng: permiss...; ops: timed o...; and 1 more"
        );
        assert_eq!(failure_summary(&msgs[2..], 3, 80), "infra: gone");
        assert_eq!(failure_summary(&[], 3, 80), "");
    }

    #[test]
    fn render_view_lists_teams_and_bots() {
        colored::control::set_override(false);
        let view = DedupedView {
            records: vec![DiscoveryRecord::new("eng", "", "bot1")],
            teams: vec!["ops".to_string(), "eng".to_string()],
        };
        let rendered = render_view(&view);
        assert!(rendered.contains("bot1 eng"));
        assert!(rendered.ends_with("teams: eng, ops"));
        assert_eq!(
            render_view(&DedupedView::default()),
            "No CA bots found in any team."
        );
    }
}
