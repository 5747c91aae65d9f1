//! Plain-text rendering of a [`Presentation`]

use crate::config::UiSettings;
use crate::controller::Presentation;
use crate::models::Source;

/// Render the view the way the terminal front end prints it
pub fn render(view: &Presentation, ui: &UiSettings) -> String {
    let mut lines = Vec::new();

    if view.is_loading {
        lines.push(match &view.query {
            Some(query) => format!("Searching for \"{}\"...", query),
            None => "Searching...".to_string(),
        });
    }

    if let Some(error) = &view.error {
        lines.push(format!("Error: {}", error));
    }

    if let Some(answer) = &view.answer {
        lines.push("Answer".to_string());
        lines.push(answer.trim_end().to_string());
    }

    if !view.sources.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Sources".to_string());
        for source in &view.sources {
            render_source(&mut lines, source, ui);
        }
    }

    lines.into_iter().map(|line| line + "\n").collect()
}

fn render_source(lines: &mut Vec<String>, source: &Source, ui: &UiSettings) {
    let mut heading = format!("  [{}] {}", source.position, source.title);
    if ui.show_hosts {
        if let Some(host) = source.hostname() {
            heading.push_str(&format!(" ({})", host));
        }
    }
    lines.push(heading);

    lines.push(format!("      {}", source.link));
    if !source.snippet.is_empty() {
        lines.push(format!("      {}", source.snippet));
    }
    if ui.show_dates {
        if let Some(date) = &source.date {
            lines.push(format!("      {}", date));
        }
    }
}
