// Guards write scan notes as plain text with a light checklist convention:
//
//   --- Perimeter ---
//   [x] Gate locked
//   [ ] Lights on
//   anything else is a free-text remark

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum NoteLine {
    Header(String),
    Check { checked: bool, text: String },
    Text(String),
}

pub fn parse_notes(notes: &str) -> Vec<NoteLine> {
    notes.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<NoteLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with("---") {
        return Some(NoteLine::Header(trimmed.replace("---", "").trim().to_string()));
    }

    if trimmed.starts_with("[ ]") || trimmed.starts_with("[x]") {
        return Some(NoteLine::Check {
            checked: trimmed.starts_with("[x]"),
            text: strip_first_marker(trimmed).trim().to_string(),
        });
    }

    Some(NoteLine::Text(trimmed.to_string()))
}

/// Removes the first `[?]` marker from the line, wherever it appears
fn strip_first_marker(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    for i in 0..chars.len().saturating_sub(2) {
        if chars[i] == '[' && chars[i + 2] == ']' {
            return chars[..i].iter().chain(&chars[i + 3..]).collect();
        }
    }
    line.to_string()
}

/// Checked and total checklist items across the notes
pub fn checklist_progress(lines: &[NoteLine]) -> (usize, usize) {
    lines.iter().fold((0, 0), |(checked, total), line| match line {
        NoteLine::Check { checked: true, .. } => (checked + 1, total + 1),
        NoteLine::Check { .. } => (checked, total + 1),
        _ => (checked, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_notes() {
        let notes = "--- Perimeter ---\n[x] Gate locked\n  [ ] Lights on  \n\nDog barking near fence\n";
        let lines = parse_notes(notes);

        assert_eq!(
            lines,
            vec![
                NoteLine::Header("Perimeter".to_string()),
                NoteLine::Check {
                    checked: true,
                    text: "Gate locked".to_string()
                },
                NoteLine::Check {
                    checked: false,
                    text: "Lights on".to_string()
                },
                NoteLine::Text("Dog barking near fence".to_string()),
            ]
        );
        assert_eq!(checklist_progress(&lines), (1, 2));
    }

    #[test]
    fn test_header_strips_every_marker() {
        assert_eq!(
            parse_notes("------ North --- wing ---"),
            vec![NoteLine::Header("North  wing".to_string())]
        );
    }

    #[test]
    fn test_uppercase_x_is_plain_text() {
        assert_eq!(
            parse_notes("[X] not a checkbox"),
            vec![NoteLine::Text("[X] not a checkbox".to_string())]
        );
    }

    #[test]
    fn test_empty_notes() {
        assert!(parse_notes("").is_empty());
        assert!(parse_notes("  \n\t\n").is_empty());
        assert_eq!(checklist_progress(&[]), (0, 0));
    }
}
