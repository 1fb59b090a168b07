//! Terminal rendering of a summary document.

use crate::document::SummaryDocument;
use colored::Colorize;
use std::fmt;

/// Render a document for the terminal. Shared documents are marked read-only.
pub fn render(doc: &SummaryDocument) -> String {
    Rendered(doc).to_string()
}

struct Rendered<'a>(&'a SummaryDocument);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.0;

        let title = if doc.is_complete() { doc.title() } else { "(untitled)" };
        write!(f, "=== {} ===", title.bold())?;
        if doc.is_read_only() {
            write!(f, " {}", "[shared, read-only]".dimmed())?;
        }
        writeln!(f)?;
        writeln!(f)?;

        if !doc.keywords().is_empty() {
            writeln!(f, "{}", "🏷️  Keywords:".cyan())?;
            for (index, keyword) in doc.keywords().iter().enumerate() {
                writeln!(f, "  {}. #{}", index, keyword)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", "📌 Summary:".cyan())?;
        if doc.sections().is_empty() {
            writeln!(f, "  {}", "(empty)".dimmed())?;
        }
        for (index, section) in doc.sections().iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            for line in section.lines() {
                writeln!(f, "  {}", line)?;
            }
        }

        if !doc.insights().trim().is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", "💡 Insights:".cyan())?;
            for line in doc.insights().lines() {
                writeln!(f, "  {}", line)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_all_parts() {
        colored::control::set_override(false);
        let doc = SummaryDocument::new(
            "Title",
            vec!["a".into(), "b".into()],
            &["# One\nbody".to_string(), "# Two".to_string()],
            "look here",
        );
        let text = render(&doc);
        assert!(text.starts_with("=== Title ===\n\n"));
        assert!(text.contains("  0. #a\n  1. #b\n"));
        assert!(text.contains("  # One\n  body\n\n  # Two\n"));
        assert!(text.contains("Insights:\n  look here\n"));
        assert!(!text.contains("read-only"));
        assert!(text.ends_with("  look here\n"));
    }

    #[test]
    fn sections_are_separated_by_one_blank_line() {
        colored::control::set_override(false);
        let doc = SummaryDocument::new("T", vec![], &["# A".to_string(), "# B".to_string()], "");
        assert_eq!(
            render(&doc),
            "=== T ===\n\n📌 Summary:\n  # A\n\n  # B\n"
        );
    }

    #[test]
    fn marks_shared_documents() {
        colored::control::set_override(false);
        let doc = SummaryDocument::new("", vec![], &[], "");
        let shared = crate::share::decode(&crate::share::encode(&doc)).unwrap();
        let text = render(&shared);
        assert!(text.starts_with("=== (untitled) === [shared, read-only]"));
        assert!(text.contains("(empty)"));
    }
}
