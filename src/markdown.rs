//! Markdown section codec.
//!
//! A summary body is stored as a list of sections, each one a markdown block
//! that starts with a top-level `# ` header. This module converts between
//! that list and a single markdown blob used for free-form editing.

/// Separator placed between sections when joining.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Whether `line` opens a new section (`# ` at column zero, one `#` only).
pub fn is_top_level_header(line: &str) -> bool {
    line.starts_with("# ")
}

/// Split markdown text into sections.
///
/// Any text before the first top-level header is discarded. Use
/// [`split_with_preamble`] to find out what was dropped.
pub fn split(text: &str) -> Vec<String> {
    split_with_preamble(text).1
}

/// Split markdown text into sections, also returning the trimmed preamble
/// that precedes the first top-level header.
pub fn split_with_preamble(text: &str) -> (String, Vec<String>) {
    let mut preamble: Vec<&str> = Vec::new();
    let mut raw_sections: Vec<Vec<&str>> = Vec::new();

    for line in text.lines() {
        if is_top_level_header(line) {
            raw_sections.push(vec![line]);
        } else if let Some(current) = raw_sections.last_mut() {
            current.push(line);
        } else {
            preamble.push(line);
        }
    }

    let sections: Vec<String> = raw_sections
        .into_iter()
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|section| !section.is_empty())
        .collect();

    tracing::debug!(sections = sections.len(), "split markdown body");

    (preamble.join("\n").trim().to_string(), sections)
}

/// Join sections into one markdown blob, preserving order.
pub fn join<S: AsRef<str>>(sections: &[S]) -> String {
    sections
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_headers() {
        let text = "# One\nfirst\n\n# Two\nsecond";
        assert_eq!(split(text), vec!["# One\nfirst", "# Two\nsecond"]);
    }

    #[test]
    fn nested_headers_stay_inside_their_section() {
        let text = "# Intro\n## Detail\nbody\n### Deeper\nmore";
        assert_eq!(split(text), vec![text.to_string()]);
    }

    #[test]
    fn hash_without_space_is_not_a_header() {
        let text = "# Tags\n#rust #notes\nend";
        assert_eq!(split(text).len(), 1);
    }

    #[test]
    fn preamble_is_dropped_but_reported() {
        let (preamble, sections) = split_with_preamble("loose text\n\n# Real\nbody");
        assert_eq!(preamble, "loose text");
        assert_eq!(sections, vec!["# Real\nbody"]);
        assert_eq!(split("no headers at all"), Vec::<String>::new());
    }

    #[test]
    fn whitespace_only_input_gives_no_sections() {
        assert!(split("").is_empty());
        assert!(split("   \n\n  ").is_empty());
    }

    #[test]
    fn sections_are_trimmed() {
        let text = "# A\nbody\n\n\n   \n# B\n\n";
        assert_eq!(split(text), vec!["# A\nbody", "# B"]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        assert_eq!(split("# A\r\nx\r\n# B\r\ny"), vec!["# A\nx", "# B\ny"]);
    }

    #[test]
    fn join_uses_blank_line_separator() {
        assert_eq!(join(&["# A", "# B\nb"]), "# A\n\n# B\nb");
        assert_eq!(join::<&str>(&[]), "");
    }

    #[test]
    fn split_of_join_is_identity_for_well_formed_sections() {
        let cases: Vec<Vec<&str>> = vec![
            vec!["# Only"],
            vec!["# A\nalpha", "# B\n## sub\nbeta", "# C\n- item\n- item"],
            vec!["# Code\n```\nlet x = 1;\n```", "# Quote\n> quoted\n\ntrailing paragraph"],
            vec!["# 한국어 제목\n본문", "# Émoji 🎉\ntext"],
        ];
        for sections in cases {
            let expected: Vec<String> = sections.iter().map(|s| s.to_string()).collect();
            assert_eq!(split(&join(&sections)), expected);
        }
    }

    #[test]
    fn trailing_whitespace_section_is_dropped_on_round_trip() {
        let sections = vec!["# A\nbody".to_string(), "  \n".to_string()];
        assert_eq!(split(&join(&sections)), vec!["# A\nbody"]);
    }

    quickcheck::quickcheck! {
        fn split_inverts_join(raw: Vec<(String, String)>) -> bool {
            let sections = testing::well_formed_sections(raw);
            split(&join(&sections)) == sections
        }

        fn split_yields_trimmed_sections_opened_by_a_header(text: String) -> bool {
            split(&text)
                .iter()
                .all(|section| section.starts_with('#') && section.trim() == section)
        }
    }
}
