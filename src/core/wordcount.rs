//! Per-heading word counts and the `WORDCOUNT` property

use pulldown_cmark::{Event, Parser};

use super::outline::{self, HeadingRef, OutlineDocument, OutlineSyntax, TextOutline};

/// Property written by [`annotate_word_counts`]
pub const WORDCOUNT_PROPERTY: &str = "WORDCOUNT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingWordCount {
    pub heading: HeadingRef,
    /// Words directly under the heading, before any subheading
    pub words: usize,
    /// Words of the heading and all of its subheadings
    pub subtree_words: usize,
}

/// Word counts for every heading in `text`.
///
/// Drawer contents, planning lines and heading titles are not counted.
pub fn heading_word_counts(text: &str, syntax: OutlineSyntax) -> Vec<HeadingWordCount> {
    let headings = outline::scan_headings(text, syntax);
    let own: Vec<usize> = headings
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let end = headings.get(i + 1).map(|h| h.offset).unwrap_or(text.len());
            let body = section_prose(&text[heading.offset..end]);
            count_words(&body, syntax)
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let descendants = headings[i + 1..]
                .iter()
                .take_while(|h| h.level > heading.level)
                .count();
            HeadingWordCount {
                heading: heading.clone(),
                words: own[i],
                subtree_words: own[i..=i + descendants].iter().sum(),
            }
        })
        .collect()
}

/// Section text without its heading line, planning lines and drawers
fn section_prose(section: &str) -> String {
    let mut prose = String::new();
    let mut in_drawer = false;
    for line in outline::lines(section).skip(1) {
        if in_drawer {
            in_drawer = !outline::is_drawer_end(line.content);
            continue;
        }
        if outline::drawer_name(line.content).is_some() {
            in_drawer = true;
            continue;
        }
        if outline::is_planning_line(line.content) {
            continue;
        }
        prose.push_str(line.content);
        prose.push('\n');
    }
    prose
}

fn count_words(prose: &str, syntax: OutlineSyntax) -> usize {
    match syntax {
        OutlineSyntax::Org => prose.split_whitespace().count(),
        OutlineSyntax::Markdown => Parser::new(prose)
            .map(|event| match event {
                Event::Text(text) | Event::Code(text) => text.split_whitespace().count(),
                _ => 0,
            })
            .sum(),
    }
}

/// Write each heading's subtree word count into its `WORDCOUNT` property.
///
/// Returns the number of headings annotated.
pub fn annotate_word_counts(doc: &mut TextOutline) -> usize {
    let counts = heading_word_counts(doc.text(), doc.syntax());
    // Bottom-up so earlier heading offsets stay valid
    for count in counts.iter().rev() {
        doc.set_property(&count.heading, WORDCOUNT_PROPERTY, &count.subtree_words.to_string());
    }
    tracing::info!("Annotated word counts on {} headings", counts.len());
    counts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subtree_counts() {
        let text = "* One\nalpha beta\n** Two\ngamma\n*** Three\ndelta epsilon zeta\n* Four\neta\n";
        let counts: Vec<_> = heading_word_counts(text, OutlineSyntax::Org)
            .into_iter()
            .map(|c| (c.heading.title, c.words, c.subtree_words))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("One".to_string(), 2, 6),
                ("Two".to_string(), 1, 4),
                ("Three".to_string(), 3, 3),
                ("Four".to_string(), 1, 1),
            ]
        );
    }

    #[test]
    fn test_drawers_and_planning_are_skipped() {
        let text = "* Task\nSCHEDULED: <2024-01-01>\n:NOTES:\nprivate words here\n:END:\nreal words\n";
        let counts = heading_word_counts(text, OutlineSyntax::Org);
        assert_eq!(counts[0].words, 2);
    }

    #[test]
    fn test_markdown_counts_rendered_text() {
        let text = "# Intro\nSome **bold** text with a [link](http://example.com)\n";
        let counts = heading_word_counts(text, OutlineSyntax::Markdown);
        assert_eq!(counts[0].words, 6);
    }

    #[test]
    fn test_annotate_writes_properties() {
        let mut doc = TextOutline::new("* A\none two\n** B\nthree\n", OutlineSyntax::Org);
        assert_eq!(annotate_word_counts(&mut doc), 2);
        assert_eq!(
            doc.text(),
            "* A\n:PROPERTIES:\n:WORDCOUNT: 3\n:END:\none two\n** B\n:PROPERTIES:\n:WORDCOUNT: 1\n:END:\nthree\n"
        );

        // Running again only updates the values
        doc.text_mut().push_str("four\n");
        annotate_word_counts(&mut doc);
        let headings = doc.headings();
        assert_eq!(doc.property(&headings[0], WORDCOUNT_PROPERTY), Some("4".to_string()));
        assert_eq!(doc.property(&headings[1], WORDCOUNT_PROPERTY), Some("2".to_string()));
        assert_eq!(doc.text().matches(":PROPERTIES:").count(), 2);
    }
}
