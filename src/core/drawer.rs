//! Notes drawer detection-or-creation under the heading at the cursor

use std::ops::Range;

use thiserror::Error;

use super::outline::OutlineDocument;

/// Default drawer name
pub const NOTES_DRAWER: &str = "NOTES";

/// Shown once after the drawer is ready; never logged
pub const RETURN_HINT: &str = "Press Ctrl+Shift+J to jump back to where you were";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawerError {
    #[error("no heading found")]
    NoEnclosingHeading,
}

/// What `ensure_drawer` did, for the caller to apply to its cursor and UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawerHandle {
    /// Line index of the heading the drawer belongs to
    pub heading_line: usize,
    /// Offset of the drawer's start marker line
    pub start: usize,
    /// Offset just past the drawer's end marker line
    pub end: usize,
    /// Where the cursor should go: an empty line just above the end marker
    pub cursor: usize,
    /// Whether a new drawer was inserted
    pub created: bool,
    /// Whether a folded drawer was made visible
    pub revealed: bool,
    /// Span of text added to the document, if any.
    ///
    /// Offsets at or after `inserted.start` moved down by its length.
    pub inserted: Option<Range<usize>>,
}

impl DrawerHandle {
    pub fn hint(&self) -> &'static str {
        RETURN_HINT
    }
}

/// Make sure the heading enclosing `pos` has exactly one drawer named `name`
/// right below its metadata, and return a cursor position at its tail.
///
/// The document is only touched after the enclosing heading is found, and the
/// existing-or-create decision reads the document under the same `&mut`
/// borrow that performs the write.
pub fn ensure_drawer<D>(doc: &mut D, pos: usize, name: &str) -> Result<DrawerHandle, DrawerError>
where
    D: OutlineDocument + ?Sized,
{
    let heading = doc
        .find_enclosing_heading(pos)
        .ok_or(DrawerError::NoEnclosingHeading)?;
    let region = doc.region_after_heading(&heading);

    if let Some(mut block) = doc.find_block_boundaries(region.start, name) {
        let revealed = !doc.is_block_visible(&block);
        if revealed {
            doc.set_block_visibility(&block, true);
        }

        let body = &doc.text()[block.body()];
        let ends_with_blank_line = body
            .strip_suffix('\n')
            .map(|rest| rest.rsplit('\n').next().unwrap_or(rest))
            .is_some_and(|line| line.trim().is_empty());
        // Reuse a trailing blank line instead of growing the drawer
        let mut inserted = None;
        if !ends_with_blank_line {
            let eol = doc.line_ending();
            doc.insert_text(block.end_marker, eol);
            inserted = Some(block.end_marker..block.end_marker + eol.len());
            block.end_marker += eol.len();
            block.end += eol.len();
        }
        let terminator = if doc.text()[..block.end_marker].ends_with("\r\n") { 2 } else { 1 };
        let cursor = block.end_marker - terminator;

        tracing::debug!(heading = %heading.title, revealed, "Reopened {} drawer", name);
        return Ok(DrawerHandle {
            heading_line: heading.line,
            start: block.start,
            end: block.end,
            cursor,
            created: false,
            revealed,
            inserted,
        });
    }

    let block = doc.insert_block(region.start, name, "");
    let inserted = region.start..block.end;
    tracing::debug!(heading = %heading.title, "Created {} drawer", name);
    Ok(DrawerHandle {
        heading_line: heading.line,
        start: block.start,
        end: block.end,
        cursor: block.body_start,
        created: true,
        revealed: false,
        inserted: Some(inserted),
    })
}
