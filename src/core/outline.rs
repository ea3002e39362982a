//! Outline document model: headings, metadata regions and named drawers
//!
//! Documents are plain text. Headings are recognised per [`OutlineSyntax`];
//! drawers are `:NAME:` ... `:END:` line pairs. Positions are byte offsets
//! into the text.

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

/// Heading syntax of an outline document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlineSyntax {
    /// `* Heading`, `** Subheading`, ...
    Org,
    /// `# Heading`, `## Subheading`, ... (up to six levels)
    #[default]
    Markdown,
}

impl OutlineSyntax {
    /// Pick the syntax from a file extension: `.org` is Org, anything else Markdown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("org") => Self::Org,
            _ => Self::Markdown,
        }
    }

    /// Heading level of a single line, ignoring code-fence context
    pub fn heading_level(self, line: &str) -> Option<usize> {
        let marker = match self {
            Self::Org => '*',
            Self::Markdown => '#',
        };
        let level = line.chars().take_while(|&c| c == marker).count();
        if level == 0 || (self == Self::Markdown && level > 6) {
            return None;
        }
        // Markers are ASCII, so `level` is also a byte index.
        match line[level..].chars().next() {
            None | Some(' ') | Some('\t') => Some(level),
            _ => None,
        }
    }
}

/// A heading located in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    /// Zero-based line index of the heading line
    pub line: usize,
    /// Byte offset of the start of the heading line
    pub offset: usize,
    /// Nesting level (number of markers)
    pub level: usize,
    /// Heading title without markers
    pub title: String,
}

/// The span directly below a heading's metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Offset of the first line below the heading line, planning line and property drawer
    pub start: usize,
    /// Offset of the next heading, or the end of the text
    pub end: usize,
}

/// Boundaries of a named drawer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
    pub name: String,
    /// Offset of the start marker line
    pub start: usize,
    /// Offset of the first body line (just after the start marker line)
    pub body_start: usize,
    /// Offset of the end marker line
    pub end_marker: usize,
    /// Offset just past the end marker line
    pub end: usize,
}

impl BlockRef {
    pub fn body(&self) -> Range<usize> {
        self.body_start..self.end_marker
    }
}

/// Capabilities the drawer logic needs from a hierarchical document.
///
/// [`TextOutline`] implements this over a plain string; tests may
/// substitute their own.
pub trait OutlineDocument {
    /// Full document text
    fn text(&self) -> &str;

    /// Nearest heading whose line starts at or before `pos`
    fn find_enclosing_heading(&self, pos: usize) -> Option<HeadingRef>;

    /// Span below the heading's own metadata region
    fn region_after_heading(&self, heading: &HeadingRef) -> Region;

    /// Drawer named `name` whose start marker line begins at `at`.
    ///
    /// Returns `None` when the line at `at` is not a matching start marker or
    /// when no end marker follows before the next heading.
    fn find_block_boundaries(&self, at: usize, name: &str) -> Option<BlockRef>;

    /// Insert a well-formed drawer at the line starting at `at`
    fn insert_block(&mut self, at: usize, name: &str, body: &str) -> BlockRef;

    /// Insert raw text at `at`
    fn insert_text(&mut self, at: usize, text: &str);

    fn set_block_visibility(&mut self, block: &BlockRef, visible: bool);

    fn is_block_visible(&self, block: &BlockRef) -> bool;

    /// Terminator for inserted lines, matching the document's first line
    fn line_ending(&self) -> &'static str;
}

fn drawer_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*:([A-Za-z0-9_-]+):[ \t]*$").expect("drawer start pattern"))
}

fn drawer_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[ \t]*:END:[ \t]*$").expect("drawer end pattern"))
}

fn planning_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t]*(SCHEDULED|DEADLINE|CLOSED):").expect("planning line pattern")
    })
}

fn property_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*:([^:\s]+):(?:[ \t]+(.*))?$").expect("property pattern"))
}

/// A line of text with its position
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub index: usize,
    pub offset: usize,
    /// Offset just past the line terminator
    pub next: usize,
    /// Line content without the terminator
    pub content: &'a str,
}

pub(crate) fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n').enumerate().map(move |(index, raw)| {
        let start = offset;
        offset += raw.len();
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        Line {
            index,
            offset: start,
            next: offset,
            content,
        }
    })
}

/// Name of the drawer opened by this line, if it is a start marker
pub(crate) fn drawer_name(line: &str) -> Option<&str> {
    if drawer_end_re().is_match(line) {
        return None;
    }
    drawer_start_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub(crate) fn is_drawer_end(line: &str) -> bool {
    drawer_end_re().is_match(line)
}

pub(crate) fn is_planning_line(line: &str) -> bool {
    planning_re().is_match(line)
}

/// All headings of `text`, skipping Markdown fenced code
pub fn scan_headings(text: &str, syntax: OutlineSyntax) -> Vec<HeadingRef> {
    let mut headings = Vec::new();
    let mut in_fence = false;
    for line in lines(text) {
        if syntax == OutlineSyntax::Markdown {
            let trimmed = line.content.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
        }
        if let Some(level) = syntax.heading_level(line.content) {
            headings.push(HeadingRef {
                line: line.index,
                offset: line.offset,
                level,
                title: line.content[level..].trim().to_string(),
            });
        }
    }
    headings
}

/// A text document with outline structure and drawer folding state
#[derive(Debug, Clone, Default)]
pub struct TextOutline {
    text: String,
    syntax: OutlineSyntax,
    /// Start offsets of folded drawers
    folded: BTreeSet<usize>,
}

impl TextOutline {
    pub fn new(text: impl Into<String>, syntax: OutlineSyntax) -> Self {
        Self {
            text: text.into(),
            syntax,
            folded: BTreeSet::new(),
        }
    }

    pub fn syntax(&self) -> OutlineSyntax {
        self.syntax
    }

    /// Mutable access for the editor widget.
    ///
    /// Callers editing through this must call [`TextOutline::retain_valid_folds`]
    /// afterwards.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn headings(&self) -> Vec<HeadingRef> {
        scan_headings(&self.text, self.syntax)
    }

    /// Offset of the heading after `heading`, or the end of the text
    fn section_end(&self, heading: &HeadingRef) -> usize {
        self.headings()
            .into_iter()
            .find(|h| h.offset > heading.offset)
            .map(|h| h.offset)
            .unwrap_or(self.text.len())
    }

    /// Drawer starting at `at` bounded by `limit`, regardless of name
    fn drawer_at(&self, at: usize, limit: usize) -> Option<BlockRef> {
        let mut iter = lines(&self.text[at..limit]);
        let first = iter.next()?;
        let name = drawer_name(first.content)?.to_string();
        let end = iter.find(|line| is_drawer_end(line.content))?;
        Some(BlockRef {
            name,
            start: at,
            body_start: at + first.next,
            end_marker: at + end.offset,
            end: at + end.next,
        })
    }

    /// Offset below the heading line and an optional planning line
    fn after_planning(&self, heading: &HeadingRef, limit: usize) -> usize {
        let mut iter = lines(&self.text[heading.offset..limit]);
        let Some(title) = iter.next() else {
            return limit;
        };
        let mut pos = heading.offset + title.next;
        if let Some(line) = iter.next() {
            if is_planning_line(line.content) {
                pos = heading.offset + line.next;
            }
        }
        pos
    }

    /// Property drawer of `heading`, if any
    pub fn property_drawer(&self, heading: &HeadingRef) -> Option<BlockRef> {
        let limit = self.section_end(heading);
        let at = self.after_planning(heading, limit);
        self.drawer_at(at, limit)
            .filter(|block| block.name.eq_ignore_ascii_case("PROPERTIES"))
    }

    /// Value of property `key` on `heading`
    pub fn property(&self, heading: &HeadingRef, key: &str) -> Option<String> {
        let block = self.property_drawer(heading)?;
        lines(&self.text[block.body()]).find_map(|line| {
            let caps = property_re().captures(line.content)?;
            let name = caps.get(1)?.as_str();
            name.eq_ignore_ascii_case(key)
                .then(|| caps.get(2).map(|v| v.as_str().trim().to_string()).unwrap_or_default())
        })
    }

    /// Set property `key` on `heading`, creating the property drawer if needed
    pub fn set_property(&mut self, heading: &HeadingRef, key: &str, value: &str) {
        let eol = self.line_ending();
        let entry = format!(":{key}: {value}{eol}");
        match self.property_drawer(heading) {
            Some(block) => {
                let existing = lines(&self.text[block.body()]).find_map(|line| {
                    let caps = property_re().captures(line.content)?;
                    let name = caps.get(1)?.as_str();
                    name.eq_ignore_ascii_case(key).then(|| {
                        let range = block.body_start + line.offset..block.body_start + line.next;
                        let terminator = &self.text[range.start + line.content.len()..range.end];
                        (range, format!(":{name}: {value}{terminator}"))
                    })
                });
                match existing {
                    Some((range, replacement)) => self.splice(range, &replacement),
                    None => self.splice(block.end_marker..block.end_marker, &entry),
                }
            }
            None => {
                let limit = self.section_end(heading);
                let at = self.after_planning(heading, limit);
                let prefix = self.line_break_before(at);
                let drawer = format!("{prefix}:PROPERTIES:{eol}{entry}:END:{eol}");
                self.splice(at..at, &drawer);
            }
        }
    }

    /// A newline if inserting at `at` would otherwise join the previous line
    fn line_break_before(&self, at: usize) -> &'static str {
        if at > 0 && !self.text[..at].ends_with('\n') {
            self.line_ending()
        } else {
            ""
        }
    }

    /// Every well-formed drawer in the document
    pub fn drawers(&self) -> Vec<BlockRef> {
        let mut blocks = Vec::new();
        let mut bounds: Vec<usize> = self.headings().into_iter().map(|h| h.offset).collect();
        bounds.push(self.text.len());
        let mut section_start = 0;
        for section_end in bounds {
            let mut pos = section_start;
            while pos < section_end {
                if let Some(block) = self.drawer_at(pos, section_end) {
                    pos = block.end;
                    blocks.push(block);
                    continue;
                }
                pos = lines(&self.text[pos..section_end])
                    .next()
                    .map(|line| pos + line.next)
                    .unwrap_or(section_end);
            }
            section_start = section_end;
        }
        blocks
    }

    /// Fold every drawer in the document
    pub fn collapse_drawers(&mut self) {
        self.folded = self.drawers().into_iter().map(|block| block.start).collect();
    }

    /// Drop fold marks that no longer point at a drawer start
    pub fn retain_valid_folds(&mut self) {
        let starts: BTreeSet<usize> = self.drawers().into_iter().map(|block| block.start).collect();
        self.folded.retain(|offset| starts.contains(offset));
    }

    /// Text with the bodies of folded drawers elided
    pub fn folded_view(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut pos = 0;
        for block in self.drawers() {
            if !self.folded.contains(&block.start) {
                continue;
            }
            out.push_str(&self.text[pos..block.start]);
            let marker = self.text[block.start..block.body_start].trim_end();
            out.push_str(marker);
            out.push_str("...\n");
            pos = block.end;
        }
        out.push_str(&self.text[pos..]);
        out
    }

    /// Replace `range` with `replacement`, keeping fold marks attached to their drawers
    fn splice(&mut self, range: Range<usize>, replacement: &str) {
        let removed = range.end - range.start;
        let added = replacement.len();
        self.text.replace_range(range.clone(), replacement);
        self.folded = std::mem::take(&mut self.folded)
            .into_iter()
            .filter_map(|offset| {
                if offset < range.start {
                    Some(offset)
                } else if removed == 0 || offset >= range.end {
                    Some(offset + added - removed)
                } else {
                    None
                }
            })
            .collect();
    }
}

impl OutlineDocument for TextOutline {
    fn text(&self) -> &str {
        &self.text
    }

    fn find_enclosing_heading(&self, pos: usize) -> Option<HeadingRef> {
        let pos = pos.min(self.text.len());
        self.headings().into_iter().take_while(|h| h.offset <= pos).last()
    }

    fn region_after_heading(&self, heading: &HeadingRef) -> Region {
        let end = self.section_end(heading);
        let mut start = self.after_planning(heading, end);
        if let Some(block) = self
            .drawer_at(start, end)
            .filter(|block| block.name.eq_ignore_ascii_case("PROPERTIES"))
        {
            start = block.end;
        }
        Region { start, end }
    }

    fn find_block_boundaries(&self, at: usize, name: &str) -> Option<BlockRef> {
        if !self.text.is_char_boundary(at) {
            return None;
        }
        let limit = self
            .headings()
            .into_iter()
            .find(|h| h.offset > at)
            .map(|h| h.offset)
            .unwrap_or(self.text.len());
        self.drawer_at(at, limit)
            .filter(|block| block.name.eq_ignore_ascii_case(name))
    }

    fn insert_block(&mut self, at: usize, name: &str, body: &str) -> BlockRef {
        let eol = self.line_ending();
        let prefix = self.line_break_before(at);
        let body = body.strip_suffix('\n').unwrap_or(body);
        let body = body.strip_suffix('\r').unwrap_or(body);
        let block = format!("{prefix}:{name}:{eol}{body}{eol}:END:{eol}");
        self.splice(at..at, &block);

        let start = at + prefix.len();
        let body_start = start + name.len() + 2 + eol.len();
        let end_marker = body_start + body.len() + eol.len();
        BlockRef {
            name: name.to_string(),
            start,
            body_start,
            end_marker,
            end: end_marker + ":END:".len() + eol.len(),
        }
    }

    fn insert_text(&mut self, at: usize, text: &str) {
        self.splice(at..at, text);
    }

    fn set_block_visibility(&mut self, block: &BlockRef, visible: bool) {
        if visible {
            self.folded.remove(&block.start);
        } else {
            self.folded.insert(block.start);
        }
    }

    fn is_block_visible(&self, block: &BlockRef) -> bool {
        !self.folded.contains(&block.start)
    }

    fn line_ending(&self) -> &'static str {
        match self.text.find('\n') {
            Some(i) if self.text[..i].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }
}
