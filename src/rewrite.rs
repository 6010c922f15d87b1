//! Source rewriting: queued edits over the original text, applied once
//! at the end of the pipeline.

use crate::passes::InternalError;
use crate::span::Span;

/// Replace `span` of the original source with `text`. An empty span is an
/// insertion at `span.start`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub text: String,
}

impl Edit {
    pub fn is_insertion(&self) -> bool {
        self.span.is_empty()
    }
}

/// Ordered set of non-overlapping edits.
///
/// A replacement that covers earlier edits subsumes them: its text was
/// printed from the already rewritten subtree.
#[derive(Clone, Debug, Default)]
pub struct RewriteBuffer {
    edits: Vec<Edit>,
}

impl RewriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Queue a replacement of `span`, dropping the edits it contains.
    pub fn replace(&mut self, span: Span, text: String) -> Result<(), InternalError> {
        if let Some(clash) = self.edits.iter().find(|e| partially_overlaps(e.span, span)) {
            return Err(InternalError::OverlappingRewrite {
                existing: clash.span,
                new: span,
            });
        }
        self.edits.retain(|e| !inside(e, span));
        self.edits.push(Edit { span, text });
        Ok(())
    }

    /// Queue an insertion of `text` before the byte at `offset`.
    pub fn insert(&mut self, offset: u32, text: String) -> Result<(), InternalError> {
        let at = Span::point(offset);
        if let Some(clash) = self
            .edits
            .iter()
            .find(|e| e.span.start < offset && offset < e.span.end)
        {
            return Err(InternalError::OverlappingRewrite {
                existing: clash.span,
                new: at,
            });
        }
        self.edits.push(Edit { span: at, text });
        Ok(())
    }

    /// The text of `span` with every edit inside it applied. Insertions on
    /// the edges of `span` belong to the surrounding text.
    pub fn render_span(&self, source: &str, span: Span) -> String {
        let edits = self.edits.iter().filter(|e| inside(e, span));
        splice(source, span, edits)
    }

    /// The whole source with all edits applied.
    pub fn apply(&self, source: &str) -> String {
        splice(source, Span::new(0, source.len() as u32), self.edits.iter())
    }
}

fn splice<'a>(source: &str, span: Span, edits: impl Iterator<Item = &'a Edit>) -> String {
    let mut edits: Vec<&Edit> = edits.collect();
    // stable, so insertions at one offset keep their queue order
    edits.sort_by_key(|e| (e.span.start, !e.is_insertion()));

    let mut out = String::with_capacity(span.len() as usize);
    let mut cursor = span.start as usize;
    for edit in edits {
        let start = edit.span.start as usize;
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.text);
        cursor = edit.span.end as usize;
    }
    out.push_str(&source[cursor..span.end as usize]);
    out
}

/// Whether `edit` lies within `span`, edge insertions excluded.
fn inside(edit: &Edit, span: Span) -> bool {
    if edit.is_insertion() {
        span.start < edit.span.start && edit.span.start < span.end
    } else {
        span.contains(edit.span)
    }
}

/// The spans share bytes but neither contains the other.
fn partially_overlaps(a: Span, b: Span) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.start < b.end && b.start < a.end && !a.contains(b) && !b.contains(a)
}
