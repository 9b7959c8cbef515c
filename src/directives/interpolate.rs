//! Text interpolation - `{{ expr }}` markers inside text nodes.
//!
//! A marker is the shortest run of at least one character between an
//! opening and a closing delimiter, on a single line. `{{}}` and markers
//! broken across lines are left as literal text.

use std::rc::Rc;

use crate::config::CompilerConfig;
use crate::error::Result;
use crate::reactive::{tracking, Model};

/// One piece of a text node's template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// The raw expression between the delimiters (untrimmed).
    Expr(String),
}

/// The parsed content of one text node, kept for whole-node re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Rc<[Segment]>,
}

impl Template {
    /// Split text into literal and expression segments.
    pub fn parse(text: &str, config: &CompilerConfig) -> Self {
        let open = config.open_delimiter.as_str();
        let close = config.close_delimiter.as_str();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find(open) {
            let start = cursor + found;
            match find_marker_end(text, start + open.len(), close) {
                Some(expr_end) => {
                    if start > literal_start {
                        segments.push(Segment::Literal(text[literal_start..start].to_string()));
                    }
                    segments.push(Segment::Expr(text[start + open.len()..expr_end].to_string()));
                    literal_start = expr_end + close.len();
                    cursor = literal_start;
                }
                None => {
                    // Retry from the next character, as a regex scan would
                    cursor = start + text[start..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        if literal_start < text.len() {
            segments.push(Segment::Literal(text[literal_start..].to_string()));
        }

        Self {
            segments: segments.into(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Expressions in order of appearance, duplicates included.
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Expr(expr) => Some(expr.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_expressions(&self) -> bool {
        self.expressions().next().is_some()
    }

    /// Evaluate every expression and join the result with the literals.
    ///
    /// Reads here never subscribe anything; subscriptions belong to the
    /// per-expression watchers.
    pub fn render(&self, model: &Model) -> Result<String> {
        tracking::untracked(|| {
            let mut out = String::new();
            for segment in self.segments.iter() {
                match segment {
                    Segment::Literal(text) => out.push_str(text),
                    Segment::Expr(expr) => out.push_str(&model.get(expr)?.to_string()),
                }
            }
            Ok(out)
        })
    }
}

/// Check if text contains at least one interpolation marker.
pub fn has_interpolation(text: &str, config: &CompilerConfig) -> bool {
    text.contains(config.open_delimiter.as_str()) && Template::parse(text, config).has_expressions()
}

/// Byte offset where the expression starting at `expr_start` ends, if a
/// closing delimiter follows at least one character later on the same line.
fn find_marker_end(text: &str, expr_start: usize, close: &str) -> Option<usize> {
    let rest = &text[expr_start..];
    let first = rest.chars().next().filter(|&c| c != '\n')?;
    let search_from = first.len_utf8();
    let end = search_from + rest[search_from..].find(close)?;
    if rest[..end].contains('\n') {
        return None;
    }
    Some(expr_start + end)
}
