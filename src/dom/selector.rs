//! Selectors - CSS selector subset used to locate the root element.
//!
//! Supported:
//! - type (`div`), universal (`*`), id (`#app`), class (`.card`)
//! - attribute presence (`[v-model]`) and equality (`[type=text]`, quoted or not)
//! - descendant (` `) and child (`>`) combinators
//! - selector lists (`a, b`)

use super::{attributes, class_list, descendants, get_attribute, is_element, parent, tag_name};
use crate::error::{BindError, Result};
use crate::types::NodeId;

// =============================================================================
// Selector Model
// =============================================================================

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector: compounds left to right, with the combinator that
/// joins each compound to the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

// =============================================================================
// Parsing
// =============================================================================

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '@'
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = || BindError::InvalidSelector {
            selector: source.to_string(),
        };

        let mut alternatives = Vec::new();
        for part in source.split(',') {
            let complex = parse_complex(part.trim()).ok_or_else(invalid)?;
            alternatives.push(complex);
        }
        Ok(Self { alternatives })
    }

    /// Check if an element matches any alternative.
    pub fn matches(&self, node: NodeId) -> bool {
        is_element(node)
            && self
                .alternatives
                .iter()
                .any(|c| matches_at(c, c.compounds.len() - 1, node))
    }
}

fn parse_complex(src: &str) -> Option<Complex> {
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    loop {
        // Combinator between compounds
        if !compounds.is_empty() {
            let mut saw_space = false;
            while i < chars.len() && chars[i].is_whitespace() {
                saw_space = true;
                i += 1;
            }
            if i >= chars.len() {
                break;
            }
            if chars[i] == '>' {
                i += 1;
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                combinators.push(Combinator::Child);
            } else if saw_space {
                combinators.push(Combinator::Descendant);
            } else {
                return None;
            }
        }

        let (compound, next) = parse_compound(&chars, i)?;
        compounds.push(compound);
        i = next;
        if i >= chars.len() {
            break;
        }
    }

    if compounds.is_empty() || combinators.len() + 1 != compounds.len() {
        return None;
    }
    Some(Complex {
        compounds,
        combinators,
    })
}

fn take_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(chars: &[char], mut i: usize) -> Option<(Compound, usize)> {
    let mut compound = Compound::default();
    let start = i;

    if i < chars.len() && chars[i] == '*' {
        i += 1;
    } else if i < chars.len() && chars[i].is_alphabetic() {
        let (tag, next) = take_ident(chars, i);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                let (id, next) = take_ident(chars, i + 1);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
                i = next;
            }
            '.' => {
                let (class, next) = take_ident(chars, i + 1);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
                i = next;
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let attr = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim();
                        let value = value
                            .strip_prefix('"')
                            .and_then(|v| v.strip_suffix('"'))
                            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                            .unwrap_or(value);
                        (name.trim().to_ascii_lowercase(), Some(value.to_string()))
                    }
                    None => (inner.trim().to_ascii_lowercase(), None),
                };
                if attr.0.is_empty() {
                    return None;
                }
                compound.attrs.push(attr);
                i = close + 1;
            }
            _ => break,
        }
    }

    (i > start).then_some((compound, i))
}

// =============================================================================
// Matching
// =============================================================================

fn matches_compound(compound: &Compound, node: NodeId) -> bool {
    if !is_element(node) {
        return false;
    }
    if let Some(tag) = &compound.tag
        && tag_name(node) != *tag
    {
        return false;
    }
    if let Some(id) = &compound.id
        && get_attribute(node, "id").as_deref() != Some(id.as_str())
    {
        return false;
    }
    if !compound.classes.is_empty() {
        let classes = class_list(node);
        if !compound.classes.iter().all(|c| classes.contains(c)) {
            return false;
        }
    }
    let attrs = attributes(node);
    compound.attrs.iter().all(|(name, expected)| {
        attrs
            .iter()
            .find(|(n, _)| n == name)
            .is_some_and(|(_, v)| expected.as_ref().is_none_or(|e| e == v))
    })
}

fn matches_at(complex: &Complex, index: usize, node: NodeId) -> bool {
    if !matches_compound(&complex.compounds[index], node) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match complex.combinators[index - 1] {
        Combinator::Child => parent(node).is_some_and(|p| matches_at(complex, index - 1, p)),
        Combinator::Descendant => {
            let mut current = parent(node);
            while let Some(ancestor) = current {
                if matches_at(complex, index - 1, ancestor) {
                    return true;
                }
                current = parent(ancestor);
            }
            false
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// First element below `root` matching `selector`, in document order.
pub fn query_selector_from(root: NodeId, selector: &str) -> Result<Option<NodeId>> {
    let selector = Selector::parse(selector)?;
    Ok(descendants(root).into_iter().find(|&n| selector.matches(n)))
}

/// Every element below `root` matching `selector`, in document order.
pub fn query_selector_all_from(root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
    let selector = Selector::parse(selector)?;
    Ok(descendants(root)
        .into_iter()
        .filter(|&n| selector.matches(n))
        .collect())
}

/// First element in the document matching `selector`.
pub fn query_selector(selector: &str) -> Result<Option<NodeId>> {
    query_selector_from(super::document(), selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{body, reset_document, set_inner_html};

    fn setup() {
        reset_document();
        set_inner_html(
            body(),
            r#"<div id="app" class="shell main">
                 <form><input type="text" v-model="name"><input type="checkbox"></form>
                 <p class="note">a</p>
               </div>
               <p class="note">b</p>"#,
        );
    }

    #[test]
    fn test_id_class_tag() {
        setup();

        let app = query_selector("#app").unwrap().unwrap();
        assert_eq!(tag_name(app), "div");
        assert_eq!(query_selector("div.shell.main").unwrap(), Some(app));
        assert_eq!(query_selector(".missing").unwrap(), None);
        assert_eq!(query_selector("DIV").unwrap(), Some(app));
    }

    #[test]
    fn test_attribute_selectors() {
        setup();

        let bound = query_selector("[v-model]").unwrap().unwrap();
        assert_eq!(get_attribute(bound, "v-model").as_deref(), Some("name"));
        let checkbox = query_selector("input[type=\"checkbox\"]").unwrap().unwrap();
        assert_eq!(get_attribute(checkbox, "type").as_deref(), Some("checkbox"));
    }

    #[test]
    fn test_combinators() {
        setup();

        let notes = query_selector_all_from(body(), "p.note").unwrap();
        assert_eq!(notes.len(), 2);

        let inside = query_selector_all_from(body(), "#app p").unwrap();
        assert_eq!(inside, vec![notes[0]]);

        assert_eq!(query_selector_all_from(body(), "#app > input").unwrap().len(), 0);
        assert_eq!(query_selector_all_from(body(), "form > input").unwrap().len(), 2);
        assert_eq!(query_selector_all_from(body(), "#missing, p").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_selectors() {
        reset_document();

        for bad in ["", "#", ".", "div..x", "[", "[]", "a >", "a,"] {
            assert!(
                matches!(Selector::parse(bad), Err(BindError::InvalidSelector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
