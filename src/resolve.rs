//! Alias and merge resolution.
//!
//! Two passes over the flat list, run in order. The alias pass clears
//! every `*name` reference except those on merge keys: scalar anchors
//! are copied into the referencing element, container anchors have their
//! subtree spliced in as re-indented copies. The merge pass then expands
//! every `<<: *name` entry into its surrounding mapping, local keys
//! taking precedence. Both passes rescan from the top until nothing is
//! left to resolve; each round either resolves one reference or fails.

use crate::error::{ParseError, Result};
use crate::flat::{matching_close, FlatElement, Node};

/// The merge key literal.
const MERGE_KEY: &str = "<<";

/// Resolve every non-merge alias reference in the list.
pub fn resolve_aliases(elements: &mut Vec<FlatElement>) -> Result<()> {
    loop {
        let Some(idx) = elements
            .iter()
            .position(|e| e.alias.is_some() && e.key.as_deref() != Some(MERGE_KEY))
        else {
            return Ok(());
        };
        let name = elements[idx].alias.clone().unwrap_or_default();
        let line = elements[idx].line;
        let target = find_anchor(elements, idx, &name, line)?;

        match elements[target].node.clone() {
            Node::Scalar { text, literal } => {
                let tag = elements[target].tag;
                let e = &mut elements[idx];
                e.node = Node::Scalar { text, literal };
                e.tag = tag;
                e.alias = None;
            }
            Node::Open(marker) => {
                let end = matching_close(elements, target);
                let target_tag = elements[target].tag;
                let here_indent = elements[idx].indent;
                let delta = here_indent as isize - elements[target].indent as isize;
                let mut copies = Vec::with_capacity(end - target);
                for e in &elements[target + 1..end] {
                    if e.alias.as_deref() == Some(name.as_str()) {
                        return Err(ParseError::RecursiveAlias(name, e.line));
                    }
                    let mut c = e.clone();
                    c.indent = (c.indent as isize + delta) as usize;
                    c.anchor = None;
                    copies.push(c);
                }
                copies.push(FlatElement {
                    key: None,
                    node: Node::Close(marker),
                    indent: here_indent,
                    line,
                    tag: None,
                    anchor: None,
                    alias: None,
                });
                let here = &mut elements[idx];
                here.node = Node::Open(marker);
                here.tag = target_tag;
                here.alias = None;
                elements.splice(idx + 1..idx + 1, copies);
            }
            Node::Close(_) => return Err(ParseError::AnchorNotFound(name, line)),
        }
    }
}

/// Expand every merge entry into its surrounding mapping.
pub fn resolve_merges(elements: &mut Vec<FlatElement>) -> Result<()> {
    loop {
        let Some(idx) = elements
            .iter()
            .position(|e| e.alias.is_some() && e.key.as_deref() == Some(MERGE_KEY))
        else {
            return Ok(());
        };
        let name = elements[idx].alias.clone().unwrap_or_default();
        let line = elements[idx].line;
        let entry_indent = elements[idx].indent;

        // The merge parent is the nearest preceding element opened one
        // level up: the surrounding mapping's opener.
        let parent = elements[..idx]
            .iter()
            .rposition(|e| e.indent < entry_indent)
            .ok_or(ParseError::MergeInCollection(line))?;
        if !matches!(elements[parent].node, Node::Open(crate::flat::Marker::Map)) {
            return Err(ParseError::MergeInCollection(line));
        }

        let target = find_anchor(elements, idx, &name, line)?;
        let t_end = match elements[target].node {
            Node::Open(crate::flat::Marker::Map) => matching_close(elements, target),
            _ => return Err(ParseError::MergeOnScalar(line)),
        };

        // Copy the anchor's entries, re-indented to the mapping's level.
        let delta = entry_indent as isize - (elements[target].indent as isize + 1);
        let mut anchor_entries: Vec<FlatElement> = Vec::with_capacity(t_end - target);
        for e in &elements[target + 1..t_end] {
            if e.alias.as_deref() == Some(name.as_str()) {
                return Err(ParseError::RecursiveAlias(name, e.line));
            }
            let mut c = e.clone();
            c.indent = (c.indent as isize + delta) as usize;
            c.anchor = None;
            anchor_entries.push(c);
        }

        // Lift out the mapping's current entries, dropping the merge
        // entry itself.
        let parent_close = matching_close(elements, parent);
        let mut local_entries: Vec<FlatElement> =
            elements.drain(parent + 1..parent_close).collect();
        local_entries.retain(|e| {
            !(e.indent == entry_indent
                && e.key.as_deref() == Some(MERGE_KEY)
                && e.alias.as_deref() == Some(name.as_str()))
        });

        let merged = interleave(
            split_entries(anchor_entries),
            split_entries(local_entries),
            entry_indent,
        );
        elements.splice(parent + 1..parent + 1, merged);
    }
}

/// Walk the anchor's entries in order, substituting local entries for
/// shared keys (local wins, containers wholesale), flushing local-only
/// entries around them in local order.
fn interleave(
    anchor_groups: Vec<Vec<FlatElement>>,
    local_groups: Vec<Vec<FlatElement>>,
    entry_indent: usize,
) -> Vec<FlatElement> {
    let anchor_keys: Vec<Option<String>> = anchor_groups
        .iter()
        .map(|g| g.first().and_then(|e| e.key.clone()))
        .collect();
    let mut locals: Vec<Option<Vec<FlatElement>>> = local_groups.into_iter().map(Some).collect();
    let mut out: Vec<FlatElement> = Vec::new();

    // Flush local-only entries (keys the anchor does not define) from the
    // front of the pending locals, preserving their order.
    fn flush_unshared(
        locals: &mut [Option<Vec<FlatElement>>],
        anchor_keys: &[Option<String>],
        out: &mut Vec<FlatElement>,
    ) {
        for slot in locals.iter_mut() {
            let Some(group) = slot.as_ref() else { continue };
            let key = group.first().and_then(|e| e.key.clone());
            if key.is_some() && anchor_keys.contains(&key) {
                break;
            }
            if let Some(group) = slot.take() {
                out.extend(group);
            }
        }
    }

    for group in anchor_groups {
        let key = group.first().and_then(|e| e.key.clone());
        let local_idx = key.as_ref().and_then(|_| {
            locals.iter().position(|slot| {
                slot.as_ref()
                    .map(|g| g.first().and_then(|e| e.key.clone()) == key)
                    .unwrap_or(false)
            })
        });
        match local_idx {
            Some(i) => out.extend(locals[i].take().unwrap_or_default()),
            None => out.extend(group),
        }
        flush_unshared(&mut locals, &anchor_keys, &mut out);
    }

    for slot in locals.into_iter().flatten() {
        out.extend(slot);
    }

    debug_assert!(out.iter().all(|e| e.indent >= entry_indent));
    out
}

/// Split a run of sibling entries into groups, each a top-level entry
/// followed by its subtree.
fn split_entries(elements: Vec<FlatElement>) -> Vec<Vec<FlatElement>> {
    let mut groups: Vec<Vec<FlatElement>> = Vec::new();
    let mut depth = 0usize;
    for e in elements {
        let starts_group = depth == 0;
        match e.node {
            Node::Open(_) => depth += 1,
            Node::Close(_) => depth = depth.saturating_sub(1),
            Node::Scalar { .. } => {}
        }
        if starts_group {
            groups.push(vec![e]);
        } else if let Some(last) = groups.last_mut() {
            last.push(e);
        }
    }
    groups
}

/// Locate the anchor definition for `name`, which must precede `before`
/// in document order; forward references do not resolve.
fn find_anchor(
    elements: &[FlatElement],
    before: usize,
    name: &str,
    line: usize,
) -> Result<usize> {
    elements[..before]
        .iter()
        .rposition(|e| e.anchor.as_deref() == Some(name))
        .ok_or_else(|| ParseError::AnchorNotFound(name.to_string(), line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::source::Source;
    use crate::Options;

    fn resolved(input: &str) -> Vec<FlatElement> {
        let src = Source::new(input);
        let mut elems = parser::parse(&src, &Options::default()).unwrap();
        resolve_aliases(&mut elems).unwrap();
        resolve_merges(&mut elems).unwrap();
        elems
    }

    fn resolve_err(input: &str) -> ParseError {
        let src = Source::new(input);
        let mut elems = parser::parse(&src, &Options::default()).unwrap();
        resolve_aliases(&mut elems)
            .and_then(|_| resolve_merges(&mut elems))
            .unwrap_err()
    }

    #[test]
    fn test_scalar_alias_copies_value() {
        let elems = resolved("base: &x 42\nother: *x");
        let other = elems
            .iter()
            .find(|e| e.key.as_deref() == Some("other"))
            .unwrap();
        assert_eq!(other.scalar_text(), Some("42"));
        assert!(other.alias.is_none());
    }

    #[test]
    fn test_subtree_alias_splices_copies() {
        let elems = resolved("base: &x\n  a: 1\n  b: 2\nother: *x");
        let other_pos = elems
            .iter()
            .position(|e| e.key.as_deref() == Some("other"))
            .unwrap();
        assert!(elems[other_pos].is_open());
        assert_eq!(elems[other_pos + 1].key.as_deref(), Some("a"));
        assert_eq!(elems[other_pos + 2].key.as_deref(), Some("b"));
        assert!(elems[other_pos + 3].is_close());
        // The copies sit at the alias's depth, not the anchor's.
        assert_eq!(elems[other_pos + 1].indent, elems[other_pos].indent + 1);
    }

    #[test]
    fn test_no_alias_left_after_resolution() {
        let elems = resolved("a: &x 1\nb: *x\nd: &m\n  k: 2\nc:\n  <<: *m\n  j: 3");
        assert!(elems.iter().all(|e| e.alias.is_none()));
    }

    #[test]
    fn test_merge_with_local_override() {
        let elems = resolved("defaults: &d\n  a: 1\n  b: 2\nitem:\n  <<: *d\n  b: 99");
        let item_pos = elems
            .iter()
            .position(|e| e.key.as_deref() == Some("item"))
            .unwrap();
        assert_eq!(elems[item_pos + 1].key.as_deref(), Some("a"));
        assert_eq!(elems[item_pos + 1].scalar_text(), Some("1"));
        assert_eq!(elems[item_pos + 2].key.as_deref(), Some("b"));
        assert_eq!(elems[item_pos + 2].scalar_text(), Some("99"));
        assert!(elems[item_pos + 3].is_close());
    }

    #[test]
    fn test_merge_local_only_keys_kept() {
        let elems = resolved("defaults: &d\n  a: 1\nitem:\n  <<: *d\n  z: 9");
        let keys: Vec<_> = elems.iter().filter_map(|e| e.key.as_deref()).collect();
        assert!(keys.contains(&"a"));
        assert!(keys.contains(&"z"));
        assert!(!keys.contains(&"<<"));
    }

    #[test]
    fn test_merge_local_container_replaces_wholesale() {
        let elems = resolved(
            "defaults: &d\n  opts:\n    x: 1\n    y: 2\nitem:\n  <<: *d\n  opts:\n    z: 3",
        );
        let item_pos = elems
            .iter()
            .position(|e| e.key.as_deref() == Some("item"))
            .unwrap();
        let after: Vec<_> = elems[item_pos..]
            .iter()
            .filter_map(|e| e.key.as_deref())
            .collect();
        assert!(after.contains(&"z"));
        assert!(!after.contains(&"x"));
    }

    #[test]
    fn test_anchor_not_found() {
        assert!(matches!(
            resolve_err("a: *missing"),
            ParseError::AnchorNotFound(_, 1)
        ));
    }

    #[test]
    fn test_forward_reference_is_error() {
        assert!(matches!(
            resolve_err("a: *later\nb: &later 1"),
            ParseError::AnchorNotFound(_, 1)
        ));
    }

    #[test]
    fn test_recursive_alias() {
        assert!(matches!(
            resolve_err("a: &x\n  inner: *x"),
            ParseError::RecursiveAlias(_, _)
        ));
    }

    #[test]
    fn test_merge_on_scalar_anchor() {
        assert!(matches!(
            resolve_err("v: &s 1\nm:\n  <<: *s"),
            ParseError::MergeOnScalar(3)
        ));
    }
}
