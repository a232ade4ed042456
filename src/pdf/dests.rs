//! Named destinations carried across a merge.
//!
//! Internal links point at destinations by name, through either the
//! catalog's `/Dests` dictionary or the `/Names /Dests` name tree. Both are
//! collected from every source and written into the merged catalog. When a
//! later source reuses a name already taken, its copy is renamed with a
//! `-N` suffix (N = 1-based source position) and that source's links are
//! rewritten to the new name.

use super::document::{resolve, MAX_TREE_DEPTH};
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Destinations accumulated over the sources of one merge.
#[derive(Debug, Default)]
pub(crate) struct NamedDestinations {
    entries: BTreeMap<Vec<u8>, Object>,
}

impl NamedDestinations {
    /// Take over the destinations of `doc`, source number `index` (0-based).
    ///
    /// Must run after `doc` has been renumbered into the merged id range and
    /// before its page dictionaries are copied out.
    pub fn absorb(&mut self, doc: &mut Document, index: usize) {
        let mut renames = HashMap::new();
        for (name, dest) in source_destinations(doc) {
            let merged_name = if self.entries.contains_key(&name) {
                let renamed = self.unused_name(&name, index);
                debug!(
                    "Destination {:?} of source {} renamed to {:?}",
                    String::from_utf8_lossy(&name),
                    index + 1,
                    String::from_utf8_lossy(&renamed)
                );
                renames.insert(name, renamed.clone());
                renamed
            } else {
                name
            };
            self.entries.insert(merged_name, dest);
        }
        if !renames.is_empty() {
            for object in doc.objects.values_mut() {
                if let Object::Dictionary(dict) = object {
                    rewrite_links(dict, &renames);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write `/Dests` and `/Names /Dests` into `catalog`. No-op when empty.
    pub fn write_into(self, catalog: &mut Dictionary) {
        if self.entries.is_empty() {
            return;
        }
        let mut dests = Dictionary::new();
        let mut pairs = Vec::with_capacity(self.entries.len() * 2);
        for (name, dest) in self.entries {
            dests.set(name.clone(), dest.clone());
            pairs.push(Object::String(name, StringFormat::Literal));
            pairs.push(dest);
        }
        catalog.set("Dests", Object::Dictionary(dests));
        catalog.set(
            "Names",
            Object::Dictionary(Dictionary::from_iter([(
                "Dests",
                Object::Dictionary(Dictionary::from_iter([("Names", Object::Array(pairs))])),
            )])),
        );
    }

    fn unused_name(&self, name: &[u8], index: usize) -> Vec<u8> {
        let mut n = index + 1;
        loop {
            let mut candidate = name.to_vec();
            candidate.extend_from_slice(format!("-{n}").as_bytes());
            if !self.entries.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// The document catalog, if the trailer points at one.
pub(crate) fn catalog(doc: &Document) -> Option<&Dictionary> {
    let id = doc.trailer.get(b"Root").ok()?.as_reference().ok()?;
    doc.get_dictionary(id).ok()
}

/// Every named destination of `doc`. The `/Dests` dictionary wins over the
/// name tree when both define a name.
fn source_destinations(doc: &Document) -> BTreeMap<Vec<u8>, Object> {
    let mut found = BTreeMap::new();
    let Some(catalog) = catalog(doc) else {
        return found;
    };

    if let Some(dests) = catalog
        .get(b"Dests")
        .ok()
        .and_then(|d| resolve(doc, d).as_dict().ok())
    {
        for (name, dest) in dests.iter() {
            found.entry(name.clone()).or_insert_with(|| dest.clone());
        }
    }

    let tree = catalog
        .get(b"Names")
        .ok()
        .and_then(|n| resolve(doc, n).as_dict().ok())
        .and_then(|names| names.get(b"Dests").ok())
        .and_then(|d| resolve(doc, d).as_dict().ok());
    if let Some(tree) = tree {
        collect_name_tree(doc, tree, 0, &mut found);
    }
    found
}

fn collect_name_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    found: &mut BTreeMap<Vec<u8>, Object>,
) {
    if depth >= MAX_TREE_DEPTH {
        return;
    }
    if let Ok(Object::Array(pairs)) = node.get(b"Names").map(|n| resolve(doc, n)) {
        for pair in pairs.chunks(2) {
            if let [Object::String(name, _), dest] = pair {
                found.entry(name.clone()).or_insert_with(|| dest.clone());
            }
        }
    }
    if let Ok(Object::Array(kids)) = node.get(b"Kids").map(|k| resolve(doc, k)) {
        for kid in kids {
            if let Ok(kid) = resolve(doc, kid).as_dict() {
                collect_name_tree(doc, kid, depth + 1, found);
            }
        }
    }
}

/// Rename `/Dest` targets and `GoTo` action targets in `dict`, including
/// inline actions and annotations.
fn rewrite_links(dict: &mut Dictionary, renames: &HashMap<Vec<u8>, Vec<u8>>) {
    if let Ok(dest) = dict.get_mut(b"Dest") {
        rename(dest, renames);
    }
    let is_goto = dict
        .get(b"S")
        .and_then(|s| s.as_name())
        .is_ok_and(|s| s == b"GoTo");
    if is_goto {
        if let Ok(dest) = dict.get_mut(b"D") {
            rename(dest, renames);
        }
    }
    if let Ok(Object::Dictionary(action)) = dict.get_mut(b"A") {
        rewrite_links(action, renames);
    }
    if let Ok(Object::Array(annots)) = dict.get_mut(b"Annots") {
        for annot in annots {
            if let Object::Dictionary(annot) = annot {
                rewrite_links(annot, renames);
            }
        }
    }
}

fn rename(target: &mut Object, renames: &HashMap<Vec<u8>, Vec<u8>>) {
    match target {
        Object::Name(name) | Object::String(name, _) => {
            if let Some(new) = renames.get(name.as_slice()) {
                *name = new.clone();
            }
        }
        _ => {}
    }
}
