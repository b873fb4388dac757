#![forbid(unsafe_code)]

//! Id-indexed arena over one branch's docs and blocks.
//!
//! Children are kept sorted by `(order, id)`. Walks use an explicit stack so deep
//! hierarchies never grow the call stack.

use crate::model::{Block, Doc};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Hierarchy<'a> {
    docs: BTreeMap<i64, &'a Doc>,
    roots: Vec<i64>,
    child_docs: BTreeMap<i64, Vec<i64>>,
    blocks: BTreeMap<i64, Vec<&'a Block>>,
    orphan_blocks: Vec<&'a Block>,
}

/// One step of a pre-order walk.
#[derive(Clone, Copy, Debug)]
pub struct WalkEntry<'a> {
    pub doc: &'a Doc,
    pub depth: usize,
}

impl<'a> Hierarchy<'a> {
    pub fn build(docs: &'a [Doc], blocks: &'a [Block]) -> Self {
        let by_id: BTreeMap<i64, &'a Doc> = docs.iter().map(|doc| (doc.id, doc)).collect();

        let mut roots = Vec::new();
        let mut child_docs: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for doc in docs {
            match doc.parent_id {
                Some(parent) if parent != doc.id && by_id.contains_key(&parent) => {
                    child_docs.entry(parent).or_default().push(doc.id)
                }
                // Dangling parents are rendered as roots rather than dropped.
                _ => roots.push(doc.id),
            }
        }

        let sort_docs = |ids: &mut Vec<i64>| {
            ids.sort_by_key(|id| (by_id.get(id).map(|d| d.order).unwrap_or_default(), *id));
        };
        sort_docs(&mut roots);
        for ids in child_docs.values_mut() {
            sort_docs(ids);
        }

        let mut by_doc: BTreeMap<i64, Vec<&'a Block>> = BTreeMap::new();
        let mut orphan_blocks = Vec::new();
        for block in blocks {
            if by_id.contains_key(&block.doc_id) {
                by_doc.entry(block.doc_id).or_default().push(block);
            } else {
                orphan_blocks.push(block);
            }
        }
        for list in by_doc.values_mut() {
            list.sort_by_key(|b| (b.order, b.id));
        }

        Self {
            docs: by_id,
            roots,
            child_docs,
            blocks: by_doc,
            orphan_blocks,
        }
    }

    pub fn doc(&self, id: i64) -> Option<&'a Doc> {
        self.docs.get(&id).copied()
    }

    pub fn roots(&self) -> impl Iterator<Item = &'a Doc> + '_ {
        self.roots.iter().filter_map(|id| self.doc(*id))
    }

    pub fn child_docs(&self, id: i64) -> impl Iterator<Item = &'a Doc> + '_ {
        self.child_docs
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.doc(*id))
    }

    pub fn blocks_of(&self, id: i64) -> &[&'a Block] {
        self.blocks.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: i64) -> bool {
        self.child_docs.get(&id).is_some_and(|c| !c.is_empty()) || !self.blocks_of(id).is_empty()
    }

    /// Blocks whose doc is not part of this branch.
    pub fn orphan_blocks(&self) -> &[&'a Block] {
        &self.orphan_blocks
    }

    /// Pre-order walk: every doc appears after its parent, siblings in `(order, id)`.
    ///
    /// A doc reachable twice (only possible with corrupt parent pointers) is emitted once.
    pub fn walk(&self) -> Vec<WalkEntry<'a>> {
        let mut out = Vec::with_capacity(self.docs.len());
        let mut seen = std::collections::BTreeSet::new();
        let mut stack: Vec<(i64, usize)> = self.roots.iter().rev().map(|id| (*id, 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(doc) = self.doc(id) else {
                continue;
            };
            out.push(WalkEntry { doc, depth });
            if let Some(children) = self.child_docs.get(&id) {
                stack.extend(children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
        out
    }

    pub fn max_child_doc_order(&self, parent: Option<i64>) -> Option<i64> {
        let ids = match parent {
            Some(parent) => self.child_docs.get(&parent).map(Vec::as_slice).unwrap_or(&[]),
            None => self.roots.as_slice(),
        };
        ids.iter().filter_map(|id| self.doc(*id)).map(|d| d.order).max()
    }
}

/// Hierarchy read back from a working tree, before any ids exist.
///
/// `parent` and `doc` index into `docs`; a parent always precedes its children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportedTree {
    pub docs: Vec<ImportedDoc>,
    pub blocks: Vec<ImportedBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedDoc {
    pub parent: Option<usize>,
    pub title: String,
    pub body: String,
    pub order: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedBlock {
    pub doc: usize,
    pub title: String,
    pub body: String,
    pub order: i64,
}
