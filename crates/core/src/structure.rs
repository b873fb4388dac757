#![forbid(unsafe_code)]

//! Planning of a full structure apply: parent pointers, order numbers and
//! materialized paths for every doc in a branch, plus block placement.

use crate::batch::StructureEntry;
use crate::model::{NodeKind, child_path, root_path};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocSlot {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub order: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSlot {
    pub id: i64,
    pub doc_id: i64,
    pub order: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocPlacement {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub order: i64,
    pub depth: usize,
    pub path: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    UnknownId,
    UnknownParent,
    Cycle,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownId => "unknown_id",
            Self::UnknownParent => "unknown_parent",
            Self::Cycle => "cycle",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedEntry {
    pub kind: NodeKind,
    pub id: i64,
    pub reason: RejectReason,
}

#[derive(Clone, Debug, Default)]
pub struct StructurePlan {
    /// Every doc of the branch, sorted by `(depth, order, id)`.
    pub docs: Vec<DocPlacement>,
    pub blocks: Vec<BlockSlot>,
    pub rejected: Vec<RejectedEntry>,
}

/// Overlay `entries` on the current layout and recompute every doc path.
///
/// Entries are applied in input order. An entry that names an unknown node, points at an
/// unknown parent, or would make a doc its own ancestor is rejected and the node keeps its
/// current placement. Docs that are not listed keep their parent and order but still get
/// their path recomputed, so moving a doc repaths its whole subtree.
pub fn plan_structure(
    docs: &[DocSlot],
    blocks: &[BlockSlot],
    entries: &[StructureEntry],
) -> StructurePlan {
    let mut layout: BTreeMap<i64, (Option<i64>, i64)> = docs
        .iter()
        .map(|d| (d.id, (d.parent_id.filter(|p| *p != d.id), d.order)))
        .collect();
    let mut block_layout: BTreeMap<i64, (i64, i64)> =
        blocks.iter().map(|b| (b.id, (b.doc_id, b.order))).collect();
    let mut rejected = Vec::new();
    let mut touched_blocks = BTreeSet::new();

    for entry in entries {
        let reject = |reason| RejectedEntry {
            kind: entry.kind,
            id: entry.id,
            reason,
        };
        match entry.kind {
            NodeKind::Doc => {
                if !layout.contains_key(&entry.id) {
                    rejected.push(reject(RejectReason::UnknownId));
                    continue;
                }
                if let Some(parent) = entry.parent_id {
                    if !layout.contains_key(&parent) {
                        rejected.push(reject(RejectReason::UnknownParent));
                        continue;
                    }
                    if is_ancestor_or_self(&layout, entry.id, parent) {
                        rejected.push(reject(RejectReason::Cycle));
                        continue;
                    }
                }
                layout.insert(entry.id, (entry.parent_id, entry.order));
            }
            NodeKind::Block => {
                if !block_layout.contains_key(&entry.id) {
                    rejected.push(reject(RejectReason::UnknownId));
                    continue;
                }
                let Some(doc_id) = entry.parent_id.filter(|p| layout.contains_key(p)) else {
                    rejected.push(reject(RejectReason::UnknownParent));
                    continue;
                };
                block_layout.insert(entry.id, (doc_id, entry.order));
                touched_blocks.insert(entry.id);
            }
        }
    }

    let docs = place_docs(&layout);
    let blocks = block_layout
        .into_iter()
        .filter(|(id, _)| touched_blocks.contains(id))
        .map(|(id, (doc_id, order))| BlockSlot { id, doc_id, order })
        .collect();

    StructurePlan {
        docs,
        blocks,
        rejected,
    }
}

/// Whether `node` is `candidate` itself or one of its ancestors.
fn is_ancestor_or_self(
    layout: &BTreeMap<i64, (Option<i64>, i64)>,
    node: i64,
    candidate: i64,
) -> bool {
    let mut cursor = Some(candidate);
    let mut steps = 0usize;
    while let Some(id) = cursor {
        if id == node {
            return true;
        }
        steps += 1;
        if steps > layout.len() {
            return true;
        }
        cursor = layout.get(&id).and_then(|(parent, _)| *parent);
    }
    false
}

fn place_docs(layout: &BTreeMap<i64, (Option<i64>, i64)>) -> Vec<DocPlacement> {
    let mut children: BTreeMap<Option<i64>, Vec<i64>> = BTreeMap::new();
    for (id, (parent, _)) in layout {
        let parent = parent.filter(|p| layout.contains_key(p));
        children.entry(parent).or_default().push(*id);
    }

    let mut placed = Vec::with_capacity(layout.len());
    let mut queue: VecDeque<(i64, usize, String)> = children
        .get(&None)
        .into_iter()
        .flatten()
        .map(|id| (*id, 0, root_path(*id)))
        .collect();

    while let Some((id, depth, path)) = queue.pop_front() {
        let (parent_id, order) = layout.get(&id).copied().unwrap_or((None, 0));
        if let Some(kids) = children.get(&Some(id)) {
            for kid in kids {
                queue.push_back((*kid, depth + 1, child_path(&path, *kid)));
            }
        }
        placed.push(DocPlacement {
            id,
            parent_id: parent_id.filter(|p| layout.contains_key(p)),
            order,
            depth,
            path,
        });
    }

    placed.sort_by_key(|p| (p.depth, p.order, p.id));
    placed
}
