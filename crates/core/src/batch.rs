#![forbid(unsafe_code)]

//! Batch input for the structure reconciliation engine and the placeholder
//! resolution that turns a list of creates into concrete ids.

use crate::model::NodeKind;
use std::collections::BTreeMap;

/// Upper bound on doc resolution passes.
pub const MAX_CREATE_PASSES: usize = 10;

#[derive(Clone, Debug, Default)]
pub struct BatchRequest {
    pub creates: Vec<CreateItem>,
    pub updates: Vec<UpdateItem>,
    pub deletes: Vec<NodeRef>,
    pub structure: Vec<StructureEntry>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    Root,
    Id(i64),
    Placeholder(String),
}

#[derive(Clone, Debug)]
pub struct CreateItem {
    pub kind: NodeKind,
    pub placeholder_id: Option<String>,
    /// For docs the parent doc; for blocks the owning doc (`Root` is unresolvable).
    pub parent: ParentRef,
    pub title: String,
    pub content: String,
    pub order: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct UpdateItem {
    pub target: NodeRef,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureEntry {
    pub kind: NodeKind,
    pub id: i64,
    /// Parent doc for docs (`None` = root), owning doc for blocks.
    pub parent_id: Option<i64>,
    pub order: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedItem {
    pub kind: NodeKind,
    pub placeholder_id: Option<String>,
    pub id: i64,
    pub parent_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// A block without any owning doc reference.
    MissingParent,
    /// The parent placeholder never resolved within the pass bound.
    PassLimit,
    /// The store refused the create.
    Failed(String),
}

impl UnresolvedReason {
    pub fn describe(&self) -> String {
        match self {
            Self::MissingParent => "missing_parent".to_string(),
            Self::PassLimit => "pass_limit".to_string(),
            Self::Failed(message) => format!("failed: {message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedCreate {
    pub kind: NodeKind,
    pub placeholder_id: Option<String>,
    pub title: String,
    pub reason: UnresolvedReason,
}

#[derive(Clone, Debug, Default)]
pub struct CreateResolution {
    pub created: Vec<CreatedItem>,
    pub unresolved: Vec<UnresolvedCreate>,
    pub passes: usize,
}

impl CreateResolution {
    pub fn id_for_placeholder(&self, placeholder: &str) -> Option<i64> {
        self.created
            .iter()
            .find(|c| c.placeholder_id.as_deref() == Some(placeholder))
            .map(|c| c.id)
    }
}

/// Resolve creates whose parents may be placeholders of other creates in the same batch.
///
/// Docs are resolved in passes: each pass attempts every pending doc whose parent is the
/// root, a real id, or an already resolved placeholder. The loop stops after
/// [`MAX_CREATE_PASSES`] or as soon as a pass resolves nothing. Blocks run once afterwards
/// because every block needs a concrete doc id. `create` receives the item and its
/// concrete parent id and returns the allocated id.
pub fn resolve_creates<E: std::fmt::Display>(
    items: &[CreateItem],
    mut create: impl FnMut(&CreateItem, Option<i64>) -> Result<i64, E>,
) -> CreateResolution {
    let mut resolution = CreateResolution::default();
    let mut placeholders: BTreeMap<String, i64> = BTreeMap::new();

    let mut pending: Vec<&CreateItem> = items.iter().filter(|i| i.kind == NodeKind::Doc).collect();
    while !pending.is_empty() && resolution.passes < MAX_CREATE_PASSES {
        resolution.passes += 1;
        let mut progressed = false;
        let mut still_pending = Vec::with_capacity(pending.len());

        for item in pending {
            let parent_id = match &item.parent {
                ParentRef::Root => None,
                ParentRef::Id(id) => Some(*id),
                ParentRef::Placeholder(token) => match placeholders.get(token) {
                    Some(id) => Some(*id),
                    None => {
                        still_pending.push(item);
                        continue;
                    }
                },
            };

            progressed = true;
            match create(item, parent_id) {
                Ok(id) => {
                    if let Some(token) = &item.placeholder_id {
                        placeholders.insert(token.clone(), id);
                    }
                    resolution.created.push(CreatedItem {
                        kind: NodeKind::Doc,
                        placeholder_id: item.placeholder_id.clone(),
                        id,
                        parent_id,
                    });
                }
                Err(err) => resolution.unresolved.push(unresolved(
                    item,
                    UnresolvedReason::Failed(err.to_string()),
                )),
            }
        }

        pending = still_pending;
        if !progressed {
            break;
        }
    }
    for item in pending {
        resolution
            .unresolved
            .push(unresolved(item, UnresolvedReason::PassLimit));
    }

    for item in items.iter().filter(|i| i.kind == NodeKind::Block) {
        let doc_id = match &item.parent {
            ParentRef::Root => {
                resolution
                    .unresolved
                    .push(unresolved(item, UnresolvedReason::MissingParent));
                continue;
            }
            ParentRef::Id(id) => *id,
            ParentRef::Placeholder(token) => match placeholders.get(token) {
                Some(id) => *id,
                None => {
                    resolution
                        .unresolved
                        .push(unresolved(item, UnresolvedReason::PassLimit));
                    continue;
                }
            },
        };
        match create(item, Some(doc_id)) {
            Ok(id) => resolution.created.push(CreatedItem {
                kind: NodeKind::Block,
                placeholder_id: item.placeholder_id.clone(),
                id,
                parent_id: Some(doc_id),
            }),
            Err(err) => resolution.unresolved.push(unresolved(
                item,
                UnresolvedReason::Failed(err.to_string()),
            )),
        }
    }

    resolution
}

fn unresolved(item: &CreateItem, reason: UnresolvedReason) -> UnresolvedCreate {
    UnresolvedCreate {
        kind: item.kind,
        placeholder_id: item.placeholder_id.clone(),
        title: item.title.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_item(placeholder: &str, parent: ParentRef) -> CreateItem {
        CreateItem {
            kind: NodeKind::Doc,
            placeholder_id: Some(placeholder.to_string()),
            parent,
            title: placeholder.to_string(),
            content: String::new(),
            order: None,
        }
    }

    fn block_item(parent: ParentRef) -> CreateItem {
        CreateItem {
            kind: NodeKind::Block,
            placeholder_id: None,
            parent,
            title: "leaf".to_string(),
            content: "body".to_string(),
            order: None,
        }
    }

    fn allocator() -> impl FnMut(&CreateItem, Option<i64>) -> Result<i64, String> {
        let mut next = 100;
        move |_, _| {
            next += 1;
            Ok(next)
        }
    }

    #[test]
    fn reversed_placeholders_resolve() {
        let items = vec![
            doc_item("p2", ParentRef::Placeholder("p1".to_string())),
            doc_item("p1", ParentRef::Root),
        ];
        let resolution = resolve_creates(&items, allocator());

        assert!(resolution.unresolved.is_empty());
        let p1 = resolution.id_for_placeholder("p1").expect("p1 resolved");
        let p2 = resolution
            .created
            .iter()
            .find(|c| c.placeholder_id.as_deref() == Some("p2"))
            .expect("p2 resolved");
        assert_eq!(p2.parent_id, Some(p1));
        assert_eq!(resolution.passes, 2);
    }

    #[test]
    fn blocks_attach_to_placeholder_docs() {
        let items = vec![
            block_item(ParentRef::Placeholder("folder".to_string())),
            doc_item("folder", ParentRef::Id(7)),
        ];
        let resolution = resolve_creates(&items, allocator());
        let folder = resolution.id_for_placeholder("folder").expect("folder");
        let block = resolution
            .created
            .iter()
            .find(|c| c.kind == NodeKind::Block)
            .expect("block created");
        assert_eq!(block.parent_id, Some(folder));
        let doc = resolution
            .created
            .iter()
            .find(|c| c.kind == NodeKind::Doc)
            .expect("doc created");
        assert_eq!(doc.parent_id, Some(7));
    }

    #[test]
    fn unknown_placeholders_are_reported() {
        let items = vec![
            doc_item("orphan", ParentRef::Placeholder("nobody".to_string())),
            block_item(ParentRef::Root),
            block_item(ParentRef::Placeholder("orphan".to_string())),
        ];
        let resolution = resolve_creates(&items, allocator());

        assert!(resolution.created.is_empty());
        assert_eq!(resolution.passes, 1);
        let reasons = resolution
            .unresolved
            .iter()
            .map(|u| u.reason.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            reasons,
            vec![
                UnresolvedReason::PassLimit,
                UnresolvedReason::MissingParent,
                UnresolvedReason::PassLimit,
            ]
        );
    }

    #[test]
    fn store_failures_are_reported_and_do_not_stop_the_batch() {
        let items = vec![
            doc_item("bad", ParentRef::Id(404)),
            doc_item("good", ParentRef::Root),
        ];
        let resolution = resolve_creates(&items, |_, parent: Option<i64>| match parent {
            Some(404) => Err("unknown parent doc".to_string()),
            _ => Ok(1),
        });
        assert_eq!(resolution.created.len(), 1);
        assert_eq!(
            resolution.unresolved[0].reason,
            UnresolvedReason::Failed("unknown parent doc".to_string())
        );
        assert_eq!(resolution.unresolved[0].reason.describe(), "failed: unknown parent doc");
    }

    #[test]
    fn chain_longer_than_the_pass_bound_is_cut_off() {
        // Reverse order forces one resolution per pass.
        let mut items = vec![doc_item("p0", ParentRef::Root)];
        for i in 1..15 {
            items.push(doc_item(
                &format!("p{i}"),
                ParentRef::Placeholder(format!("p{}", i - 1)),
            ));
        }
        items.reverse();
        let resolution = resolve_creates(&items, allocator());

        assert_eq!(resolution.passes, MAX_CREATE_PASSES);
        assert_eq!(resolution.created.len(), MAX_CREATE_PASSES);
        assert_eq!(resolution.unresolved.len(), 15 - MAX_CREATE_PASSES);
        assert!(
            resolution
                .unresolved
                .iter()
                .all(|u| u.reason == UnresolvedReason::PassLimit)
        );
    }
}
