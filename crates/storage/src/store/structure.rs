#![forbid(unsafe_code)]

use super::*;
use dm_core::batch::StructureEntry;
use dm_core::structure::{BlockSlot, DocSlot, StructurePlan, plan_structure};

impl SqliteStore {
    /// Re-parent and re-order nodes of one branch and rewrite every doc path, in one
    /// transaction. Rejected entries are returned in the plan and leave their node untouched.
    pub fn structure_apply(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        entries: &[StructureEntry],
    ) -> Result<StructurePlan, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;

        let docs: Vec<DocSlot> = docs_list_tx(&tx, repo, branch)?
            .into_iter()
            .map(|d| DocSlot {
                id: d.id,
                parent_id: d.parent_id,
                order: d.order,
            })
            .collect();
        let blocks: Vec<BlockSlot> = blocks_list_tx(&tx, repo, branch)?
            .into_iter()
            .map(|b| BlockSlot {
                id: b.id,
                doc_id: b.doc_id,
                order: b.order,
            })
            .collect();

        let plan = plan_structure(&docs, &blocks, entries);

        // Paths always end in the doc's own id, so rewriting row by row in depth order never
        // trips the unique path index.
        {
            let mut update_doc = tx.prepare(
                "UPDATE docs SET parent_id=?4, sort_order=?5, path=?6, updated_at_ms=?7 WHERE repo_id=?1 AND branch=?2 AND id=?3",
            )?;
            for doc in &plan.docs {
                update_doc.execute(params![
                    repo.get(),
                    branch.as_str(),
                    doc.id,
                    doc.parent_id,
                    doc.order,
                    doc.path,
                    now_ms
                ])?;
            }
            let mut update_block = tx.prepare(
                "UPDATE blocks SET doc_id=?4, sort_order=?5, updated_at_ms=?6 WHERE repo_id=?1 AND branch=?2 AND id=?3",
            )?;
            for block in &plan.blocks {
                update_block.execute(params![
                    repo.get(),
                    branch.as_str(),
                    block.id,
                    block.doc_id,
                    block.order,
                    now_ms
                ])?;
            }
        }
        tx.commit()?;

        if !plan.rejected.is_empty() {
            tracing::debug!(repo = %repo, branch = %branch, rejected = plan.rejected.len(), "structure entries rejected");
        }
        Ok(plan)
    }
}
