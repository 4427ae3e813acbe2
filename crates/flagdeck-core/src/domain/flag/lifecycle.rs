//! Revision lifecycle and environment toggle state machine
//!
//! Pure in-memory transformations over the `Flag` aggregate. Each
//! operation is synchronous and does no I/O; the caller loads the
//! aggregate, applies one transition, and persists the result.
//!
//! Allowed transitions per revision: draft -> live (approve target),
//! live -> archived (approve displacement), live -> draft (rollback),
//! archived -> live (rollback restore). Anything else is rejected.

use tracing::warn;
use uuid::Uuid;

use super::flag::Flag;
use super::revision::{Revision, RevisionStatus};
use crate::error::{Error, Result};

impl Flag {
    /// Draft a new revision at the end of the timeline
    ///
    /// Never fails: rules are opaque and not validated here. No other
    /// revision's status changes.
    pub fn create_draft(
        &mut self,
        default_value: String,
        rules: Vec<super::flag::Rule>,
        created_by: Uuid,
    ) -> Revision {
        let revision = Revision::new(default_value, rules, created_by);
        self.revisions.push(revision.clone());
        self.touch();
        revision
    }

    /// Promote a draft revision to live
    ///
    /// The previously live revision (if any) is archived and recorded as
    /// the new revision's backlink; the version counter increments.
    pub fn approve(&mut self, revision_id: Uuid) -> Result<Revision> {
        let target = self
            .revisions
            .iter()
            .position(|r| r.id == revision_id)
            .ok_or_else(|| Error::RevisionNotFound(revision_id.to_string()))?;

        let status = self.revisions[target].status;
        if status != RevisionStatus::Draft {
            return Err(Error::InvalidStateTransition(format!(
                "revision {} is {}, only a draft can be approved",
                revision_id, status
            )));
        }

        // Archive whatever is live. The invariant allows at most one;
        // if more slipped in, archive them all and keep the last
        // encountered as the backlink target.
        let mut previous_live_id = None;
        let mut live_count = 0u32;
        for revision in &mut self.revisions {
            if revision.status == RevisionStatus::Live {
                live_count += 1;
                previous_live_id = Some(revision.id);
                revision.status = RevisionStatus::Archived;
            }
        }
        if live_count > 1 {
            warn!(
                flag_id = %self.id,
                live_count,
                "invariant violation: multiple live revisions found, archived all"
            );
        }

        let revision = &mut self.revisions[target];
        revision.status = RevisionStatus::Live;
        revision.last_revision_id = previous_live_id;
        let approved = revision.clone();

        self.version += 1;
        self.touch();
        Ok(approved)
    }

    /// Undo the most recent approval
    ///
    /// The live revision returns to draft and its backlink is consumed.
    /// If the backlink named a predecessor, that revision becomes live
    /// again and is returned; with no backlink the flag is left with zero
    /// live revisions and `None` is returned. The version counter
    /// decrements either way, and is deliberately not floor-clamped.
    pub fn rollback(&mut self) -> Result<Option<Revision>> {
        let live = self
            .revisions
            .iter()
            .position(|r| r.status == RevisionStatus::Live)
            .ok_or_else(|| Error::NoActiveRevision(self.name.clone()))?;

        match self.revisions[live].last_revision_id {
            None => {
                self.revisions[live].status = RevisionStatus::Draft;
                self.version -= 1;
                self.touch();
                Ok(None)
            }
            Some(target_id) => {
                // Validate the chain before mutating anything so a corrupt
                // backlink leaves the aggregate untouched.
                let target = self
                    .revisions
                    .iter()
                    .position(|r| r.id == target_id)
                    .ok_or_else(|| {
                        Error::InvalidStateTransition(format!(
                            "rollback target {} does not exist, revision chain is corrupt",
                            target_id
                        ))
                    })?;
                let target_status = self.revisions[target].status;
                if target_status != RevisionStatus::Archived {
                    return Err(Error::InvalidStateTransition(format!(
                        "rollback target {} is {}, expected archived; revision chain is corrupt",
                        target_id, target_status
                    )));
                }

                self.revisions[live].status = RevisionStatus::Draft;
                self.revisions[live].last_revision_id = None;
                self.revisions[target].status = RevisionStatus::Live;
                self.version -= 1;
                self.touch();
                Ok(Some(self.revisions[target].clone()))
            }
        }
    }

    /// Flip the enable switch of the named environment
    ///
    /// An unknown name is a silent no-op over the whole map; the return
    /// value reports whether anything matched so callers can log it.
    /// Revisions and the version counter are untouched.
    pub fn toggle_environment(&mut self, name: &str) -> bool {
        let mut matched = false;
        for environment in &mut self.environments {
            if environment.name == name {
                environment.is_enabled = !environment.is_enabled;
                matched = true;
            }
        }
        if matched {
            self.touch();
        }
        matched
    }
}
