//! Pending page edits for the document being worked on.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use serde::Serialize;

use super::generation::{GenerationCounter, GenerationToken};
use super::rewriter::{validate_permutation, PageRewriter, RewritePlan};
use crate::error::{Error, Result};
use crate::model::{PdfDocument, Rotation};

/// Where the store is in its edit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditState {
    /// No document loaded.
    Empty,
    /// A document is loaded and edits are accepted.
    Editing,
    /// Edits are being written; further edits are rejected.
    Committing,
}

/// Which rotations [`PageTransformStore::reset_rotation`] clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTarget {
    Page(u32),
    All,
}

/// A commit in progress, returned by [`PageTransformStore::begin_commit`].
///
/// Dropping a ticket without passing it to
/// [`finish_commit`](PageTransformStore::finish_commit) abandons the commit:
/// the store goes back to `Editing` with its pending edits kept.
#[derive(Debug)]
#[must_use = "a commit ticket must be passed to finish_commit"]
pub struct CommitTicket {
    plan: RewritePlan,
    token: GenerationToken,
    _live: Arc<()>,
}

impl CommitTicket {
    /// The edits to write.
    pub fn plan(&self) -> &RewritePlan {
        &self.plan
    }

    /// The generation the commit was started under.
    pub fn token(&self) -> &GenerationToken {
        &self.token
    }
}

/// Accumulates rotations and a page order until they are committed.
///
/// Rotations are kept as raw degrees in `0..360` and normalized to the
/// nearest quarter turn when read back.
#[derive(Debug)]
pub struct PageTransformStore {
    state: EditState,
    total: u32,
    rotations: BTreeMap<u32, u16>,
    order: Vec<u32>,
    generation: GenerationCounter,
    /// Dead once the outstanding commit ticket is finished or dropped
    commit: Weak<()>,
}

impl Default for PageTransformStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTransformStore {
    pub fn new() -> Self {
        Self::with_counter(GenerationCounter::new())
    }

    /// Create a store that bumps `counter` whenever its document changes.
    pub fn with_counter(counter: GenerationCounter) -> Self {
        Self {
            state: EditState::Empty,
            total: 0,
            rotations: BTreeMap::new(),
            order: Vec::new(),
            generation: counter,
            commit: Weak::new(),
        }
    }

    pub fn state(&self) -> EditState {
        match self.state {
            EditState::Committing if self.commit.strong_count() == 0 => EditState::Editing,
            state => state,
        }
    }

    /// Number of pages of the loaded document.
    pub fn total_pages(&self) -> u32 {
        self.total
    }

    /// The counter bumped on every load, reset and commit.
    pub fn generation(&self) -> &GenerationCounter {
        &self.generation
    }

    /// A token for the current document state.
    pub fn token(&self) -> GenerationToken {
        self.generation.token()
    }

    /// Start editing a document with `total_pages` pages, discarding all edits.
    pub fn load(&mut self, total_pages: u32) -> GenerationToken {
        self.clear_edits(total_pages);
        self.state = EditState::Editing;
        log::debug!("edit store loaded with {} pages", total_pages);
        self.generation.bump()
    }

    /// Forget the document and all edits.
    pub fn reset(&mut self) {
        self.clear_edits(0);
        self.state = EditState::Empty;
        self.generation.bump();
    }

    /// Add `delta` degrees to a page's rotation and return the normalized result.
    pub fn set_rotation(&mut self, page: u32, delta: i32) -> Result<Rotation> {
        self.ensure_editing()?;
        self.check_page(page)?;
        let stored = self.rotations.get(&page).copied().unwrap_or(0);
        let updated = (i64::from(stored) + i64::from(delta)).rem_euclid(360) as u16;
        if updated == 0 {
            self.rotations.remove(&page);
        } else {
            self.rotations.insert(page, updated);
        }
        Ok(Rotation::from_degrees(i64::from(updated)))
    }

    /// The pending rotation of a page.
    pub fn rotation(&self, page: u32) -> Result<Rotation> {
        if self.state == EditState::Empty {
            return Err(Error::InvalidState("no document loaded".into()));
        }
        self.check_page(page)?;
        let stored = self.rotations.get(&page).copied().unwrap_or(0);
        Ok(Rotation::from_degrees(i64::from(stored)))
    }

    /// Clear the pending rotation of one page or of all pages.
    pub fn reset_rotation(&mut self, target: RotationTarget) -> Result<()> {
        self.ensure_editing()?;
        match target {
            RotationTarget::Page(page) => {
                self.check_page(page)?;
                self.rotations.remove(&page);
            }
            RotationTarget::All => self.rotations.clear(),
        }
        Ok(())
    }

    /// Replace the pending page order. Rejected orders leave the current one untouched.
    pub fn reorder(&mut self, order: Vec<u32>) -> Result<()> {
        self.ensure_editing()?;
        validate_permutation(&order, self.total)?;
        self.order = order;
        Ok(())
    }

    /// The pending page order.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Whether any edit is pending.
    pub fn is_dirty(&self) -> bool {
        !self.plan().is_empty()
    }

    /// The pending edits as a rewrite plan.
    pub fn plan(&self) -> RewritePlan {
        let rotations = self
            .rotations
            .iter()
            .map(|(&page, &deg)| (page, Rotation::from_degrees(i64::from(deg))))
            .filter(|(_, rotation)| *rotation != Rotation::Deg0)
            .collect();
        let identity = self.order.iter().enumerate().all(|(i, &p)| p as usize == i + 1);
        RewritePlan {
            rotations,
            order: (!identity).then(|| self.order.clone()),
        }
    }

    /// Write the pending edits to a new document.
    ///
    /// On success the edits are cleared; on failure they are kept and the
    /// error is returned. Either way the store is back in `Editing`.
    pub fn commit(&mut self, doc: &PdfDocument, rewriter: &PageRewriter) -> Result<PdfDocument> {
        if doc.page_count() != self.total {
            self.ensure_editing()?;
            return Err(Error::validation(format!(
                "document has {} pages but {} are being edited",
                doc.page_count(),
                self.total
            )));
        }
        let ticket = self.begin_commit()?;
        let result = rewriter.apply(doc, ticket.plan());
        self.finish_commit(ticket, result)
    }

    /// Enter `Committing` and hand out the edits to write.
    pub fn begin_commit(&mut self) -> Result<CommitTicket> {
        self.ensure_editing()?;
        let live = Arc::new(());
        self.commit = Arc::downgrade(&live);
        self.state = EditState::Committing;
        Ok(CommitTicket {
            plan: self.plan(),
            token: self.generation.token(),
            _live: live,
        })
    }

    /// Complete a commit started with [`begin_commit`](Self::begin_commit).
    ///
    /// If the store was loaded or reset in the meantime the result is
    /// discarded and `Error::Stale` is returned.
    pub fn finish_commit(
        &mut self,
        ticket: CommitTicket,
        result: Result<PdfDocument>,
    ) -> Result<PdfDocument> {
        if !ticket.token.is_current() {
            log::debug!(
                "discarding commit for generation {}",
                ticket.token.generation()
            );
            return Err(Error::Stale);
        }
        self.state = EditState::Editing;
        match result {
            Ok(doc) => {
                self.clear_edits(doc.page_count());
                self.generation.bump();
                log::info!("committed page edits ({} pages)", doc.page_count());
                Ok(doc)
            }
            Err(e) => {
                log::warn!("commit failed, keeping pending edits: {}", e);
                Err(e)
            }
        }
    }

    fn clear_edits(&mut self, total: u32) {
        self.total = total;
        self.rotations.clear();
        self.order = (1..=total).collect();
    }

    fn ensure_editing(&self) -> Result<()> {
        match self.state() {
            EditState::Editing => Ok(()),
            EditState::Empty => Err(Error::InvalidState("no document loaded".into())),
            EditState::Committing => Err(Error::InvalidState("a commit is in progress".into())),
        }
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.total {
            return Err(Error::PageOutOfRange(page, self.total));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(total: u32) -> PageTransformStore {
        let mut store = PageTransformStore::new();
        store.load(total);
        store
    }

    #[test]
    fn test_rotation_wraps_and_normalizes() {
        let mut store = loaded(3);
        assert_eq!(store.set_rotation(1, 90).unwrap(), Rotation::Deg90);
        assert_eq!(store.set_rotation(1, 300).unwrap(), Rotation::Deg0);
        assert_eq!(store.set_rotation(1, 15).unwrap(), Rotation::Deg90);
        assert_eq!(store.set_rotation(2, -90).unwrap(), Rotation::Deg270);
        assert_eq!(store.set_rotation(2, 720).unwrap(), Rotation::Deg270);
        assert_eq!(store.rotation(3).unwrap(), Rotation::Deg0);
    }

    #[test]
    fn test_rotation_out_of_range() {
        let mut store = loaded(2);
        assert!(matches!(
            store.set_rotation(3, 90),
            Err(Error::PageOutOfRange(3, 2))
        ));
        assert!(matches!(store.rotation(0), Err(Error::PageOutOfRange(0, 2))));
    }

    #[test]
    fn test_reset_rotation() {
        let mut store = loaded(3);
        store.set_rotation(1, 90).unwrap();
        store.set_rotation(2, 180).unwrap();
        store.reset_rotation(RotationTarget::Page(1)).unwrap();
        assert_eq!(store.rotation(1).unwrap(), Rotation::Deg0);
        assert_eq!(store.rotation(2).unwrap(), Rotation::Deg180);
        store.reset_rotation(RotationTarget::All).unwrap();
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_rejected_reorder_keeps_order() {
        let mut store = loaded(3);
        store.reorder(vec![3, 2, 1]).unwrap();
        assert!(store.reorder(vec![1, 1, 2]).is_err());
        assert!(store.reorder(vec![1, 2, 9]).is_err());
        assert_eq!(store.order(), &[3, 2, 1]);
    }

    #[test]
    fn test_plan_skips_noops() {
        let mut store = loaded(3);
        assert!(store.plan().is_empty());
        store.set_rotation(2, 90).unwrap();
        store.set_rotation(3, 10).unwrap();
        let plan = store.plan();
        assert_eq!(plan.rotations.len(), 1);
        assert_eq!(plan.rotations[&2], Rotation::Deg90);
        assert_eq!(plan.order, None);
    }

    #[test]
    fn test_edits_rejected_while_committing() {
        let mut store = loaded(2);
        let _ticket = store.begin_commit().unwrap();
        assert_eq!(store.state(), EditState::Committing);
        assert!(matches!(
            store.set_rotation(1, 90),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(store.reorder(vec![2, 1]), Err(Error::InvalidState(_))));
        assert!(store.begin_commit().is_err());
    }

    #[test]
    fn test_dropped_ticket_abandons_commit() {
        let mut store = loaded(3);
        store.set_rotation(2, 90).unwrap();
        let ticket = store.begin_commit().unwrap();
        assert_eq!(store.state(), EditState::Committing);
        drop(ticket);

        assert_eq!(store.state(), EditState::Editing);
        assert_eq!(store.rotation(2).unwrap(), Rotation::Deg90);
        store.reorder(vec![3, 1, 2]).unwrap();
        let ticket = store.begin_commit().unwrap();
        assert_eq!(ticket.plan().order, Some(vec![3, 1, 2]));
    }

    #[test]
    fn test_failed_commit_keeps_edits() {
        let mut store = loaded(2);
        store.set_rotation(1, 90).unwrap();
        let ticket = store.begin_commit().unwrap();
        let result = store.finish_commit(ticket, Err(Error::render("boom")));
        assert!(matches!(result, Err(Error::Render(_))));
        assert_eq!(store.state(), EditState::Editing);
        assert_eq!(store.rotation(1).unwrap(), Rotation::Deg90);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut store = loaded(2);
        let ticket = store.begin_commit().unwrap();
        let token = store.load(5);
        let result = store.finish_commit(ticket, Err(Error::render("late")));
        assert!(matches!(result, Err(Error::Stale)));
        assert!(token.is_current());
        assert_eq!(store.state(), EditState::Editing);
        assert_eq!(store.total_pages(), 5);
    }

    #[test]
    fn test_empty_store_rejects_edits() {
        let mut store = PageTransformStore::new();
        assert_eq!(store.state(), EditState::Empty);
        assert!(matches!(
            store.set_rotation(1, 90),
            Err(Error::InvalidState(_))
        ));
        store.load(1);
        store.reset();
        assert!(matches!(store.rotation(1), Err(Error::InvalidState(_))));
    }
}
