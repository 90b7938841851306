//! Optimistic list updates
//!
//! A mutation is applied locally before the store confirms it. The list
//! keeps a snapshot of the state before the patch until the outcome is
//! known:
//! - success: [`OptimisticList::confirm`] drops the snapshot
//! - failure: [`OptimisticList::reconcile`] replaces the list with server
//!   truth, or rolls back to the snapshot when server truth is unavailable

/// In-memory list with at most one pending patch
#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    items: Vec<T>,
    snapshot: Option<Vec<T>>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            snapshot: None,
        }
    }
}

impl<T: Clone> OptimisticList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            snapshot: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Replace the list with confirmed data, discarding any pending patch
    pub fn set(&mut self, items: Vec<T>) {
        self.items = items;
        self.snapshot = None;
    }

    /// Mutate confirmed state directly (store already accepted the change)
    pub fn confirmed_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    /// Apply a patch ahead of confirmation.
    ///
    /// A patch applied while another is pending keeps the older snapshot,
    /// so a rollback always returns to the last confirmed state.
    pub fn apply<F>(&mut self, patch: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        if self.snapshot.is_none() {
            self.snapshot = Some(self.items.clone());
        }
        patch(&mut self.items);
    }

    /// The store accepted the patch
    pub fn confirm(&mut self) {
        self.snapshot = None;
    }

    /// The store rejected the patch.
    ///
    /// `Some(truth)` replaces the list with freshly loaded server state.
    /// `None` restores the pre-patch snapshot.
    pub fn reconcile(&mut self, server_truth: Option<Vec<T>>) {
        let snapshot = self.snapshot.take();
        match server_truth {
            Some(items) => self.items = items,
            None => {
                if let Some(items) = snapshot {
                    self.items = items;
                }
            }
        }
    }
}
