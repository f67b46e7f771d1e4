//! # Optimistic Mutation
//!
//! Apply a change locally before the remote side confirms it, keeping a
//! snapshot to restore if the remote update fails.
//!
//! ```text
//! local state ──apply──► changed ──remote ok──► commit()   (snapshot dropped)
//!                           │
//!                           └──remote err──► rollback()  (snapshot restored)
//! ```
//!
//! The guard owns only the snapshot, not a borrow of the state, so the
//! caller can await the remote call between `apply` and the outcome.

/// Snapshot of a value taken right before an optimistic change.
#[derive(Debug)]
#[must_use = "an optimistic change must be committed or rolled back"]
pub struct Optimistic<T: Clone> {
    snapshot: T,
}

impl<T: Clone> Optimistic<T> {
    /// Snapshots `target`, then applies `change` to it.
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::optimistic::Optimistic;
    ///
    /// let mut favorite = false;
    /// let pending = Optimistic::apply(&mut favorite, |f| *f = !*f);
    /// assert!(favorite);
    ///
    /// // remote call failed
    /// pending.rollback(&mut favorite);
    /// assert!(!favorite);
    /// ```
    pub fn apply<F>(target: &mut T, change: F) -> Self
    where
        F: FnOnce(&mut T),
    {
        let snapshot = target.clone();
        change(target);
        Optimistic { snapshot }
    }

    /// The value before the change.
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Keeps the change.
    pub fn commit(self) {}

    /// Restores the value from before the change.
    pub fn rollback(self, target: &mut T) {
        *target = self.snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_keeps_change() {
        let mut names = vec!["margherita".to_string()];
        let pending = Optimistic::apply(&mut names, |n| n.push("calabresa".to_string()));

        assert_eq!(pending.snapshot().len(), 1);
        pending.commit();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut price = 1000_i64;
        let pending = Optimistic::apply(&mut price, |p| *p = 1200);
        assert_eq!(price, 1200);

        pending.rollback(&mut price);
        assert_eq!(price, 1000);
    }
}
