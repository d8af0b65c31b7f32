//! Cyclic turn selector over a shrinkable ordered set.
//!
//! One instance drives the agent cycle, a second the fixed 3-phase cycle.
//! The removal operation keeps turn-taking fair while agents are eliminated
//! mid-lap: every survivor is visited exactly once per lap, in unchanged
//! relative order, with no skips and no double visits.

use std::fmt;

/// Errors from misusing the selector. The environment checks its termination
/// conditions before any of these can occur; reaching one from the kernel is
/// a bug in the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    EmptySet,
    Duplicate,
    WouldEmpty,
    Unknown,
    NotCurrent,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySet => write!(f, "selector requires a non-empty set"),
            Self::Duplicate => write!(f, "selector entries must be distinct"),
            Self::WouldEmpty => write!(f, "removing the final entry would empty the selector"),
            Self::Unknown => write!(f, "entry is not a member of the selector"),
            Self::NotCurrent => write!(f, "only the currently selected entry can be removed"),
        }
    }
}

impl std::error::Error for SelectorError {}

/// Deterministic, gap-free cyclic cursor.
///
/// `pos == None` is the fresh state: nothing selected yet, the next
/// [`advance`](Self::advance) yields position 0 and `is_first`/`is_last`
/// both report false. Removal of the current entry resynchronizes the
/// cursor so the lap resumes with the entry that followed the removed one.
#[derive(Debug, Clone)]
pub struct CycleSelector<T> {
    order: Vec<T>,
    pos: Option<usize>,
}

impl<T: Clone + PartialEq + fmt::Debug> CycleSelector<T> {
    pub fn new(order: Vec<T>) -> Result<Self, SelectorError> {
        if order.is_empty() {
            return Err(SelectorError::EmptySet);
        }
        for (i, entry) in order.iter().enumerate() {
            if order[..i].contains(entry) {
                return Err(SelectorError::Duplicate);
            }
        }
        Ok(Self { order, pos: None })
    }

    /// The currently selected entry, if any.
    pub fn current(&self) -> Option<&T> {
        self.pos.map(|p| &self.order[p])
    }

    /// Select and return the next entry in cyclic order.
    pub fn advance(&mut self) -> &T {
        let next = match self.pos {
            None => 0,
            Some(p) => (p + 1) % self.order.len(),
        };
        self.pos = Some(next);
        &self.order[next]
    }

    /// Whether the current entry occupies position 0.
    pub fn is_first(&self) -> bool {
        self.pos == Some(0)
    }

    /// Whether the current entry occupies the final position.
    pub fn is_last(&self) -> bool {
        self.pos == Some(self.order.len() - 1)
    }

    /// Remaining entries in cycle order.
    pub fn members(&self) -> &[T] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, entry: &T) -> bool {
        self.order.contains(entry)
    }

    /// Remove the currently selected entry and resynchronize the cursor.
    ///
    /// If the removed entry occupies position 0 the selector returns to the
    /// fresh state: the shrunk order starts over and the next `advance`
    /// yields its new first entry. Otherwise the cursor is left on the
    /// removed entry's predecessor, so the next `advance` yields the entry
    /// that followed the removed one and `is_last` reports true exactly when
    /// the removed entry closed the lap.
    pub fn remove_and_resync(&mut self, entry: &T) -> Result<(), SelectorError> {
        let idx = self
            .order
            .iter()
            .position(|candidate| candidate == entry)
            .ok_or(SelectorError::Unknown)?;
        if self.pos != Some(idx) {
            return Err(SelectorError::NotCurrent);
        }
        if self.order.len() == 1 {
            return Err(SelectorError::WouldEmpty);
        }
        self.order.remove(idx);
        self.pos = if idx == 0 { None } else { Some(idx - 1) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("persona_{i}")).collect()
    }

    #[test]
    fn rejects_empty_and_duplicate_sets() {
        assert_eq!(
            CycleSelector::<String>::new(Vec::new()).err(),
            Some(SelectorError::EmptySet)
        );
        assert_eq!(
            CycleSelector::new(vec!["a", "b", "a"]).err(),
            Some(SelectorError::Duplicate)
        );
    }

    #[test]
    fn fresh_state_has_no_selection() {
        let selector = CycleSelector::new(agents(3)).expect("selector");
        assert_eq!(selector.current(), None);
        assert!(!selector.is_first());
        assert!(!selector.is_last());
    }

    #[test]
    fn advance_cycles_in_original_order() {
        for n in 2..=5 {
            let order = agents(n);
            let mut selector = CycleSelector::new(order.clone()).expect("selector");
            let lap: Vec<String> = (0..n).map(|_| selector.advance().clone()).collect();
            assert_eq!(lap, order, "lap for n={n}");
            // The (n+1)th advance wraps to the first agent.
            assert_eq!(selector.advance(), &order[0]);
        }
    }

    #[test]
    fn first_and_last_track_positions() {
        let order = agents(3);
        let mut selector = CycleSelector::new(order).expect("selector");
        selector.advance();
        assert!(selector.is_first());
        assert!(!selector.is_last());
        selector.advance();
        assert!(!selector.is_first());
        selector.advance();
        assert!(selector.is_last());
    }

    #[test]
    fn single_entry_is_both_first_and_last() {
        let mut selector = CycleSelector::new(vec!["only".to_string()]).expect("selector");
        selector.advance();
        assert!(selector.is_first());
        assert!(selector.is_last());
    }

    #[test]
    fn removal_resync_is_fair_for_every_position_and_count() {
        for n in 2..=5 {
            for k in 0..n {
                let order = agents(n);
                let mut selector = CycleSelector::new(order.clone()).expect("selector");
                for _ in 0..=k {
                    selector.advance();
                }
                assert_eq!(selector.current(), Some(&order[k]));
                let removed = order[k].clone();
                selector.remove_and_resync(&removed).expect("resync");
                assert!(!selector.contains(&removed));

                // Survivors continue the lap from the slot after the removed
                // entry, in their original relative order, each exactly once.
                let expected: Vec<String> = order[k + 1..]
                    .iter()
                    .chain(order[..k].iter())
                    .cloned()
                    .collect();
                let visited: Vec<String> =
                    (0..n - 1).map(|_| selector.advance().clone()).collect();
                assert_eq!(visited, expected, "first lap after removing k={k} of n={n}");

                // The following lap repeats the same cycle.
                let repeat: Vec<String> =
                    (0..n - 1).map(|_| selector.advance().clone()).collect();
                assert_eq!(repeat, expected, "second lap after removing k={k} of n={n}");
            }
        }
    }

    #[test]
    fn removing_first_position_resets_to_fresh_state() {
        let order = agents(3);
        let mut selector = CycleSelector::new(order.clone()).expect("selector");
        selector.advance();
        selector.remove_and_resync(&order[0]).expect("resync");
        assert_eq!(selector.current(), None);
        assert!(!selector.is_last());
        assert_eq!(selector.advance(), &order[1]);
    }

    #[test]
    fn removing_last_position_closes_the_lap() {
        let order = agents(4);
        let mut selector = CycleSelector::new(order.clone()).expect("selector");
        for _ in 0..4 {
            selector.advance();
        }
        selector.remove_and_resync(&order[3]).expect("resync");
        // Cursor rests on the predecessor, which is now the final position.
        assert_eq!(selector.current(), Some(&order[2]));
        assert!(selector.is_last());
        assert_eq!(selector.advance(), &order[0]);
    }

    #[test]
    fn removal_requires_the_current_entry() {
        let order = agents(3);
        let mut selector = CycleSelector::new(order.clone()).expect("selector");
        selector.advance();
        assert_eq!(
            selector.remove_and_resync(&order[2]).err(),
            Some(SelectorError::NotCurrent)
        );
        assert_eq!(
            selector.remove_and_resync(&"persona_9".to_string()).err(),
            Some(SelectorError::Unknown)
        );
    }

    #[test]
    fn removing_the_final_entry_is_rejected() {
        let mut selector = CycleSelector::new(vec!["only".to_string()]).expect("selector");
        selector.advance();
        assert_eq!(
            selector.remove_and_resync(&"only".to_string()).err(),
            Some(SelectorError::WouldEmpty)
        );
        assert_eq!(selector.len(), 1);
    }

    #[test]
    fn consecutive_removals_operate_on_the_shrunk_order() {
        let order = agents(4);
        let mut selector = CycleSelector::new(order.clone()).expect("selector");
        // Remove persona_1, then persona_2 as soon as it is selected.
        selector.advance();
        selector.advance();
        selector.remove_and_resync(&order[1]).expect("first resync");
        assert_eq!(selector.advance(), &order[2]);
        selector.remove_and_resync(&order[2]).expect("second resync");
        assert_eq!(selector.members(), &[order[0].clone(), order[3].clone()]);
        assert_eq!(selector.advance(), &order[3]);
        assert!(selector.is_last());
        assert_eq!(selector.advance(), &order[0]);
    }
}
