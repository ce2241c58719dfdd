//! Card matching rules.

use std::collections::BTreeSet;

use crate::deck::Card;

/// Effect of a reveal request on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The request was ignored. The grid is unchanged.
    Rejected,
    /// A first card was turned face up.
    Flipped,
    /// A second card completed a pair.
    Matched {
        /// Whether this pair cleared the whole grid.
        complete: bool,
    },
    /// A second card did not match. Both stay up until the caller
    /// resolves the mismatch.
    Mismatched(usize, usize),
}

/// Grid state and pairing rules, independent of any clock.
#[derive(Debug, Default)]
pub struct MatchEngine {
    cards: Vec<Card>,
    selection: Vec<usize>,
    matched: BTreeSet<usize>,
    started: bool,
}

impl MatchEngine {
    /// Create an engine over the given deck, all cards face down.
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            selection: Vec::new(),
            matched: BTreeSet::new(),
            started: false,
        }
    }

    /// Allow reveals. Until started, every reveal is rejected.
    pub fn start(&mut self) {
        self.started = true;
    }

    /// Replace the deck and clear all progress.
    pub fn reset(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.selection.clear();
        self.matched.clear();
        self.started = false;
    }

    /// Request that the card with `id` be turned face up.
    ///
    /// Requests are rejected before start, while two cards are already
    /// up, for unknown ids, and for cards already face up or matched.
    pub fn reveal(&mut self, id: usize) -> RevealOutcome {
        if !self.started || self.selection.len() == 2 || self.matched.contains(&id) {
            return RevealOutcome::Rejected;
        }
        let Some(index) = self.cards.iter().position(|card| card.id == id) else {
            return RevealOutcome::Rejected;
        };
        if self.cards[index].flipped {
            return RevealOutcome::Rejected;
        }

        self.cards[index].flipped = true;
        self.selection.push(index);
        if self.selection.len() < 2 {
            return RevealOutcome::Flipped;
        }

        let first = self.selection[0];
        let second = self.selection[1];
        if self.cards[first].face == self.cards[second].face {
            self.matched.insert(self.cards[first].id);
            self.matched.insert(self.cards[second].id);
            self.selection.clear();
            RevealOutcome::Matched {
                complete: self.is_complete(),
            }
        } else {
            RevealOutcome::Mismatched(self.cards[first].id, self.cards[second].id)
        }
    }

    /// Turn the current mismatched pair back face down.
    pub fn resolve_mismatch(&mut self) {
        for index in self.selection.drain(..) {
            self.cards[index].flipped = false;
        }
    }

    /// Turn every card face up, leaving selection and matches alone.
    pub fn show_all(&mut self) {
        for card in &mut self.cards {
            card.flipped = true;
        }
    }

    /// Turn every unmatched, unselected card back face down.
    pub fn hide_unmatched(&mut self) {
        for (index, card) in self.cards.iter_mut().enumerate() {
            if !self.matched.contains(&card.id) && !self.selection.contains(&index) {
                card.flipped = false;
            }
        }
    }

    /// Whether every card on the grid has been matched.
    pub fn is_complete(&self) -> bool {
        self.matched.len() == self.cards.len()
    }

    /// Whether a mismatched pair is waiting to be resolved.
    pub fn has_pending_mismatch(&self) -> bool {
        self.selection.len() == 2
    }

    /// Cards in grid order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Whether the card with `id` has been matched.
    pub fn is_matched(&self, id: usize) -> bool {
        self.matched.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pair_engine() -> MatchEngine {
        // Fixed layout: ids 0/2 share "a", ids 1/3 share "b".
        let cards = vec![
            Card::new(0, "a"),
            Card::new(1, "b"),
            Card::new(2, "a"),
            Card::new(3, "b"),
        ];
        let mut engine = MatchEngine::new(cards);
        engine.start();
        engine
    }

    #[test]
    fn reveal_before_start_is_rejected() {
        let mut engine = MatchEngine::new(vec![Card::new(0, "a"), Card::new(1, "a")]);
        assert_eq!(engine.reveal(0), RevealOutcome::Rejected);
        assert!(!engine.cards()[0].flipped);
    }

    #[test]
    fn matching_pair_stays_up() {
        let mut engine = two_pair_engine();
        assert_eq!(engine.reveal(0), RevealOutcome::Flipped);
        assert_eq!(engine.reveal(2), RevealOutcome::Matched { complete: false });
        assert!(engine.is_matched(0));
        assert!(engine.is_matched(2));
        assert!(engine.cards()[0].flipped);
        assert!(!engine.has_pending_mismatch());
    }

    #[test]
    fn mismatch_blocks_until_resolved() {
        let mut engine = two_pair_engine();
        engine.reveal(0);
        assert_eq!(engine.reveal(1), RevealOutcome::Mismatched(0, 1));
        assert!(engine.has_pending_mismatch());

        // Third reveal while two are up must be ignored.
        assert_eq!(engine.reveal(3), RevealOutcome::Rejected);
        assert!(!engine.cards()[3].flipped);

        engine.resolve_mismatch();
        assert!(!engine.cards()[0].flipped);
        assert!(!engine.cards()[1].flipped);
        assert_eq!(engine.reveal(3), RevealOutcome::Flipped);
    }

    #[test]
    fn revealing_the_same_card_twice_is_rejected() {
        let mut engine = two_pair_engine();
        engine.reveal(0);
        assert_eq!(engine.reveal(0), RevealOutcome::Rejected);
    }

    #[test]
    fn matched_cards_cannot_be_revealed_again() {
        let mut engine = two_pair_engine();
        engine.reveal(0);
        engine.reveal(2);
        assert_eq!(engine.reveal(0), RevealOutcome::Rejected);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut engine = two_pair_engine();
        assert_eq!(engine.reveal(42), RevealOutcome::Rejected);
    }

    #[test]
    fn clearing_the_grid_reports_completion() {
        let mut engine = two_pair_engine();
        engine.reveal(0);
        engine.reveal(2);
        assert!(!engine.is_complete());
        assert_eq!(engine.reveal(1), RevealOutcome::Flipped);
        assert_eq!(engine.reveal(3), RevealOutcome::Matched { complete: true });
        assert!(engine.is_complete());
    }

    #[test]
    fn hide_unmatched_keeps_matches_and_selection_up() {
        let mut engine = two_pair_engine();
        engine.reveal(0);
        engine.reveal(2);
        engine.reveal(1);
        engine.show_all();
        engine.hide_unmatched();

        assert!(engine.cards()[0].flipped);
        assert!(engine.cards()[2].flipped);
        assert!(engine.cards()[1].flipped);
        assert!(!engine.cards()[3].flipped);
    }

    #[test]
    fn reset_returns_to_a_fresh_grid() {
        let mut engine = two_pair_engine();
        engine.reveal(0);
        engine.reveal(2);
        engine.reset(vec![Card::new(0, "z"), Card::new(1, "z")]);

        assert!(!engine.is_matched(0));
        assert!(engine.cards().iter().all(|card| !card.flipped));
        assert_eq!(engine.reveal(0), RevealOutcome::Rejected);
    }

    #[test]
    fn empty_grid_counts_as_complete() {
        let engine = MatchEngine::new(Vec::new());
        assert!(engine.is_complete());
    }
}
