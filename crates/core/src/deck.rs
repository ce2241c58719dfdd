//! Deck construction for the memory grid.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Face symbols available to the deck builder. Nine faces, matching the
/// nine promotional card images of the original campaign.
pub const DEFAULT_FACES: [&str; 9] = ["♠", "♥", "♦", "♣", "★", "☀", "☾", "♪", "✿"];

/// Identifier shared by exactly two cards in a deck.
pub type FaceKey = String;

/// One slot in the memory grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Unique slot id, assigned in shuffled order.
    pub id: usize,
    /// Face symbol; every face appears on exactly two cards.
    pub face: FaceKey,
    /// Whether the card currently shows its face.
    pub flipped: bool,
}

impl Card {
    /// Create a face-down card.
    pub fn new(id: usize, face: impl Into<FaceKey>) -> Self {
        Self {
            id,
            face: face.into(),
            flipped: false,
        }
    }
}

/// Build a paired deck from the given faces, shuffled uniformly.
pub fn build_deck<S: AsRef<str>>(faces: &[S]) -> Vec<Card> {
    build_deck_with(faces, &mut rand::thread_rng())
}

/// Deterministic variant of [`build_deck`] driven by the supplied RNG.
pub fn build_deck_with<S, R>(faces: &[S], rng: &mut R) -> Vec<Card>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let mut pool: Vec<&str> = faces
        .iter()
        .chain(faces.iter())
        .map(|face| face.as_ref())
        .collect();
    pool.shuffle(rng);
    pool.into_iter()
        .enumerate()
        .map(|(id, face)| Card::new(id, face))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    #[test]
    fn deck_pairs_every_face_exactly_twice() {
        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let faces = ["a", "b", "c", "d", "e"];
            let deck = build_deck_with(&faces, &mut rng);
            assert_eq!(deck.len(), faces.len() * 2);

            let mut counts: HashMap<&str, usize> = HashMap::new();
            for card in &deck {
                *counts.entry(card.face.as_str()).or_default() += 1;
            }
            assert_eq!(counts.len(), faces.len());
            assert!(counts.values().all(|count| *count == 2));
        }
    }

    #[test]
    fn deck_ids_follow_slot_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let deck = build_deck_with(&["x", "y"], &mut rng);
        let ids: Vec<usize> = deck.iter().map(|card| card.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(deck.iter().all(|card| !card.flipped));
    }

    #[test]
    fn single_face_builds_a_two_card_deck() {
        let deck = build_deck(&["only"]);
        assert_eq!(deck.len(), 2);
        assert_eq!(deck[0].face, deck[1].face);
    }

    #[test]
    fn empty_face_list_builds_an_empty_deck() {
        let faces: [&str; 0] = [];
        assert!(build_deck(&faces).is_empty());
    }
}
