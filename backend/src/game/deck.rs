use rand::{seq::SliceRandom, Rng};

use crate::{models::Card, words::CompoundWordTable};

/// Builds fresh decks from the compound word table
pub struct DeckBuilder;

impl DeckBuilder {
    /// Two cards per table entry, in table order, with ids unique to this deck
    pub fn build(table: &CompoundWordTable) -> Vec<Card> {
        let mut next_id = 0usize;
        let mut deck = Vec::with_capacity(table.len() * 2);

        for entry in table.entries() {
            for part in [&entry.first, &entry.second] {
                deck.push(Card {
                    part: part.clone(),
                    id: format!("{}-{}", part, next_id),
                });
                next_id += 1;
            }
        }

        deck
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle(deck: &mut [Card], rng: &mut impl Rng) {
        deck.shuffle(rng);
    }
}
