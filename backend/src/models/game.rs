use serde::{Deserialize, Serialize};

/// A card carrying one word fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub part: String,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Cards not yet played
    pub hand: Vec<Card>,
    /// Compound words assembled so far
    pub found: Vec<String>,
}

impl Player {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            hand: Vec::new(),
            found: Vec::new(),
        }
    }

    /// Position of a card in the hand by id
    pub fn card_index(&self, card_id: &str) -> Option<usize> {
        self.hand.iter().position(|card| card.id == card_id)
    }
}

/// A player as seen by one connection; `hand` is only present for the viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlayer {
    pub id: String,
    pub name: String,
    pub hand_count: usize,
    pub found: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
}

/// Game state projected for one connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub players: Vec<PublicPlayer>,
    pub deck_count: usize,
    pub started: bool,
    pub total_words: usize,
}
