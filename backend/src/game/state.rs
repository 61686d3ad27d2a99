use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::{
    game::DeckBuilder,
    models::{Card, Player, PublicPlayer, PublicState},
    words::CompoundWordTable,
};

/// Rejected moves. None of these end the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,
    #[error("No compound word found")]
    NoCompoundFound,
    #[error("Deck is empty")]
    DeckEmpty,
}

/// Tunable dealing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Rounds dealt on start, one card per player per round
    pub hand_size: usize,
    /// Cards drawn after a successful match
    pub replacement_draws: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hand_size: 5,
            replacement_draws: 2,
        }
    }
}

/// Roster, deck and turn state of one game
#[derive(Debug, Clone)]
pub struct Game {
    table: Arc<CompoundWordTable>,
    rules: Rules,
    players: HashMap<String, Player>,
    deck: Vec<Card>,
    /// Player ids in join order
    turn_order: Vec<String>,
    current_turn: usize,
    started: bool,
}

impl Game {
    pub fn new(table: Arc<CompoundWordTable>, rules: Rules) -> Self {
        Self {
            table,
            rules,
            players: HashMap::new(),
            deck: Vec::new(),
            turn_order: Vec::new(),
            current_turn: 0,
            started: false,
        }
    }

    /// Add a player before the game starts. Returns false if the game is
    /// already running or the id is taken.
    pub fn add_player(&mut self, id: &str, name: &str) -> bool {
        if self.started || self.players.contains_key(id) {
            return false;
        }

        self.players.insert(id.to_string(), Player::new(id, name));
        self.turn_order.push(id.to_string());
        true
    }

    /// Remove a player at any point. The removed hand leaves the game with it.
    pub fn remove_player(&mut self, id: &str) -> bool {
        let removed = self.players.remove(id).is_some();
        self.turn_order.retain(|pid| pid != id);
        if self.current_turn >= self.turn_order.len() {
            self.current_turn = 0;
        }
        removed
    }

    /// Build, shuffle and deal a fresh deck. Also used to restart.
    pub fn start(&mut self) {
        self.start_with_rng(&mut rand::rng());
    }

    pub fn start_with_rng(&mut self, rng: &mut impl Rng) {
        self.deck = DeckBuilder::build(&self.table);
        DeckBuilder::shuffle(&mut self.deck, rng);

        for player in self.players.values_mut() {
            player.hand.clear();
            player.found.clear();
        }

        for _ in 0..self.rules.hand_size {
            for id in &self.turn_order {
                if let Some(player) = self.players.get_mut(id) {
                    if let Some(card) = self.deck.pop() {
                        player.hand.push(card);
                    }
                }
            }
        }

        self.started = true;
        self.current_turn = 0;

        tracing::debug!(
            "Game started with {} players, {} cards left in deck",
            self.turn_order.len(),
            self.deck.len()
        );
    }

    /// Play two cards from the active player's hand as a compound word
    pub fn play_turn(&mut self, player_id: &str, card_ids: &[String]) -> Result<String, GameError> {
        self.ensure_turn(player_id)?;

        let compound = self
            .check_compound(player_id, card_ids)
            .ok_or(GameError::NoCompoundFound)?
            .to_string();
        let (first, second) = self
            .resolve_pair(player_id, card_ids)
            .ok_or(GameError::NoCompoundFound)?;

        let player = self
            .players
            .get_mut(player_id)
            .ok_or(GameError::NotYourTurn)?;
        // Higher index first so the lower one stays valid
        player.hand.remove(first.max(second));
        player.hand.remove(first.min(second));
        player.found.push(compound.clone());

        for _ in 0..self.rules.replacement_draws {
            match self.deck.pop() {
                Some(card) => player.hand.push(card),
                None => break,
            }
        }

        self.end_turn();
        Ok(compound)
    }

    /// Draw the top card. The turn passes even when the deck is empty.
    pub fn draw_card(&mut self, player_id: &str) -> Result<Card, GameError> {
        self.ensure_turn(player_id)?;

        let drawn = self.deck.pop();
        if let (Some(card), Some(player)) = (&drawn, self.players.get_mut(player_id)) {
            player.hand.push(card.clone());
        }
        self.end_turn();

        drawn.ok_or(GameError::DeckEmpty)
    }

    /// Pass the turn to the next player in join order
    pub fn end_turn(&mut self) {
        if self.turn_order.is_empty() {
            self.current_turn = 0;
            return;
        }
        self.current_turn = (self.current_turn + 1) % self.turn_order.len();
    }

    /// Compound word the two cards in the player's hand would form, if any
    pub fn check_compound(&self, player_id: &str, card_ids: &[String]) -> Option<&str> {
        let (first, second) = self.resolve_pair(player_id, card_ids)?;
        let hand = &self.players.get(player_id)?.hand;
        self.table.lookup(&hand[first].part, &hand[second].part)
    }

    /// Project the game for one viewer, hiding every other hand
    pub fn public_state(&self, requesting_id: &str) -> PublicState {
        let players = self
            .turn_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .map(|player| PublicPlayer {
                id: player.id.clone(),
                name: player.name.clone(),
                hand_count: player.hand.len(),
                found: player.found.clone(),
                hand: (player.id == requesting_id).then(|| player.hand.clone()),
            })
            .collect();

        PublicState {
            players,
            deck_count: self.deck.len(),
            started: self.started,
            total_words: self.table.len(),
        }
    }

    pub fn current_player(&self) -> Option<&str> {
        self.turn_order.get(self.current_turn).map(String::as_str)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.turn_order.len()
    }

    pub fn deck_count(&self) -> usize {
        self.deck.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Started, nothing left to draw and every hand played out
    pub fn is_depleted(&self) -> bool {
        self.started && self.deck.is_empty() && self.players.values().all(|p| p.hand.is_empty())
    }

    fn ensure_turn(&self, player_id: &str) -> Result<(), GameError> {
        match self.current_player() {
            Some(current) if current == player_id => Ok(()),
            _ => Err(GameError::NotYourTurn),
        }
    }

    /// Hand indices of exactly two distinct cards held by the player
    fn resolve_pair(&self, player_id: &str, card_ids: &[String]) -> Option<(usize, usize)> {
        let [a, b] = card_ids else {
            return None;
        };
        if a == b {
            return None;
        }
        let player = self.players.get(player_id)?;
        Some((player.card_index(a)?, player.card_index(b)?))
    }
}
