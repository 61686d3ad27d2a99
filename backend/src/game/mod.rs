pub mod deck;
pub mod state;

pub use deck::DeckBuilder;
pub use state::{Game, GameError, Rules};
