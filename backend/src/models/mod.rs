pub mod game;

pub use game::{Card, Player, PublicPlayer, PublicState};
