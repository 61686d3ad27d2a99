use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::{
    game::{Game, Rules},
    websocket::messages::{DrawResult, ServerMessage, TurnResult},
    words::CompoundWordTable,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Join a game first")]
    NotJoined,
    #[error("Game already started")]
    GameAlreadyStarted,
    #[error("Please enter your name")]
    EmptyName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Waits for queue space; used for replies to the acting connection
    Reliable,
    /// Dropped when the peer's queue is full; used for room broadcasts
    BestEffort,
}

/// A message queued for one connection, sent once all locks are released
#[derive(Debug)]
pub struct Outbound {
    pub tx: mpsc::Sender<ServerMessage>,
    pub message: ServerMessage,
    pub delivery: Delivery,
}

impl Outbound {
    pub fn reply(tx: mpsc::Sender<ServerMessage>, message: ServerMessage) -> Self {
        Self {
            tx,
            message,
            delivery: Delivery::Reliable,
        }
    }

    pub fn broadcast(tx: mpsc::Sender<ServerMessage>, message: ServerMessage) -> Self {
        Self {
            tx,
            message,
            delivery: Delivery::BestEffort,
        }
    }

    /// Send in order. A stalled peer never blocks the caller on a broadcast.
    pub async fn deliver(messages: Vec<Outbound>) {
        for outbound in messages {
            match outbound.delivery {
                Delivery::Reliable => {
                    // A closed queue means the connection is already tearing down
                    let _ = outbound.tx.send(outbound.message).await;
                }
                Delivery::BestEffort => match outbound.tx.try_send(outbound.message) {
                    Ok(()) | Err(TrySendError::Closed(_)) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("Outbound queue full, dropping room broadcast");
                    }
                },
            }
        }
    }
}

/// One game and the connections playing it
#[derive(Debug)]
pub struct Room {
    pub room_id: String,
    pub game: Game,
    /// Member connections and their outbound queues
    pub members: HashMap<Uuid, mpsc::Sender<ServerMessage>>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    fn new(room_id: String, game: Game) -> Self {
        Self {
            room_id,
            game,
            members: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Each member's own view of the game
    pub fn state_for_members(&self) -> Vec<Outbound> {
        self.members
            .iter()
            .map(|(connection, tx)| {
                Outbound::broadcast(
                    tx.clone(),
                    ServerMessage::GameState(self.game.public_state(&connection.to_string())),
                )
            })
            .collect()
    }

    pub fn start(&mut self) -> Vec<Outbound> {
        let restarting = self.game.is_started();
        self.game.start();
        tracing::info!(
            "Room {} {} with {} players, {} cards in deck",
            self.room_id,
            if restarting { "restarted" } else { "started" },
            self.game.player_count(),
            self.game.deck_count()
        );
        self.state_for_members()
    }

    pub fn play_turn(&mut self, connection: Uuid, card_ids: &[String]) -> Vec<Outbound> {
        let result = self.game.play_turn(&connection.to_string(), card_ids);
        match &result {
            Ok(compound) => tracing::info!("{} formed '{}' in room {}", connection, compound, self.room_id),
            Err(e) => tracing::debug!("{} play rejected in room {}: {}", connection, self.room_id, e),
        }
        self.log_if_depleted();

        let mut outbound = self.state_for_members();
        outbound.extend(self.reply(connection, ServerMessage::TurnResult(TurnResult::from(result))));
        outbound
    }

    pub fn draw_card(&mut self, connection: Uuid) -> Vec<Outbound> {
        let player_id = connection.to_string();
        let result = self.game.draw_card(&player_id);
        match &result {
            Ok(card) => tracing::debug!(
                "{} drew {} in room {} (hand: {})",
                connection,
                card.id,
                self.room_id,
                self.game.player(&player_id).map_or(0, |p| p.hand.len())
            ),
            Err(e) => tracing::debug!("{} draw in room {}: {}", connection, self.room_id, e),
        }

        let mut outbound = self.state_for_members();
        outbound.extend(self.reply(connection, ServerMessage::DrawResult(DrawResult::from(result))));
        outbound
    }

    fn reply(&self, connection: Uuid, message: ServerMessage) -> Option<Outbound> {
        self.members
            .get(&connection)
            .map(|tx| Outbound::reply(tx.clone(), message))
    }

    fn log_if_depleted(&self) {
        if self.game.is_depleted() {
            tracing::info!("Room {} has no cards left in play", self.room_id);
        }
    }
}

/// Rooms keyed by room id, plus the room each connection belongs to
pub struct SessionRegistry {
    table: Arc<CompoundWordTable>,
    rules: Rules,
    rooms: DashMap<String, Room>,
    memberships: DashMap<Uuid, String>,
}

impl SessionRegistry {
    pub fn new(table: Arc<CompoundWordTable>, rules: Rules) -> Self {
        Self {
            table,
            rules,
            rooms: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Private rooms are keyed by the connection; named rooms are shared
    pub fn room_id_for(connection: Uuid, room_code: Option<&str>) -> String {
        match room_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => format!("room:{}", code.to_uppercase()),
            None => format!("solo:{}", connection),
        }
    }

    /// Seat a connection in a room, leaving any room it was already in.
    /// A rejected join leaves the current seat untouched.
    pub fn join(
        &self,
        connection: Uuid,
        player_name: &str,
        room_code: Option<&str>,
        tx: mpsc::Sender<ServerMessage>,
    ) -> Result<Vec<Outbound>, SessionError> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let room_id = Self::room_id_for(connection, room_code);
        let current = self
            .memberships
            .get(&connection)
            .map(|entry| entry.value().clone());

        let mut outbound = Vec::new();
        if current.as_deref() == Some(room_id.as_str()) {
            // Rejoining the same room reseats the player, which a running game forbids
            if self.rooms.get(&room_id).is_some_and(|room| room.game.is_started()) {
                return Err(SessionError::GameAlreadyStarted);
            }
            outbound.extend(self.leave(connection));
        }

        let room_state = {
            let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
                tracing::info!("Created room {}", room_id);
                Room::new(room_id.clone(), Game::new(self.table.clone(), self.rules))
            });

            if !room.game.add_player(&connection.to_string(), player_name) {
                return Err(SessionError::GameAlreadyStarted);
            }
            room.members.insert(connection, tx.clone());
            room.state_for_members()
        };

        // Only give up the old seat once the new one is secured
        if current.is_some_and(|old| old != room_id) {
            outbound.extend(self.leave(connection));
        }

        self.memberships.insert(connection, room_id.clone());
        tracing::info!("{} ({}) joined room {}", player_name, connection, room_id);

        outbound.push(Outbound::reply(
            tx,
            ServerMessage::Joined {
                id: connection.to_string(),
            },
        ));
        outbound.extend(room_state);

        Ok(outbound)
    }

    /// Remove a connection from its room; empty rooms are dropped
    pub fn leave(&self, connection: Uuid) -> Vec<Outbound> {
        let Some((_, room_id)) = self.memberships.remove(&connection) else {
            return Vec::new();
        };

        let (outbound, now_empty) = match self.rooms.get_mut(&room_id) {
            Some(mut room) => {
                room.game.remove_player(&connection.to_string());
                room.members.remove(&connection);
                (room.state_for_members(), room.members.is_empty())
            }
            None => (Vec::new(), false),
        };

        if now_empty {
            if let Some((_, room)) = self.rooms.remove_if(&room_id, |_, room| room.members.is_empty()) {
                let lifetime = Utc::now() - room.created_at;
                tracing::info!(
                    "Removed empty room {} after {}s",
                    room_id,
                    lifetime.num_seconds()
                );
            }
        }

        outbound
    }

    /// Run `f` against the connection's room while holding its lock
    pub fn with_room<T>(&self, connection: Uuid, f: impl FnOnce(&mut Room) -> T) -> Result<T, SessionError> {
        let room_id = self
            .memberships
            .get(&connection)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::NotJoined)?;
        let mut room = self.rooms.get_mut(&room_id).ok_or(SessionError::NotJoined)?;
        Ok(f(room.value_mut()))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.memberships.len()
    }
}
