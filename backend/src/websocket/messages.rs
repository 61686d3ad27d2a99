use serde::{Deserialize, Serialize};

use crate::{
    game::GameError,
    models::{Card, PublicState},
};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        player_name: String,
        /// Shared room code; omitted for a private game
        #[serde(default)]
        room: Option<String>,
    },
    Start,
    PlayTurn {
        cards_to_form: Vec<String>,
    },
    DrawCard,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Joined {
        id: String,
    },
    GameState(PublicState),
    TurnResult(TurnResult),
    DrawResult(DrawResult),
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnResult {
    Success { success: bool, compound: String },
    Failure { error: String },
}

impl From<Result<String, GameError>> for TurnResult {
    fn from(result: Result<String, GameError>) -> Self {
        match result {
            Ok(compound) => TurnResult::Success {
                success: true,
                compound,
            },
            Err(e) => TurnResult::Failure {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrawResult {
    Drawn { card: Card },
    Failure { error: String },
}

impl From<Result<Card, GameError>> for DrawResult {
    fn from(result: Result<Card, GameError>) -> Self {
        match result {
            Ok(card) => DrawResult::Drawn { card },
            Err(e) => DrawResult::Failure {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_client_messages() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join","playerName":"Alice"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join { ref player_name, room: None } if player_name == "Alice"));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join","playerName":"Bob","room":"abc"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join { room: Some(ref r), .. } if r == "abc"));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"play-turn","cardsToForm":["sun-0","flower-1"]}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PlayTurn { ref cards_to_form } if cards_to_form.len() == 2));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"draw-card"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::DrawCard));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Start));
    }

    #[test]
    fn test_unknown_client_message_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"cheat"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join"}"#).is_err());
    }

    #[test]
    fn test_turn_result_payloads() {
        let ok = serde_json::to_value(ServerMessage::TurnResult(TurnResult::from(Ok(
            "sunflower".to_string(),
        ))))
        .unwrap();
        assert_eq!(
            ok,
            json!({"type": "turn-result", "success": true, "compound": "sunflower"})
        );

        let err = serde_json::to_value(ServerMessage::TurnResult(TurnResult::from(Err(
            GameError::NotYourTurn,
        ))))
        .unwrap();
        assert_eq!(err, json!({"type": "turn-result", "error": "Not your turn"}));
    }

    #[test]
    fn test_draw_result_payloads() {
        let card = Card {
            part: "sun".to_string(),
            id: "sun-0".to_string(),
        };
        let drawn = serde_json::to_value(ServerMessage::DrawResult(DrawResult::from(Ok(card)))).unwrap();
        assert_eq!(
            drawn,
            json!({"type": "draw-result", "card": {"part": "sun", "id": "sun-0"}})
        );

        let empty =
            serde_json::to_value(ServerMessage::DrawResult(DrawResult::from(Err(GameError::DeckEmpty))))
                .unwrap();
        assert_eq!(empty, json!({"type": "draw-result", "error": "Deck is empty"}));
    }

    #[test]
    fn test_joined_payload() {
        let value = serde_json::to_value(ServerMessage::Joined {
            id: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "joined", "id": "abc"}));
    }
}
