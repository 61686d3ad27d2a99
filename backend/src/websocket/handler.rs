use crate::{
    session::Outbound,
    websocket::messages::{ClientMessage, ServerMessage},
    AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// WebSocket upgrade handler
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);

    tracing::info!("WebSocket connection established: {}", connection);

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from the client
    let state_for_recv = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        if let Err(e) =
                            handle_client_message(client_msg, &state_for_recv, &tx, connection).await
                        {
                            tracing::warn!("Error handling message from {}: {}", connection, e);
                            let error_msg = ServerMessage::Error {
                                message: e.to_string(),
                            };
                            let _ = tx.send(error_msg).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse message: {}", e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        };
                        let _ = tx.send(error_msg).await;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Client disconnected: {}", connection);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    // Tear down the session and tell the rest of the room
    Outbound::deliver(state.sessions.leave(connection)).await;

    tracing::info!("WebSocket connection closed: {}", connection);
}

/// Handle individual client messages
async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    tx: &mpsc::Sender<ServerMessage>,
    connection: Uuid,
) -> anyhow::Result<()> {
    let routed = match msg {
        ClientMessage::Join { player_name, room } => {
            tracing::info!("{} joining as {:?} (room: {:?})", connection, player_name, room);
            let outbound = state
                .sessions
                .join(connection, &player_name, room.as_deref(), tx.clone())?;
            Outbound::deliver(outbound).await;
            return Ok(());
        }
        ClientMessage::Start => state.sessions.with_room(connection, |room| room.start()),
        ClientMessage::PlayTurn { cards_to_form } => state
            .sessions
            .with_room(connection, |room| room.play_turn(connection, &cards_to_form)),
        ClientMessage::DrawCard => state
            .sessions
            .with_room(connection, |room| room.draw_card(connection)),
    };

    match routed {
        Ok(outbound) => Outbound::deliver(outbound).await,
        // Game actions before joining are dropped
        Err(e) => tracing::debug!("Ignoring message from {}: {}", connection, e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{app, config::Config, AppState};
    use futures::{SinkExt, Stream, StreamExt};
    use serde_json::Value;
    use std::{net::SocketAddr, sync::Arc};
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    async fn spawn_server() -> SocketAddr {
        let state = Arc::new(AppState::with_builtin_table(Config::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        addr
    }

    async fn next_json<S>(ws: &mut S) -> Value
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        loop {
            let msg = ws.next().await.unwrap().unwrap();
            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    fn text(json: &str) -> Message {
        Message::Text(json.into())
    }

    #[tokio::test]
    async fn test_solo_game_over_websocket() {
        let addr = spawn_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();

        ws.send(text(r#"{"type":"join","playerName":"Alice"}"#)).await.unwrap();
        let joined = next_json(&mut ws).await;
        assert_eq!(joined["type"], "joined");
        let my_id = joined["id"].as_str().unwrap().to_string();

        let state = next_json(&mut ws).await;
        assert_eq!(state["type"], "game-state");
        assert_eq!(state["started"], false);
        assert_eq!(state["players"][0]["id"], my_id.as_str());

        ws.send(text(r#"{"type":"start"}"#)).await.unwrap();
        let state = next_json(&mut ws).await;
        assert_eq!(state["started"], true);
        let hand = state["players"][0]["hand"].as_array().unwrap();
        assert_eq!(hand.len(), 5);

        ws.send(text(r#"{"type":"play-turn","cardsToForm":["bogus-1","bogus-2"]}"#))
            .await
            .unwrap();
        let state = next_json(&mut ws).await;
        assert_eq!(state["type"], "game-state");
        let result = next_json(&mut ws).await;
        assert_eq!(result["type"], "turn-result");
        assert_eq!(result["error"], "No compound word found");

        ws.send(text(r#"{"type":"draw-card"}"#)).await.unwrap();
        let state = next_json(&mut ws).await;
        assert_eq!(state["players"][0]["handCount"], 6);
        let result = next_json(&mut ws).await;
        assert_eq!(result["type"], "draw-result");
        assert!(result["card"]["id"].is_string());
    }

    #[tokio::test]
    async fn test_shared_room_over_websocket() {
        let addr = spawn_server().await;
        let url = format!("ws://{}/ws", addr);
        let (mut alice, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        let (mut bob, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

        alice
            .send(text(r#"{"type":"join","playerName":"Alice","room":"table1"}"#))
            .await
            .unwrap();
        assert_eq!(next_json(&mut alice).await["type"], "joined");
        assert_eq!(next_json(&mut alice).await["players"].as_array().unwrap().len(), 1);

        bob.send(text(r#"{"type":"join","playerName":"Bob","room":"TABLE1"}"#))
            .await
            .unwrap();
        assert_eq!(next_json(&mut bob).await["type"], "joined");
        assert_eq!(next_json(&mut bob).await["players"].as_array().unwrap().len(), 2);
        assert_eq!(next_json(&mut alice).await["players"].as_array().unwrap().len(), 2);

        alice.send(text(r#"{"type":"start"}"#)).await.unwrap();
        let alice_view = next_json(&mut alice).await;
        let bob_view = next_json(&mut bob).await;
        assert!(alice_view["players"][0]["hand"].is_array());
        assert!(alice_view["players"][1].get("hand").is_none());
        assert!(bob_view["players"][0].get("hand").is_none());
        assert!(bob_view["players"][1]["hand"].is_array());

        bob.send(text(r#"{"type":"draw-card"}"#)).await.unwrap();
        assert_eq!(next_json(&mut bob).await["type"], "game-state");
        let result = next_json(&mut bob).await;
        assert_eq!(result["error"], "Not your turn");
        assert_eq!(next_json(&mut alice).await["type"], "game-state");

        bob.close(None).await.unwrap();
        let after_leave = next_json(&mut alice).await;
        assert_eq!(after_leave["players"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_message_gets_error() {
        let addr = spawn_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();

        ws.send(text("not json")).await.unwrap();
        let reply = next_json(&mut ws).await;
        assert_eq!(reply["type"], "error");
        assert!(reply["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid message format"));

        ws.send(text(r#"{"type":"join","playerName":"  "}"#)).await.unwrap();
        let reply = next_json(&mut ws).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["message"], "Please enter your name");
    }
}
