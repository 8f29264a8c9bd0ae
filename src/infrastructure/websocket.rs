//! WebSocket handler for the battle view
//!
//! Each connection gets its own battle: the view subscribes to the battle's
//! event stream and sends back one trigger per phase transition. Commands
//! are dispatched on their own tasks so a multi-second turn resolution
//! never blocks the read loop; the phase guards reject anything that
//! arrives out of turn.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::application::dto::BattleEvent;
use crate::domain::value_objects::WarriorOptionId;
use crate::infrastructure::state::{AppState, EngineBattle};

/// One trigger per phase transition, plus the volume preference.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Start,
    SelectWarrior { option_id: WarriorOptionId },
    Act { action: String },
    Reset,
    SetVolume { volume: u8 },
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let battle = state.new_battle();
    let mut events = battle.subscribe();

    // Channel carrying everything destined for this client.
    let (tx, mut rx) = mpsc::unbounded_channel::<BattleEvent>();

    tracing::info!("new battle connection established");

    // Forward the battle's broadcast stream into the client channel.
    let bridge_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        })
    };

    // Serialize and push everything to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Round timer lives and dies with the connection.
    let timer_task = {
        let battle = battle.clone();
        tokio::spawn(async move {
            battle.run_round_timer().await;
        })
    };

    // Initial snapshot so the view can render immediately.
    let _ = tx.send(BattleEvent::Snapshot {
        state: battle.snapshot().await,
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    let battle = battle.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        dispatch(&battle, msg, &tx).await;
                    });
                }
                Err(e) => {
                    tracing::warn!("failed to parse message: {e}");
                    let error = BattleEvent::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: format!("Invalid message format: {e}"),
                    };
                    if tx.send(error).is_err() {
                        break;
                    }
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!("battle connection closed by client");
                break;
            }
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
            _ => {}
        }
    }

    timer_task.abort();
    bridge_task.abort();
    send_task.abort();

    tracing::info!("battle connection terminated");
}

async fn dispatch(
    battle: &EngineBattle,
    msg: ClientMessage,
    tx: &mpsc::UnboundedSender<BattleEvent>,
) {
    let result = match msg {
        ClientMessage::Start => battle.begin_selection().await,
        ClientMessage::SelectWarrior { option_id } => battle.select_warrior(option_id).await,
        ClientMessage::Act { action } => battle.submit_action(action).await,
        ClientMessage::Reset => battle.reset().await,
        ClientMessage::SetVolume { volume } => {
            battle.set_volume(volume).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!("command rejected: {e}");
        let _ = tx.send(BattleEvent::Error {
            code: e.code().to_string(),
            message: e.to_string(),
        });
    }
}
