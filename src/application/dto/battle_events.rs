//! Battle events - the append-only stream of UI cues and state changes the
//! engine broadcasts while a battle runs

use serde::Serialize;

use crate::application::dto::BattleView;
use crate::domain::entities::{LogEntry, WarriorOption};
use crate::domain::value_objects::{AnimationCue, GamePhase, Side};

/// Which acquisition call a loading flag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingKind {
    WarriorOptions,
    Artwork,
}

/// One event on the engine-to-view stream.
///
/// Animation events carry a duration and auto-clear client-side; the engine
/// never sends a matching "stop" event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    Snapshot { state: BattleView },
    PhaseChanged { phase: GamePhase },
    Loading { what: LoadingKind, active: bool },
    OptionsReady { options: Vec<WarriorOption> },
    LogAppended { entry: LogEntry },
    HealthChanged { side: Side, hp: u32, max_hp: u32 },
    DiceRolled { value: u32 },
    CountdownTick { remaining: u32 },
    Animation { side: Side, cue: AnimationCue, duration_ms: u64 },
    Flash { duration_ms: u64 },
    VolumeChanged { volume: u8 },
    Error { code: String, message: String },
}
