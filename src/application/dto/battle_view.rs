//! Full battle snapshot sent to a client on connect and at phase boundaries

use serde::Serialize;

use crate::domain::entities::{BattleState, Character, LogEntry, WarriorOption};
use crate::domain::value_objects::{BattleId, GamePhase};

/// Everything the view needs to render the current phase.
#[derive(Debug, Clone, Serialize)]
pub struct BattleView {
    pub battle_id: BattleId,
    pub phase: GamePhase,
    pub player: Character,
    pub enemy: Character,
    pub log: Vec<LogEntry>,
    pub warrior_options: Vec<WarriorOption>,
    pub dice_value: u32,
    pub countdown: u32,
    pub volume: u8,
    pub generating_options: bool,
    pub loading_images: bool,
}

impl From<&BattleState> for BattleView {
    fn from(state: &BattleState) -> Self {
        Self {
            battle_id: state.id,
            phase: state.phase,
            player: state.player.clone(),
            enemy: state.enemy.clone(),
            log: state.log.entries().to_vec(),
            warrior_options: state.warrior_options.clone(),
            dice_value: state.dice_value,
            countdown: state.countdown,
            volume: state.volume,
            generating_options: state.generating_options,
            loading_images: state.loading_images,
        }
    }
}
