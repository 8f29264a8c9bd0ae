//! Game phase - the discrete mode governing which UI and inputs are active

use serde::{Deserialize, Serialize};

/// The phases a battle moves through, from the start menu to a terminal
/// victory or defeat screen.
///
/// Legal transitions:
///
/// ```text
/// StartMenu -> SelectCharacter -> PlayerInput <-> RollingDice -> Resolving
/// Resolving -> PlayerInput | Victory | GameOver
/// Victory | GameOver -> StartMenu (explicit reset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    StartMenu,
    SelectCharacter,
    PlayerInput,
    RollingDice,
    Resolving,
    Victory,
    GameOver,
}

impl GamePhase {
    /// Player action affordances are only live while awaiting input.
    pub fn accepts_action(&self) -> bool {
        matches!(self, Self::PlayerInput)
    }

    /// Terminal phases stay put until an explicit reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Victory | Self::GameOver)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StartMenu => "START_MENU",
            Self::SelectCharacter => "SELECT_CHARACTER",
            Self::PlayerInput => "PLAYER_INPUT",
            Self::RollingDice => "ROLLING_DICE",
            Self::Resolving => "RESOLVING",
            Self::Victory => "VICTORY",
            Self::GameOver => "GAME_OVER",
        };
        write!(f, "{}", name)
    }
}

/// A rejected phase transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("trigger not accepted in phase {actual}, expected {expected}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error("a generation call is already pending in phase {0}")]
    GenerationPending(GamePhase),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_player_input_accepts_actions() {
        assert!(GamePhase::PlayerInput.accepts_action());
        for phase in [
            GamePhase::StartMenu,
            GamePhase::SelectCharacter,
            GamePhase::RollingDice,
            GamePhase::Resolving,
            GamePhase::Victory,
            GamePhase::GameOver,
        ] {
            assert!(!phase.accepts_action(), "{phase} should reject actions");
        }
    }

    #[test]
    fn terminal_phases() {
        assert!(GamePhase::Victory.is_terminal());
        assert!(GamePhase::GameOver.is_terminal());
        assert!(!GamePhase::Resolving.is_terminal());
    }
}
