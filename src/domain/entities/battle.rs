//! Battle state - one explicit snapshot of the whole game plus guarded
//! transition methods
//!
//! All phase changes go through the methods here and return `PhaseError`
//! when a trigger arrives in the wrong phase. That keeps the state machine
//! independently testable and makes "only one trigger per phase entry"
//! enforceable in one place rather than scattered across handlers.

use crate::domain::entities::{Character, CombatLog, WarriorOption};
use crate::domain::value_objects::{BattleId, GamePhase, PhaseError};

/// Tuning knobs for a battle. Defaults match the classic setup: a level 5
/// hero at 100 hp against a level 8 boss at 150 hp, 30 second rounds, d20.
#[derive(Debug, Clone)]
pub struct BattleRules {
    pub player_max_hp: u32,
    pub player_level: u32,
    pub enemy_max_hp: u32,
    pub enemy_level: u32,
    /// Round timer ticks armed on each entry to PlayerInput.
    pub round_ticks: u32,
    /// Highest face of the die.
    pub dice_max: u32,
    /// Rolls strictly above this are logged as critical.
    pub crit_log_threshold: u32,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            player_max_hp: 100,
            player_level: 5,
            enemy_max_hp: 150,
            enemy_level: 8,
            round_ticks: 30,
            dice_max: 20,
            crit_log_threshold: 15,
        }
    }
}

/// The complete state of one battle session.
#[derive(Debug, Clone)]
pub struct BattleState {
    pub id: BattleId,
    pub rules: BattleRules,
    pub phase: GamePhase,
    pub player: Character,
    pub enemy: Character,
    pub log: CombatLog,
    pub warrior_options: Vec<WarriorOption>,
    pub selected_action: Option<String>,
    pub dice_value: u32,
    pub countdown: u32,
    /// Volume preference, 0..=100. Stored and echoed back, no gameplay
    /// effect.
    pub volume: u8,
    /// Warrior option batch is being generated (StartMenu sub-state).
    pub generating_options: bool,
    /// Identity/artwork generation in flight (SelectCharacter sub-state).
    pub loading_images: bool,
    /// Bumped on every reset. Async completions carry the generation they
    /// were issued under and are discarded when it no longer matches, so a
    /// stale provider response can never mutate a newer session.
    pub generation: u64,
}

impl BattleState {
    pub fn new(rules: BattleRules) -> Self {
        let player = Character::new("Hero", rules.player_max_hp, rules.player_level)
            .with_class("Warrior");
        let enemy = Character::new("Dragon", rules.enemy_max_hp, rules.enemy_level);
        let dice_value = rules.dice_max;
        let countdown = rules.round_ticks;
        Self {
            id: BattleId::new(),
            rules,
            phase: GamePhase::StartMenu,
            player,
            enemy,
            log: CombatLog::new(),
            warrior_options: Vec::new(),
            selected_action: None,
            dice_value,
            countdown,
            volume: 50,
            generating_options: false,
            loading_images: false,
            generation: 0,
        }
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<(), PhaseError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PhaseError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// "Press start": begin generating the selectable warrior batch. The
    /// trigger is disabled while a batch is already pending.
    pub fn begin_option_generation(&mut self) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::StartMenu)?;
        if self.generating_options {
            return Err(PhaseError::GenerationPending(self.phase));
        }
        self.generating_options = true;
        Ok(())
    }

    /// Option generation failed; fall back to an idle start menu.
    pub fn option_generation_failed(&mut self) {
        self.generating_options = false;
    }

    /// Present a freshly generated batch and move to character selection.
    pub fn present_options(&mut self, options: Vec<WarriorOption>) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::StartMenu)?;
        self.warrior_options = options;
        self.generating_options = false;
        self.phase = GamePhase::SelectCharacter;
        Ok(())
    }

    /// A warrior was picked: lock selection, reset the hero to the chosen
    /// identity, and clear the previous battle's log while artwork and the
    /// enemy identity generate.
    pub fn begin_image_loading(&mut self, option: &WarriorOption) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::SelectCharacter)?;
        if self.loading_images {
            return Err(PhaseError::GenerationPending(self.phase));
        }
        self.loading_images = true;
        self.log.clear();
        self.player = Character::new(
            option.name.clone(),
            self.rules.player_max_hp,
            self.rules.player_level,
        )
        .with_class(option.class_type.clone());
        Ok(())
    }

    /// Identity/artwork acquisition failed; selection becomes available
    /// again.
    pub fn image_loading_failed(&mut self) {
        self.loading_images = false;
    }

    /// Everything is generated: consume the option batch, field the enemy,
    /// arm the round timer, and open the floor to the player.
    pub fn enter_battle(
        &mut self,
        player_image: String,
        enemy: Character,
    ) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::SelectCharacter)?;
        self.player.image = player_image;
        self.enemy = enemy;
        self.warrior_options.clear();
        self.loading_images = false;
        self.selected_action = None;
        self.countdown = self.rules.round_ticks;
        self.phase = GamePhase::PlayerInput;
        Ok(())
    }

    /// Player chose an action (or the timer forced one). Re-entrant
    /// triggers while the dice are already rolling bounce off the phase
    /// check.
    pub fn begin_roll(&mut self, action: impl Into<String>) -> Result<(), PhaseError> {
        if !self.phase.accepts_action() {
            return Err(PhaseError::WrongPhase {
                expected: GamePhase::PlayerInput,
                actual: self.phase,
            });
        }
        self.selected_action = Some(action.into());
        self.phase = GamePhase::RollingDice;
        Ok(())
    }

    /// The roll is drawn and shown; turn resolution starts.
    pub fn begin_resolving(&mut self, roll: u32) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::RollingDice)?;
        self.dice_value = roll;
        self.phase = GamePhase::Resolving;
        Ok(())
    }

    /// One round timer tick. Returns the remaining count, or `None` when
    /// the timer is not running (any phase but PlayerInput).
    pub fn tick_countdown(&mut self) -> Option<u32> {
        if self.phase != GamePhase::PlayerInput || self.countdown == 0 {
            return None;
        }
        self.countdown -= 1;
        Some(self.countdown)
    }

    /// Both combatants survived the exchange; rearm the timer and hand the
    /// turn back.
    pub fn return_to_input(&mut self) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::Resolving)?;
        self.countdown = self.rules.round_ticks;
        self.phase = GamePhase::PlayerInput;
        Ok(())
    }

    pub fn finish_victory(&mut self) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::Resolving)?;
        self.phase = GamePhase::Victory;
        Ok(())
    }

    pub fn finish_game_over(&mut self) -> Result<(), PhaseError> {
        self.expect_phase(GamePhase::Resolving)?;
        self.phase = GamePhase::GameOver;
        Ok(())
    }

    /// Explicit reset from a terminal phase back to the start menu.
    /// Invalidates cached artwork so the next playthrough regenerates it,
    /// clears the log, and bumps `generation` so any still-pending
    /// completion from the old session is discarded on arrival.
    pub fn reset(&mut self) -> Result<(), PhaseError> {
        if !self.phase.is_terminal() {
            return Err(PhaseError::WrongPhase {
                expected: GamePhase::Victory,
                actual: self.phase,
            });
        }
        self.generation += 1;
        self.phase = GamePhase::StartMenu;
        self.player = Character::new("Hero", self.rules.player_max_hp, self.rules.player_level)
            .with_class("Warrior");
        self.enemy = Character::new("Dragon", self.rules.enemy_max_hp, self.rules.enemy_level);
        self.log.clear();
        self.warrior_options.clear();
        self.selected_action = None;
        self.dice_value = self.rules.dice_max;
        self.countdown = self.rules.round_ticks;
        self.generating_options = false;
        self.loading_images = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LogKind;

    fn sample_option() -> WarriorOption {
        WarriorOption::new("Kaela", "Berserker", "Fights with twin axes")
    }

    fn battle_ready_state() -> BattleState {
        let mut state = BattleState::new(BattleRules::default());
        state.begin_option_generation().unwrap();
        state.present_options(vec![sample_option()]).unwrap();
        let option = state.warrior_options[0].clone();
        state.begin_image_loading(&option).unwrap();
        let enemy = Character::new("Emberfang", 150, 8).with_image("http://img/enemy.png");
        state
            .enter_battle("http://img/hero.png".to_string(), enemy)
            .unwrap();
        state
    }

    #[test]
    fn full_phase_walk() {
        let mut state = battle_ready_state();
        assert_eq!(state.phase, GamePhase::PlayerInput);
        assert_eq!(state.player.name, "Kaela");
        assert!(state.warrior_options.is_empty(), "batch is consumed");
        assert_eq!(state.countdown, 30);

        state.begin_roll("Attack").unwrap();
        assert_eq!(state.phase, GamePhase::RollingDice);
        state.begin_resolving(17).unwrap();
        assert_eq!(state.phase, GamePhase::Resolving);
        assert_eq!(state.dice_value, 17);

        state.return_to_input().unwrap();
        assert_eq!(state.phase, GamePhase::PlayerInput);
        assert_eq!(state.countdown, 30, "timer rearmed");
    }

    #[test]
    fn action_rejected_outside_player_input() {
        let mut state = battle_ready_state();
        state.begin_roll("Attack").unwrap();
        // Second trigger while rolling is a no-op error.
        let err = state.begin_roll("Defend").unwrap_err();
        assert!(matches!(err, PhaseError::WrongPhase { .. }));

        state.begin_resolving(9).unwrap();
        assert!(state.begin_roll("Defend").is_err());
    }

    #[test]
    fn begin_roll_accepts_exactly_where_the_phase_does() {
        let mut fresh = BattleState::new(BattleRules::default());
        assert!(!fresh.phase.accepts_action());
        assert!(fresh.begin_roll("Attack").is_err());

        let mut state = battle_ready_state();
        assert!(state.phase.accepts_action());
        state.begin_roll("Attack").unwrap();
        assert!(!state.phase.accepts_action());
        assert!(state.begin_roll("Attack").is_err());

        state.begin_resolving(20).unwrap();
        state.finish_victory().unwrap();
        assert!(!state.phase.accepts_action());
        assert!(state.begin_roll("Attack").is_err());
    }

    #[test]
    fn begin_trigger_disabled_while_generating() {
        let mut state = BattleState::new(BattleRules::default());
        state.begin_option_generation().unwrap();
        let err = state.begin_option_generation().unwrap_err();
        assert_eq!(err, PhaseError::GenerationPending(GamePhase::StartMenu));

        state.option_generation_failed();
        assert!(state.begin_option_generation().is_ok());
    }

    #[test]
    fn selection_blocked_while_loading_images() {
        let mut state = BattleState::new(BattleRules::default());
        state.begin_option_generation().unwrap();
        state
            .present_options(vec![sample_option(), sample_option()])
            .unwrap();
        let option = state.warrior_options[0].clone();
        state.begin_image_loading(&option).unwrap();
        let other = state.warrior_options[1].clone();
        assert!(state.begin_image_loading(&other).is_err());
    }

    #[test]
    fn countdown_ticks_only_in_player_input() {
        let mut state = battle_ready_state();
        assert_eq!(state.tick_countdown(), Some(29));
        assert_eq!(state.tick_countdown(), Some(28));

        state.begin_roll("Attack").unwrap();
        assert_eq!(state.tick_countdown(), None, "paused while rolling");
    }

    #[test]
    fn countdown_stops_at_zero() {
        let mut state = battle_ready_state();
        state.countdown = 1;
        assert_eq!(state.tick_countdown(), Some(0));
        assert_eq!(state.tick_countdown(), None);
    }

    #[test]
    fn reset_only_from_terminal_phases() {
        let mut state = battle_ready_state();
        assert!(state.reset().is_err());

        state.begin_roll("Attack").unwrap();
        state.begin_resolving(20).unwrap();
        state.finish_victory().unwrap();
        assert!(state.reset().is_ok());
        assert_eq!(state.phase, GamePhase::StartMenu);
    }

    #[test]
    fn reset_clears_log_artwork_and_bumps_generation() {
        let mut state = battle_ready_state();
        state.log.push("A wild Emberfang appeared!", LogKind::Info);
        state.begin_roll("Attack").unwrap();
        state.begin_resolving(3).unwrap();
        state.finish_game_over().unwrap();

        let before = state.generation;
        state.reset().unwrap();
        assert_eq!(state.generation, before + 1);
        assert!(state.log.is_empty());
        assert!(state.player.image.is_empty(), "artwork invalidated");
        assert!(state.enemy.image.is_empty());
        assert_eq!(state.player.hp, state.player.max_hp);
    }

    #[test]
    fn selecting_a_warrior_clears_previous_log() {
        let mut state = BattleState::new(BattleRules::default());
        state.log.push("stale line", LogKind::Info);
        state.begin_option_generation().unwrap();
        state.present_options(vec![sample_option()]).unwrap();
        let option = state.warrior_options[0].clone();
        state.begin_image_loading(&option).unwrap();
        assert!(state.log.is_empty());
    }
}
