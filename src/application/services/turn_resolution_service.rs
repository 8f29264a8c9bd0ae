//! Turn resolution - one full exchange of player action and enemy
//! retaliation
//!
//! The original choreography was a pyramid of chained UI timers. Here it is
//! a single awaited sequence: every pause is a named delay in
//! [`TurnTimings`], slept through the [`Clock`] port so tests resolve a
//! turn instantly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};

use crate::application::dto::BattleEvent;
use crate::application::ports::outbound::{Clock, OutcomeProviderPort, TurnOutcome};
use crate::application::services::BattleError;
use crate::domain::entities::{BattleState, Character, LogKind};
use crate::domain::value_objects::{
    enemy_hit_weight, player_hit_weight, AnimationCue, Side,
};

/// Named delays for the turn choreography. Values mirror the pacing of the
/// original presentation: 1.5 s of dice rattling, 300 ms lunges, a 2 s beat
/// before retaliation so the narrative stays readable.
#[derive(Debug, Clone)]
pub struct TurnTimings {
    /// Dice rattle shown between choosing an action and the roll landing.
    pub roll_display: Duration,
    /// Lunge animation length for either side.
    pub lunge: Duration,
    /// Beat between the player's lunge and the hit landing.
    pub pre_hit: Duration,
    /// Shake animation length on a landed hit.
    pub shake: Duration,
    /// Full-screen flash length on a heavy hit.
    pub flash: Duration,
    /// Pause before the victory screen.
    pub victory_delay: Duration,
    /// Pause before the enemy retaliates.
    pub retaliation_delay: Duration,
    /// Beat between the enemy's lunge and its hit landing.
    pub strike_delay: Duration,
    /// Round timer tick interval.
    pub countdown_tick: Duration,
}

impl Default for TurnTimings {
    fn default() -> Self {
        Self {
            roll_display: Duration::from_millis(1500),
            lunge: Duration::from_millis(300),
            pre_hit: Duration::from_millis(300),
            shake: Duration::from_millis(500),
            flash: Duration::from_millis(300),
            victory_delay: Duration::from_millis(1000),
            retaliation_delay: Duration::from_millis(2000),
            strike_delay: Duration::from_millis(300),
            countdown_tick: Duration::from_millis(1000),
        }
    }
}

/// Runs one turn per RollingDice -> Resolving transition.
pub struct TurnResolutionService<O: OutcomeProviderPort, C: Clock> {
    state: Arc<RwLock<BattleState>>,
    outcome: Arc<O>,
    clock: Arc<C>,
    timings: TurnTimings,
    events: broadcast::Sender<BattleEvent>,
}

impl<O, C> TurnResolutionService<O, C>
where
    O: OutcomeProviderPort,
    C: Clock,
{
    pub fn new(
        state: Arc<RwLock<BattleState>>,
        outcome: Arc<O>,
        clock: Arc<C>,
        timings: TurnTimings,
        events: broadcast::Sender<BattleEvent>,
    ) -> Self {
        Self {
            state,
            outcome,
            clock,
            timings,
            events,
        }
    }

    fn emit(&self, event: BattleEvent) {
        // Nobody listening is fine; the battle state is still authoritative.
        let _ = self.events.send(event);
    }

    fn emit_animation(&self, side: Side, cue: AnimationCue, length: Duration) {
        self.emit(BattleEvent::Animation {
            side,
            cue,
            duration_ms: length.as_millis() as u64,
        });
    }

    /// Resolve the turn for `action` and `roll`. The caller has already
    /// moved the battle into Resolving, so no competing trigger can run;
    /// `generation` identifies the session this turn was issued for, and a
    /// mismatch on any re-entry means a reset happened while we were
    /// suspended and the remaining effects must be dropped.
    pub async fn resolve_turn(
        &self,
        action: &str,
        roll: u32,
        generation: u64,
    ) -> Result<(), BattleError> {
        self.emit_animation(Side::Player, AnimationCue::LungeRight, self.timings.lunge);

        // Pre-turn snapshots. Win and loss are checked against these hp
        // values minus the outcome deltas, before the committed state is
        // re-read: evaluate-before-commit, exactly as the game always has.
        let (player_snap, enemy_snap, crit_threshold, dice_max) = {
            let state = self.state.read().await;
            (
                state.player.clone(),
                state.enemy.clone(),
                state.rules.crit_log_threshold,
                state.rules.dice_max,
            )
        };

        // The single suspension point of a turn.
        let outcome = self
            .fetch_outcome(&player_snap, &enemy_snap, action, roll, dice_max)
            .await;

        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                tracing::debug!("discarding stale turn outcome for generation {generation}");
                return Ok(());
            }
            let kind = if roll > crit_threshold || outcome.is_critical {
                LogKind::Critical
            } else {
                LogKind::Info
            };
            let entry = state
                .log
                .push(format!("Rolled {roll}: {}", outcome.narrative), kind);
            self.emit(BattleEvent::LogAppended { entry });

            if outcome.damage_to_enemy == 0 {
                let entry = state.log.push("Attack missed!", LogKind::Info);
                self.emit(BattleEvent::LogAppended { entry });
            }
        }

        if outcome.damage_to_enemy > 0 {
            self.clock.sleep(self.timings.pre_hit).await;
            let mut state = self.state.write().await;
            if state.generation != generation {
                return Ok(());
            }
            let weight = enemy_hit_weight(outcome.damage_to_enemy, outcome.is_critical);
            self.emit_animation(Side::Enemy, weight.cue(), self.timings.shake);
            if weight.triggers_flash() {
                self.emit(BattleEvent::Flash {
                    duration_ms: self.timings.flash.as_millis() as u64,
                });
            }
            let message = format!(
                "{} took {} dmg!",
                state.enemy.name, outcome.damage_to_enemy
            );
            let entry = state.log.push(message, LogKind::Damage);
            self.emit(BattleEvent::LogAppended { entry });
            state.enemy.apply_damage(outcome.damage_to_enemy);
            self.emit(BattleEvent::HealthChanged {
                side: Side::Enemy,
                hp: state.enemy.hp,
                max_hp: state.enemy.max_hp,
            });
        }

        // Win check against the pre-turn snapshot; evaluated before the
        // retaliation step so a one-sided kill skips it entirely.
        if outcome.damage_to_enemy >= enemy_snap.hp {
            self.clock.sleep(self.timings.victory_delay).await;
            let mut state = self.state.write().await;
            if state.generation != generation {
                return Ok(());
            }
            state.finish_victory()?;
            let entry = state
                .log
                .push("Victory! The beast is slain.", LogKind::Critical);
            self.emit(BattleEvent::LogAppended { entry });
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
            tracing::info!(battle = %state.id, "battle won on roll {roll}");
            return Ok(());
        }

        // Enemy retaliation.
        self.clock.sleep(self.timings.retaliation_delay).await;
        self.emit_animation(Side::Enemy, AnimationCue::LungeLeft, self.timings.lunge);
        self.clock.sleep(self.timings.strike_delay).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            return Ok(());
        }
        if outcome.damage_to_player > 0 {
            let weight = player_hit_weight(outcome.damage_to_player);
            self.emit_animation(Side::Player, weight.cue(), self.timings.shake);
            if weight.triggers_flash() {
                self.emit(BattleEvent::Flash {
                    duration_ms: self.timings.flash.as_millis() as u64,
                });
            }
            let message = format!(
                "{} used {}! Took {} dmg.",
                state.enemy.name, outcome.enemy_action_name, outcome.damage_to_player
            );
            let entry = state.log.push(message, LogKind::Damage);
            self.emit(BattleEvent::LogAppended { entry });
            state.player.apply_damage(outcome.damage_to_player);
            self.emit(BattleEvent::HealthChanged {
                side: Side::Player,
                hp: state.player.hp,
                max_hp: state.player.max_hp,
            });
        } else {
            let message = format!("{} attacked but missed!", state.enemy.name);
            let entry = state.log.push(message, LogKind::Info);
            self.emit(BattleEvent::LogAppended { entry });
        }

        // Loss check mirrors the win check on the pre-turn player snapshot.
        if outcome.damage_to_player >= player_snap.hp {
            state.finish_game_over()?;
            let entry = state
                .log
                .push("Defeat... You blacked out.", LogKind::Damage);
            self.emit(BattleEvent::LogAppended { entry });
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
            tracing::info!(battle = %state.id, "battle lost");
        } else {
            state.return_to_input()?;
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
            self.emit(BattleEvent::CountdownTick {
                remaining: state.countdown,
            });
        }
        Ok(())
    }

    /// One bounded retry, then the deterministic missed exchange. A failed
    /// provider never leaves the battle stuck in Resolving.
    async fn fetch_outcome(
        &self,
        player: &Character,
        enemy: &Character,
        action: &str,
        roll: u32,
        dice_max: u32,
    ) -> TurnOutcome {
        match self
            .outcome
            .generate_turn_outcome(player, enemy, action, roll, dice_max)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("outcome provider failed, retrying once: {e}");
                match self
                    .outcome
                    .generate_turn_outcome(player, enemy, action, roll, dice_max)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(
                            "outcome provider failed twice, falling back to a missed exchange: {e}"
                        );
                        TurnOutcome::missed_exchange()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::domain::entities::{BattleRules, WarriorOption};
    use crate::domain::value_objects::GamePhase;

    struct InstantClock;

    #[async_trait]
    impl Clock for InstantClock {
        async fn sleep(&self, _duration: Duration) {}
    }

    /// Provider returning a fixed outcome, optionally failing a number of
    /// times first.
    struct ScriptedProvider {
        outcome: TurnOutcome,
        failures: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(outcome: TurnOutcome) -> Self {
            Self {
                outcome,
                failures: AtomicU32::new(0),
            }
        }

        fn failing(outcome: TurnOutcome, failures: u32) -> Self {
            Self {
                outcome,
                failures: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl OutcomeProviderPort for ScriptedProvider {
        type Error = std::io::Error;

        async fn generate_turn_outcome(
            &self,
            _player: &Character,
            _enemy: &Character,
            _action: &str,
            _roll: u32,
            _dice_max: u32,
        ) -> Result<TurnOutcome, Self::Error> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "provider down",
                ));
            }
            Ok(self.outcome.clone())
        }
    }

    fn resolving_state() -> Arc<RwLock<BattleState>> {
        let mut state = BattleState::new(BattleRules::default());
        state.begin_option_generation().unwrap();
        state
            .present_options(vec![WarriorOption::new("Kaela", "Berserker", "Twin axes")])
            .unwrap();
        let option = state.warrior_options[0].clone();
        state.begin_image_loading(&option).unwrap();
        let enemy = Character::new("Emberfang", 150, 8);
        state.enter_battle(String::new(), enemy).unwrap();
        state.begin_roll("Attack").unwrap();
        state.begin_resolving(10).unwrap();
        Arc::new(RwLock::new(state))
    }

    fn service(
        state: Arc<RwLock<BattleState>>,
        provider: ScriptedProvider,
    ) -> (
        TurnResolutionService<ScriptedProvider, InstantClock>,
        broadcast::Receiver<BattleEvent>,
    ) {
        let (tx, rx) = broadcast::channel(256);
        let service = TurnResolutionService::new(
            state,
            Arc::new(provider),
            Arc::new(InstantClock),
            TurnTimings::default(),
            tx,
        );
        (service, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<BattleEvent>) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn outcome(damage_to_enemy: u32, damage_to_player: u32, is_critical: bool) -> TurnOutcome {
        TurnOutcome {
            narrative: "Steel rings against scale.".to_string(),
            damage_to_enemy,
            damage_to_player,
            is_critical,
            enemy_action_name: "Tail Sweep".to_string(),
        }
    }

    #[tokio::test]
    async fn defensive_turn_takes_heavy_damage() {
        // Player at 100/100 takes 25 while defending: hp 75, heavy shake,
        // flash.
        let state = resolving_state();
        let (service, mut rx) = service(state.clone(), ScriptedProvider::new(outcome(5, 25, false)));

        service.resolve_turn("Defend", 10, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.player.hp, 75);
        assert_eq!(st.phase, GamePhase::PlayerInput);
        assert_eq!(st.countdown, 30, "round timer rearmed");

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            BattleEvent::Animation {
                side: Side::Player,
                cue: AnimationCue::HeavyShake,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, BattleEvent::Flash { .. })));
    }

    #[tokio::test]
    async fn lethal_hit_skips_retaliation() {
        // Enemy at 10/150 dealt 15: clamps to 0, Victory, no retaliation.
        let state = resolving_state();
        state.write().await.enemy.hp = 10;
        let (service, mut rx) =
            service(state.clone(), ScriptedProvider::new(outcome(15, 40, false)));

        service.resolve_turn("Attack", 18, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.enemy.hp, 0);
        assert_eq!(st.player.hp, 100, "retaliation never ran");
        assert_eq!(st.phase, GamePhase::Victory);
        assert!(!st
            .log
            .entries()
            .iter()
            .any(|e| e.text.contains("Tail Sweep")));

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            BattleEvent::PhaseChanged {
                phase: GamePhase::Victory
            }
        )));
    }

    #[tokio::test]
    async fn lethal_retaliation_ends_the_game() {
        let state = resolving_state();
        state.write().await.player.hp = 20;
        let (service, _rx) = service(state.clone(), ScriptedProvider::new(outcome(5, 20, false)));

        service.resolve_turn("Attack", 4, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.player.hp, 0);
        assert_eq!(st.phase, GamePhase::GameOver);
        assert!(st
            .log
            .entries()
            .iter()
            .any(|e| e.text.contains("Defeat")));
    }

    #[tokio::test]
    async fn high_roll_logs_critical() {
        let state = resolving_state();
        let (service, _rx) = service(state.clone(), ScriptedProvider::new(outcome(8, 0, false)));

        service.resolve_turn("Attack", 16, 0).await.unwrap();

        let st = state.read().await;
        let narrative = &st.log.entries()[0];
        assert_eq!(narrative.kind, LogKind::Critical);
        assert!(narrative.text.starts_with("Rolled 16:"));
    }

    #[tokio::test]
    async fn provider_crit_flag_also_logs_critical() {
        let state = resolving_state();
        let (service, _rx) = service(state.clone(), ScriptedProvider::new(outcome(8, 0, true)));

        service.resolve_turn("Attack", 3, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.log.entries()[0].kind, LogKind::Critical);
    }

    #[tokio::test]
    async fn zero_damage_logs_a_miss_and_leaves_health_alone() {
        let state = resolving_state();
        let (service, _rx) = service(state.clone(), ScriptedProvider::new(outcome(0, 0, false)));

        service.resolve_turn("Attack", 2, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.enemy.hp, 150);
        assert_eq!(st.player.hp, 100);
        let texts: Vec<_> = st.log.entries().iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Attack missed!"));
        assert!(texts.iter().any(|t| t.contains("attacked but missed")));
        assert_eq!(st.phase, GamePhase::PlayerInput);
    }

    #[tokio::test]
    async fn provider_recovers_after_one_retry() {
        let state = resolving_state();
        let (service, _rx) = service(
            state.clone(),
            ScriptedProvider::failing(outcome(12, 0, false), 1),
        );

        service.resolve_turn("Attack", 11, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.enemy.hp, 138, "retried outcome applied");
    }

    #[tokio::test]
    async fn provider_down_falls_back_to_missed_exchange() {
        let state = resolving_state();
        let (service, _rx) = service(
            state.clone(),
            ScriptedProvider::failing(outcome(99, 99, true), 2),
        );

        service.resolve_turn("Attack", 11, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.enemy.hp, 150);
        assert_eq!(st.player.hp, 100);
        assert_eq!(st.phase, GamePhase::PlayerInput, "battle carries on");
    }

    #[tokio::test]
    async fn stale_generation_never_mutates_state() {
        let state = resolving_state();
        let (service, _rx) = service(state.clone(), ScriptedProvider::new(outcome(30, 30, true)));

        // Turn issued under generation 3; the battle has since been reset.
        service.resolve_turn("Attack", 19, 3).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.enemy.hp, 150);
        assert_eq!(st.player.hp, 100);
        assert!(st.log.is_empty());
        assert_eq!(st.phase, GamePhase::Resolving, "state untouched");
    }

    #[tokio::test]
    async fn exactly_one_terminal_outcome_per_turn() {
        // Both sides would die on paper; victory is evaluated first and
        // retaliation is skipped.
        let state = resolving_state();
        {
            let mut st = state.write().await;
            st.enemy.hp = 5;
            st.player.hp = 5;
        }
        let (service, _rx) = service(state.clone(), ScriptedProvider::new(outcome(10, 10, false)));

        service.resolve_turn("Attack", 20, 0).await.unwrap();

        let st = state.read().await;
        assert_eq!(st.phase, GamePhase::Victory);
        assert_eq!(st.player.hp, 5, "no retaliation damage after the kill");
    }
}
