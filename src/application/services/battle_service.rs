//! Battle service - phase orchestration for one battle session
//!
//! Owns the battle state and the acquisition boundary: warrior option
//! generation, identity/artwork generation with placeholder fallback, the
//! round timer, and dispatch into turn resolution. One instance serves one
//! connected client; the phase guards in [`BattleState`] serialize all
//! game-logic mutation, so no two turns or selections can run concurrently.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::{broadcast, RwLock};

use crate::application::dto::{BattleEvent, BattleView, LoadingKind};
use crate::application::ports::outbound::{CharacterGeneratorPort, Clock, OutcomeProviderPort};
use crate::application::services::{TurnResolutionService, TurnTimings};
use crate::domain::entities::{BattleRules, BattleState, Character, LogKind};
use crate::domain::value_objects::{
    AnimationCue, PhaseError, Side, WarriorOptionId,
};

/// Synthetic action submitted when the round timer expires.
const HESITATE_ACTION: &str = "Hesitate";
/// The forced roll that goes with it: an automatic worst case.
const HESITATE_ROLL: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("unknown warrior option: {0}")]
    UnknownOption(WarriorOptionId),
    #[error("generation failed: {0}")]
    Generation(String),
}

impl BattleError {
    /// Stable error code surfaced to the client.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Phase(_) => "PHASE_REJECTED",
            Self::UnknownOption(_) => "UNKNOWN_OPTION",
            Self::Generation(_) => "GENERATION_FAILED",
        }
    }
}

pub struct BattleService<O: OutcomeProviderPort, G: CharacterGeneratorPort, C: Clock> {
    state: Arc<RwLock<BattleState>>,
    generator: Arc<G>,
    clock: Arc<C>,
    turns: TurnResolutionService<O, C>,
    timings: TurnTimings,
    events: broadcast::Sender<BattleEvent>,
}

impl<O, G, C> BattleService<O, G, C>
where
    O: OutcomeProviderPort,
    G: CharacterGeneratorPort,
    C: Clock,
{
    pub fn new(
        outcome: Arc<O>,
        generator: Arc<G>,
        clock: Arc<C>,
        rules: BattleRules,
        timings: TurnTimings,
    ) -> Self {
        let state = Arc::new(RwLock::new(BattleState::new(rules)));
        let (events, _) = broadcast::channel(256);
        let turns = TurnResolutionService::new(
            state.clone(),
            outcome,
            clock.clone(),
            timings.clone(),
            events.clone(),
        );
        Self {
            state,
            generator,
            clock,
            turns,
            timings,
            events,
        }
    }

    /// Subscribe to the battle's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> BattleView {
        BattleView::from(&*self.state.read().await)
    }

    fn emit(&self, event: BattleEvent) {
        let _ = self.events.send(event);
    }

    /// "Press start": generate the selectable warrior batch and move to
    /// character selection once it arrives.
    pub async fn begin_selection(&self) -> Result<(), BattleError> {
        let generation = {
            let mut state = self.state.write().await;
            state.begin_option_generation()?;
            self.emit(BattleEvent::Loading {
                what: LoadingKind::WarriorOptions,
                active: true,
            });
            state.generation
        };

        match self.generator.generate_warrior_options().await {
            Ok(options) => {
                let mut state = self.state.write().await;
                if state.generation != generation {
                    tracing::debug!("discarding warrior options for a reset battle");
                    return Ok(());
                }
                state.present_options(options.clone())?;
                self.emit(BattleEvent::Loading {
                    what: LoadingKind::WarriorOptions,
                    active: false,
                });
                self.emit(BattleEvent::OptionsReady { options });
                self.emit(BattleEvent::PhaseChanged { phase: state.phase });
                Ok(())
            }
            Err(e) => {
                tracing::error!("warrior option generation failed: {e}");
                let mut state = self.state.write().await;
                if state.generation != generation {
                    return Ok(());
                }
                state.option_generation_failed();
                self.emit(BattleEvent::Loading {
                    what: LoadingKind::WarriorOptions,
                    active: false,
                });
                let entry = state.log.push(
                    "No heroes answered the call. Press start to try again.",
                    LogKind::Info,
                );
                self.emit(BattleEvent::LogAppended { entry });
                Err(BattleError::Generation(e.to_string()))
            }
        }
    }

    /// Select one warrior option. Generates the hero artwork and the enemy
    /// identity in parallel, then the enemy artwork, then opens the battle.
    pub async fn select_warrior(&self, option_id: WarriorOptionId) -> Result<(), BattleError> {
        let (option, generation) = {
            let mut state = self.state.write().await;
            let option = state
                .warrior_options
                .iter()
                .find(|o| o.id == option_id)
                .cloned()
                .ok_or(BattleError::UnknownOption(option_id))?;
            state.begin_image_loading(&option)?;
            self.emit(BattleEvent::Loading {
                what: LoadingKind::Artwork,
                active: true,
            });
            (option, state.generation)
        };

        let hero_prompt = format!(
            "Fantasy RPG sprite character, {}, {}, back view",
            option.class_type, option.description
        );
        let (hero_image, identity) = tokio::join!(
            self.generator.generate_character_image(&hero_prompt),
            self.generator.generate_enemy_identity(),
        );

        let identity = match identity {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!("enemy identity generation failed: {e}");
                let mut state = self.state.write().await;
                if state.generation != generation {
                    return Ok(());
                }
                state.image_loading_failed();
                self.emit(BattleEvent::Loading {
                    what: LoadingKind::Artwork,
                    active: false,
                });
                return Err(BattleError::Generation(e.to_string()));
            }
        };

        let enemy_prompt = format!(
            "A fearsome {} dragon boss, front view, menacing posture",
            identity.kind
        );
        let enemy_image = self.generator.generate_character_image(&enemy_prompt).await;

        let hero_image = resolve_image(hero_image, &option.name);
        let enemy_image = resolve_image(enemy_image, &identity.name);

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!("discarding generated battle for a reset session");
            return Ok(());
        }
        let enemy = Character::new(
            identity.name.clone(),
            state.rules.enemy_max_hp,
            state.rules.enemy_level,
        )
        .with_image(enemy_image);
        state.enter_battle(hero_image, enemy)?;
        let entry = state.log.push(
            format!("A wild {} appeared!", identity.name),
            LogKind::Info,
        );
        self.emit(BattleEvent::Loading {
            what: LoadingKind::Artwork,
            active: false,
        });
        self.emit(BattleEvent::LogAppended { entry });
        self.emit(BattleEvent::Animation {
            side: Side::Enemy,
            cue: AnimationCue::Spawn,
            duration_ms: self.timings.shake.as_millis() as u64,
        });
        self.emit(BattleEvent::PhaseChanged { phase: state.phase });
        self.emit(BattleEvent::Snapshot {
            state: BattleView::from(&*state),
        });
        tracing::info!(battle = %state.id, hero = %state.player.name, enemy = %state.enemy.name, "battle started");
        Ok(())
    }

    /// Player chose an action: rattle the dice for the display delay, draw
    /// the roll, then resolve the turn.
    pub async fn submit_action(&self, action: String) -> Result<(), BattleError> {
        let (generation, dice_max) = {
            let mut state = self.state.write().await;
            state.begin_roll(action.clone())?;
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
            (state.generation, state.rules.dice_max)
        };

        self.clock.sleep(self.timings.roll_display).await;
        let roll = rand::thread_rng().gen_range(1..=dice_max);

        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                return Ok(());
            }
            state.begin_resolving(roll)?;
            self.emit(BattleEvent::DiceRolled { value: roll });
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
        }

        self.turns.resolve_turn(&action, roll, generation).await
    }

    /// One round-timer tick. Decrements only while awaiting input; hitting
    /// zero forces a "Hesitate" turn with the minimum roll.
    pub async fn tick_round_timer(&self) {
        let timed_out = {
            let mut state = self.state.write().await;
            match state.tick_countdown() {
                Some(remaining) => {
                    self.emit(BattleEvent::CountdownTick { remaining });
                    remaining == 0
                }
                None => false,
            }
        };
        if timed_out {
            self.force_timeout().await;
        }
    }

    /// Drive the round timer until the task is aborted (client disconnect).
    pub async fn run_round_timer(&self) {
        loop {
            self.clock.sleep(self.timings.countdown_tick).await;
            self.tick_round_timer().await;
        }
    }

    async fn force_timeout(&self) {
        let generation = {
            let mut state = self.state.write().await;
            // A real action may have won the race; the phase guard settles
            // it.
            if state.begin_roll(HESITATE_ACTION).is_err() {
                return;
            }
            let entry = state
                .log
                .push("Time ran out! You hesitated.", LogKind::Info);
            self.emit(BattleEvent::LogAppended { entry });
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
            // The forced roll skips the dice rattle; the failure is
            // immediate.
            if let Err(e) = state.begin_resolving(HESITATE_ROLL) {
                tracing::error!("forced timeout could not start resolving: {e}");
                return;
            }
            self.emit(BattleEvent::DiceRolled {
                value: HESITATE_ROLL,
            });
            self.emit(BattleEvent::PhaseChanged { phase: state.phase });
            state.generation
        };

        if let Err(e) = self
            .turns
            .resolve_turn(HESITATE_ACTION, HESITATE_ROLL, generation)
            .await
        {
            tracing::error!("forced timeout turn failed: {e}");
        }
    }

    /// Explicit reset from a terminal phase back to the start menu. Any
    /// still-pending generation call from the old session is orphaned; its
    /// eventual completion fails the generation check and is discarded.
    pub async fn reset(&self) -> Result<(), BattleError> {
        let mut state = self.state.write().await;
        state.reset()?;
        self.emit(BattleEvent::PhaseChanged { phase: state.phase });
        self.emit(BattleEvent::Snapshot {
            state: BattleView::from(&*state),
        });
        tracing::info!(battle = %state.id, "battle reset");
        Ok(())
    }

    /// Store the volume preference. Display-only, no gameplay effect.
    pub async fn set_volume(&self, volume: u8) {
        let mut state = self.state.write().await;
        state.volume = volume.min(100);
        self.emit(BattleEvent::VolumeChanged {
            volume: state.volume,
        });
    }
}

/// Flatten an image generation result into a usable URI: empty and failed
/// results get a deterministic placeholder seeded by the character's name,
/// so the view never renders a broken reference.
fn resolve_image<E: std::fmt::Display>(
    result: Result<Option<String>, E>,
    name: &str,
) -> String {
    match result {
        Ok(Some(uri)) if !uri.is_empty() => uri,
        Ok(_) => placeholder_image(name),
        Err(e) => {
            tracing::warn!("artwork generation failed for {name}: {e}");
            placeholder_image(name)
        }
    }
}

fn placeholder_image(name: &str) -> String {
    let seed: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    format!("https://picsum.photos/seed/{seed}/300/300")
}
