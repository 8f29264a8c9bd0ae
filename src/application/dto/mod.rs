//! DTOs - what the engine exposes to the presentation layer

mod battle_events;
mod battle_view;

pub use battle_events::{BattleEvent, LoadingKind};
pub use battle_view::BattleView;
