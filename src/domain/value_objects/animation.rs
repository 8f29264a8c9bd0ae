//! Animation cues emitted toward the presentation layer
//!
//! Cue selection is a pure function of (damage, criticality) so it can be
//! unit tested without any UI. The engine only names the cue and its
//! duration; the client clears it when the duration elapses.

use serde::{Deserialize, Serialize};

/// Which combatant an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

/// A named animation the client should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationCue {
    /// Enemy materializes when the battle begins.
    Spawn,
    /// Player lunges toward the enemy.
    LungeRight,
    /// Enemy lunges toward the player.
    LungeLeft,
    /// Light hit reaction.
    Shake,
    /// Heavy hit reaction, paired with a full-screen flash.
    HeavyShake,
}

/// Whether a hit lands light or heavy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitWeight {
    Light,
    Heavy,
}

impl HitWeight {
    pub fn cue(&self) -> AnimationCue {
        match self {
            Self::Light => AnimationCue::Shake,
            Self::Heavy => AnimationCue::HeavyShake,
        }
    }

    /// Heavy hits flash the whole screen.
    pub fn triggers_flash(&self) -> bool {
        matches!(self, Self::Heavy)
    }
}

/// Weight of a hit landing on the enemy: heavy at 20+ damage or on a crit.
pub fn enemy_hit_weight(damage: u32, is_critical: bool) -> HitWeight {
    if is_critical || damage >= 20 {
        HitWeight::Heavy
    } else {
        HitWeight::Light
    }
}

/// Weight of a retaliation landing on the player: heavy strictly above 20.
pub fn player_hit_weight(damage: u32) -> HitWeight {
    if damage > 20 {
        HitWeight::Heavy
    } else {
        HitWeight::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_hit_heavy_on_threshold_or_crit() {
        assert_eq!(enemy_hit_weight(19, false), HitWeight::Light);
        assert_eq!(enemy_hit_weight(20, false), HitWeight::Heavy);
        assert_eq!(enemy_hit_weight(1, true), HitWeight::Heavy);
        assert_eq!(enemy_hit_weight(0, true), HitWeight::Heavy);
    }

    #[test]
    fn player_hit_heavy_strictly_above_threshold() {
        assert_eq!(player_hit_weight(20), HitWeight::Light);
        assert_eq!(player_hit_weight(21), HitWeight::Heavy);
        // A 25 damage defensive turn shakes the screen.
        assert_eq!(player_hit_weight(25), HitWeight::Heavy);
    }

    #[test]
    fn flash_only_on_heavy() {
        assert!(HitWeight::Heavy.triggers_flash());
        assert!(!HitWeight::Light.triggers_flash());
        assert_eq!(HitWeight::Heavy.cue(), AnimationCue::HeavyShake);
        assert_eq!(HitWeight::Light.cue(), AnimationCue::Shake);
    }
}
