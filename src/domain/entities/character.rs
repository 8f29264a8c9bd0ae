//! Character entity - a combatant in the battle

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::WarriorOptionId;

/// A combatant: the chosen hero or the enemy boss.
///
/// `image` is an opaque URI and may be empty while artwork generation is
/// still pending; the presentation layer shows a placeholder silhouette
/// until it fills in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub image: String,
    pub level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,
}

impl Character {
    pub fn new(name: impl Into<String>, max_hp: u32, level: u32) -> Self {
        Self {
            name: name.into(),
            hp: max_hp,
            max_hp,
            image: String::new(),
            level,
            class_type: None,
        }
    }

    pub fn with_class(mut self, class_type: impl Into<String>) -> Self {
        self.class_type = Some(class_type.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Reduce hp, clamped at zero.
    pub fn apply_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    /// Restore hp, clamped at `max_hp`.
    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

/// One hero offered during character selection.
///
/// Options are immutable once generated; selecting one consumes the whole
/// batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarriorOption {
    pub id: WarriorOptionId,
    pub name: String,
    pub class_type: String,
    pub description: String,
}

impl WarriorOption {
    pub fn new(
        name: impl Into<String>,
        class_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: WarriorOptionId::new(),
            name: name.into(),
            class_type: class_type.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero() {
        let mut c = Character::new("Hero", 100, 5);
        c.apply_damage(30);
        assert_eq!(c.hp, 70);
        c.apply_damage(200);
        assert_eq!(c.hp, 0);
        assert!(c.is_defeated());
    }

    #[test]
    fn heal_clamps_at_max() {
        let mut c = Character::new("Hero", 100, 5);
        c.apply_damage(40);
        c.heal(15);
        assert_eq!(c.hp, 75);
        c.heal(500);
        assert_eq!(c.hp, 100);
    }

    #[test]
    fn near_death_enemy_clamps_to_zero() {
        // Enemy at 10/150 dealt 15 damage must land exactly on 0.
        let mut enemy = Character::new("Dragon", 150, 8);
        enemy.hp = 10;
        enemy.apply_damage(15);
        assert_eq!(enemy.hp, 0);
    }
}
