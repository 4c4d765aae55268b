//! A combat-ready character wrapping an attribute collection.

use crate::attribute::AttributeSet;

/// The attribute a character's survival hangs on.
pub const HEALTH: &str = "health";
/// The attribute added to initiative rolls.
pub const INITIATIVE: &str = "initiative";

/// A character participating in combat.
#[derive(Debug)]
pub struct CombatCharacter {
    /// Display name.
    pub name: String,
    /// The character's attributes.
    pub attributes: AttributeSet,
}

impl CombatCharacter {
    /// Create a character with empty attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeSet::new(),
        }
    }

    /// Builder-style attribute assignment.
    pub fn with_attribute(mut self, name: impl Into<String>, base: i64) -> Self {
        self.attributes.set(name, base);
        self
    }

    /// Effective health, 0 when the attribute is missing.
    pub fn health(&self) -> i64 {
        self.attributes.value_of(HEALTH)
    }

    /// Effective initiative bonus, 0 when the attribute is missing.
    pub fn initiative_bonus(&self) -> i64 {
        self.attributes.value_of(INITIATIVE)
    }

    /// True while effective health is above zero.
    pub fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Lower the health base score, clamped at zero.
    pub fn take_damage(&mut self, amount: i64) {
        if let Some(health) = self.attributes.get_mut(HEALTH) {
            let base = health.base();
            health.set_base((base - amount).max(0));
        }
    }
}
