//! Attribute and combat mechanics for Forktale games.
//!
//! Independent of the script engine: characters carry attribute collections
//! whose values flow through detachable modifier hooks, and a turn-based
//! combat encounter groups characters into teams, rolls initiative, and
//! keeps an event log. Nothing here talks to the console or the parser.

pub mod attribute;
pub mod character;
pub mod combat;
pub mod error;

pub use attribute::{Attribute, AttributeSet, HookId, HookStage};
pub use character::CombatCharacter;
pub use combat::{Combat, CombatEvent, Combatant};
pub use error::{RpgError, RpgResult};
