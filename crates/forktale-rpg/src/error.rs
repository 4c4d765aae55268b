/// Alias for `Result<T, RpgError>`.
pub type RpgResult<T> = Result<T, RpgError>;

/// Errors that can occur in the attribute and combat systems.
#[derive(Debug, thiserror::Error)]
pub enum RpgError {
    /// A named attribute does not exist on the character.
    #[error("unknown attribute: \"{0}\"")]
    UnknownAttribute(String),

    /// Combat has no one left to act.
    #[error("no active combatant")]
    NoActiveCombatant,

    /// A combatant index is out of bounds.
    #[error("combatant index {0} out of bounds")]
    CombatantOutOfBounds(usize),

    /// Combat has not been started yet.
    #[error("combat has not started")]
    NotStarted,
}
