/// Events emitted during a session step.
/// The presentation layer consumes these for status text and sound.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    KeyCollected { x: i32, y: i32 },
    AllKeysCollected,
    TrapTriggered { x: i32, y: i32 },
    /// The monster walked over a trap and wrecked it.
    TrapDestroyed { x: i32, y: i32 },
    DoorLocked { keys: usize, needed: usize },
    MonsterEnraged,
    PlayerCaught,
    PlayerEscaped,
}
