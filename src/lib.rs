/// Escape the Dungeon: simulation core.
///
/// `domain` holds the maze cells, entities and monster AI.
/// `sim` assembles mazes and drives a play session on a virtual clock.
/// The terminal front end in `main.rs` only talks to `sim::session::Session`.

pub mod config;
pub mod domain;
pub mod sim;
