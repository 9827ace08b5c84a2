pub mod ai;
pub mod cell;
pub mod chunk;
pub mod entity;
pub mod grid;
