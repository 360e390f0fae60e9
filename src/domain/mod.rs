pub mod ai;
pub mod combat;
pub mod entity;
pub mod grid;
pub mod physics;
pub mod rng;
pub mod rules;
pub mod tile;
