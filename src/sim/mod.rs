pub mod control;
pub mod event;
pub mod level;
pub mod session;
pub mod step;
pub mod transition;
pub mod world;
