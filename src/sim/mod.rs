pub mod clock;
pub mod event;
pub mod flow;
pub mod level;
pub mod spawn;
pub mod step;
pub mod world;
