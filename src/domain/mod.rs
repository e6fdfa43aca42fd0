pub mod ai;
pub mod buttons;
pub mod entity;
pub mod projectile;
pub mod rules;
pub mod tile;
