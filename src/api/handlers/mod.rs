pub mod debug;
pub mod health;
