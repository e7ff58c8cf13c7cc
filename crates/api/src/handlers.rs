pub mod admin;
pub mod health;
pub mod interactions;
pub mod process;
pub mod series;
