pub mod cli;
pub mod debug;
pub mod entities;
pub mod entries;
pub mod error;
pub mod flow;
pub mod health;
pub mod router;
pub mod setup;
pub mod state;
