// Library root: re-exports all modules so integration tests and the terminal
// front end can reach the crate's public API.

pub mod config;
pub mod db;
pub mod display;
pub mod games;
pub mod player;
pub mod ranking;
pub mod seed;
pub mod store;
pub mod team;
pub mod visibility;
pub mod watch;
