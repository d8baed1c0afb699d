//! A terminal task board: accounts, realtime task lists and a local
//! four-column board.

pub mod app;
pub mod config;
pub mod error;
pub mod gateway;
pub mod kanban_board;
pub mod local_store;
pub mod router;
pub mod storage;
pub mod task;
pub mod ui;
pub mod widgets;

pub use error::{Error, Result};
