#![forbid(unsafe_code)]

//! Image Folder Viewer engine
//!
//! Folders are registered as cards in a profile document; opening a card
//! starts a viewer session with sequential or shuffled navigation, mirroring
//! and fit-to-window zoom. The host supplies image enumeration, persistence
//! and window control through the traits in [`images`], [`persistence`] and
//! [`window`].

pub mod app;
pub mod clipboard;
pub mod config;
pub mod constants;
pub mod error;
pub mod images;
pub mod keymap;
pub mod logging;
pub mod ordered;
pub mod persistence;
pub mod store;
pub mod types;
pub mod viewer;
pub mod window;
pub mod zoom;
