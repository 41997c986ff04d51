//! Client state modules.

pub mod unread;
