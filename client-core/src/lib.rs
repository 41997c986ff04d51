//! Client-side chat state for the Jammit mobile app.
//!
//! ARCHITECTURE
//! ============
//! `state::unread` owns the badge: it merges the server's chat snapshot,
//! durable per-chat last-read stamps from `storage`, and pending counters
//! from live `new_message` events. `api` loads the snapshot over REST.
//! Rendering and OS notification display live in the app shell; this crate
//! only decides what to show.

pub mod api;
pub mod state;
pub mod storage;
