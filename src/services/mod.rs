//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own chat semantics and persistence so route handlers can
//! stay focused on protocol translation. `store` is the persistence seam,
//! `registry` owns live connections, `gateway` and `chat` implement the
//! socket protocol, and `notify` decides about push.

pub mod chat;
pub mod gateway;
pub mod memory_store;
pub mod notify;
pub mod pg_store;
pub mod registry;
pub mod store;
