//! Client-side state modules.
//!
//! DESIGN
//! ======
//! `auth` owns the live session record and its actions; `persist` defines
//! the subset that is mirrored to durable storage and how it is restored.

pub mod auth;
pub mod persist;
