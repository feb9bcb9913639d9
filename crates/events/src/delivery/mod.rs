//! External delivery channels for notification messages.

pub mod redis;
