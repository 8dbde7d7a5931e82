//! Channel implementations.
//!
//! Concrete transports behind the [`Messenger`](crate::channel::Messenger)
//! seam. Telegram is the only one today and sits behind the `telegram`
//! feature.

#[cfg(feature = "telegram")]
pub mod telegram;

#[cfg(feature = "telegram")]
pub use telegram::{TelegramChannel, TelegramChannelConfig};
