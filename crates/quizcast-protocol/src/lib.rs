//! Wire protocol for Quizcast.
//!
//! This crate defines the "language" that quiz clients and the server speak:
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`Recipient`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! layer (quiz state). It doesn't know about connections or rooms — it
//! only knows how to describe and serialize events.

mod codec;
mod error;
mod events;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, PlayerEntry, Recipient, RoomId, ServerEvent};
