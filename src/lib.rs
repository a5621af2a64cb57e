//! Byte-exact framing for the SASL credential-negotiation messages of the
//! PostgreSQL wire protocol.
//!
//! The exchange consists of two client messages: [`SaslInitialResponse`]
//! carries the selected mechanism name and an optional initial payload behind
//! a signed 32-bit length prefix (`-1` meaning "no payload"), and
//! [`SaslResponse`] carries each subsequent opaque payload with no internal
//! framing at all. [`Codec`] frames both under the protocol's outer `'p'`
//! envelope for use with [`tokio_util::codec::Framed`].
//!
//! Computing SCRAM proofs, driving the handshake, and the rest of the
//! protocol's message catalog are out of scope; decode failures surface as
//! [`eyre::Error`]s that the handshake driver is expected to treat as fatal
//! for the connection.

pub mod messages;

pub use self::messages::{Codec, Encode, Parse, SaslInitialResponse, SaslMessage, SaslResponse};
