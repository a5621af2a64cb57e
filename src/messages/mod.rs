use bytes::{Bytes, BytesMut};
use eyre::Error;
use std::fmt;

mod codec;
mod initial;
mod response;
mod util;

pub use self::{codec::Codec, initial::SaslInitialResponse, response::SaslResponse};

pub trait Parse: Sized {
    #[culpa::throws]
    fn parse(contents: Bytes) -> Self;
}

pub trait Encode: Sized {
    /// Identifier written in the outer envelope, defined by the surrounding
    /// protocol.
    const IDENTIFIER: u8;

    fn encode_to(self, dst: &mut BytesMut) -> Result<(), Error>;
    fn encoded_length_estimate(&self) -> usize;
}

/// The closed set of client messages exchanged during the SASL credential
/// negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslMessage {
    Initial(SaslInitialResponse),
    Response(SaslResponse),
}

impl SaslMessage {
    pub fn identifier(&self) -> u8 {
        match self {
            SaslMessage::Initial(_) => SaslInitialResponse::IDENTIFIER,
            SaslMessage::Response(_) => SaslResponse::IDENTIFIER,
        }
    }

    #[culpa::throws]
    pub(crate) fn encode_to(self, dst: &mut BytesMut) {
        match self {
            SaslMessage::Initial(msg) => msg.encode_to(dst)?,
            SaslMessage::Response(msg) => msg.encode_to(dst)?,
        }
    }

    pub(crate) fn encoded_length_estimate(&self) -> usize {
        match self {
            SaslMessage::Initial(msg) => msg.encoded_length_estimate(),
            SaslMessage::Response(msg) => msg.encoded_length_estimate(),
        }
    }
}

impl From<SaslInitialResponse> for SaslMessage {
    fn from(msg: SaslInitialResponse) -> Self {
        SaslMessage::Initial(msg)
    }
}

impl From<SaslResponse> for SaslMessage {
    fn from(msg: SaslResponse) -> Self {
        SaslMessage::Response(msg)
    }
}

impl fmt::Display for SaslMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaslMessage::Initial(msg) => msg.fmt(f),
            SaslMessage::Response(msg) => msg.fmt(f),
        }
    }
}
