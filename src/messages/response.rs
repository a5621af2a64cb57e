use bytes::{Bytes, BytesMut};
use eyre::Error;
use std::fmt;

use super::util::BytesMutExt;

const SASL_RESPONSE: u8 = b'p';

/// Follow-up client message of the SASL exchange: an opaque
/// mechanism-specific payload with no internal framing. Its extent is set
/// entirely by the outer envelope, so decoding consumes whatever the envelope
/// delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslResponse {
    pub payload: Bytes,
}

impl super::Parse for SaslResponse {
    #[culpa::throws]
    fn parse(mut contents: Bytes) -> Self {
        let payload = contents.split_to(contents.len());
        Self { payload }
    }
}

impl super::Encode for SaslResponse {
    const IDENTIFIER: u8 = SASL_RESPONSE;

    #[culpa::throws]
    fn encode_to(self, dst: &mut BytesMut) {
        dst.try_put(self.payload)?;
    }

    fn encoded_length_estimate(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Display for SaslResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaslResponse({:?})", &self.payload[..])
    }
}
