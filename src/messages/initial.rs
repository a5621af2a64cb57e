use bytes::{Bytes, BytesMut};
use eyre::{bail, eyre, Error};
use std::fmt;

use super::util::{BytesExt, BytesMutExt};

// Shares the password-family identifier with `SaslResponse`; the server tells
// the two apart by handshake phase, not by tag.
const SASL_INITIAL_RESPONSE: u8 = b'p';

/// First client message of the SASL exchange: the selected mechanism name
/// plus an optional mechanism-specific initial payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslInitialResponse {
    /// Chosen mechanism name, e.g. `SCRAM-SHA-256`.
    ///
    /// The name is wire-terminated by a single zero byte, so it must not
    /// itself contain one; encoding such a name corrupts the stream and is
    /// not detected.
    pub mechanism: Bytes,
    /// Mechanism-specific initial payload.
    ///
    /// An empty payload is encoded as the `-1` length sentinel. The wire
    /// cannot distinguish "absent" from "present but empty" after decode, and
    /// neither does this type.
    pub payload: Bytes,
}

impl super::Parse for SaslInitialResponse {
    #[culpa::throws]
    fn parse(mut contents: Bytes) -> Self {
        let mechanism = contents
            .try_get_cstr()
            .ok_or(eyre!("missing mechanism terminator"))?;
        let declared = contents
            .try_get_i32_be()
            .ok_or(eyre!("missing length field"))?;
        let payload = match declared {
            -1 => Bytes::new(),
            declared if declared < -1 => bail!("invalid negative length {declared}"),
            declared => {
                let declared = usize::try_from(declared)?;
                if contents.len() < declared {
                    bail!("truncated payload");
                }
                contents.split_to(declared)
            }
        };
        Self { mechanism, payload }
    }
}

impl super::Encode for SaslInitialResponse {
    const IDENTIFIER: u8 = SASL_INITIAL_RESPONSE;

    #[culpa::throws]
    fn encode_to(self, dst: &mut BytesMut) {
        dst.try_put_cstr(self.mechanism)?;
        if self.payload.is_empty() {
            dst.try_put_i32_be(-1)?;
        } else {
            // must stay a fixed-width 32-bit put, a length-prefixed
            // collection helper could pick a narrower integer
            dst.try_put_i32_be(i32::try_from(self.payload.len())?)?;
            dst.try_put(self.payload)?;
        }
    }

    fn encoded_length_estimate(&self) -> usize {
        self.mechanism.len() + 1 + 4 + self.payload.len()
    }
}

impl fmt::Display for SaslInitialResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SaslInitialResponse({}, payload: {:?})",
            String::from_utf8_lossy(&self.mechanism),
            &self.payload[..],
        )
    }
}
