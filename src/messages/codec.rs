use bytes::{Buf, BufMut, BytesMut};
use eyre::{bail, Context, Error};
use tokio_util::codec::{Decoder, Encoder};

use super::{Encode, Parse, SaslInitialResponse, SaslMessage, SaslResponse};

/// Framing codec for the SASL exchange: every message travels under the
/// protocol's outer envelope, an identifier byte followed by a big-endian
/// 32-bit length that counts itself but not the identifier.
///
/// Both client messages share the password-family `'p'` identifier, so the
/// decoder selects the message kind by position: the first frame of a
/// connection is the initial response, every later frame a plain response.
#[derive(Debug, Default)]
pub struct Codec {
    kind: Option<u8>,
    length: Option<usize>,
    initial_seen: bool,
    errored: bool,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for Codec {
    type Item = SaslMessage;
    type Error = Error;

    #[culpa::throws]
    fn decode(&mut self, src: &mut BytesMut) -> Option<Self::Item> {
        if self.errored {
            bail!("something went wrong previously and we can't resynchronize");
        }

        if self.kind.is_none() {
            self.kind = (src.len() >= 1).then(|| src.get_u8());
        }
        let Some(kind) = self.kind else { return None };

        let expected = if self.initial_seen {
            SaslResponse::IDENTIFIER
        } else {
            SaslInitialResponse::IDENTIFIER
        };
        if kind != expected {
            self.errored = true;
            bail!("unexpected message identifier {kind:#04x}");
        }

        if self.length.is_none() && src.len() >= 4 {
            let declared = src.get_i32();
            match usize::try_from(declared) {
                Ok(declared) if declared >= 4 => {
                    self.length = Some(declared - 4);
                }
                Ok(_) => {
                    self.errored = true;
                    bail!("envelope length must cover the length field itself");
                }
                Err(_) => {
                    self.errored = true;
                    bail!("invalid negative envelope length {declared}");
                }
            }
        }
        let Some(length) = self.length else { return None };

        if src.len() < length {
            return None;
        }
        let contents = src.split_to(length).freeze();

        self.kind = None;
        self.length = None;

        let message = if self.initial_seen {
            SaslMessage::Response(SaslResponse::parse(contents)?)
        } else {
            let message = SaslMessage::Initial(SaslInitialResponse::parse(contents)?);
            self.initial_seen = true;
            message
        };
        tracing::trace!(%message, "decoded");
        Some(message)
    }
}

impl Encoder<SaslMessage> for Codec {
    type Error = Error;

    #[culpa::throws]
    fn encode(&mut self, msg: SaslMessage, dst: &mut BytesMut) {
        tracing::trace!(%msg, "encoding");
        // reserve up front so the unsplit below is a noop
        dst.reserve(msg.encoded_length_estimate() + 5);
        dst.put_u8(msg.identifier());
        // placeholder for the envelope length, patched once the body is written
        dst.put_i32(0);
        // split so the message can't write over the envelope
        let mut msg_buffer = dst.split_off(dst.len());
        msg.encode_to(&mut msg_buffer)?;
        // the envelope length counts itself but not the identifier byte
        let length = i32::try_from(msg_buffer.len() + 4).context("length did not fit in i32")?;
        let offset = dst.len() - 4;
        dst[offset..].copy_from_slice(&length.to_be_bytes());
        dst.unsplit(msg_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hex_literal::hex;

    #[test]
    fn encode_frames_the_initial_response() {
        let mut codec = Codec::new();
        let mut dst = BytesMut::new();
        codec
            .encode(
                SaslMessage::Initial(SaslInitialResponse {
                    mechanism: Bytes::from_static(b"SCRAM-SHA-256"),
                    payload: Bytes::from_static(&hex!("6e2c2c")),
                }),
                &mut dst,
            )
            .unwrap();
        assert_eq!(dst[0], b'p');
        assert_eq!(dst[1..5], hex!("00000019"));
        assert_eq!(&dst[5..18], b"SCRAM-SHA-256");
        assert_eq!(dst[18..], hex!("00 00000003 6e2c2c"));
    }

    #[test]
    fn decode_selects_the_kind_by_phase() {
        let mut codec = Codec::new();
        let mut src = BytesMut::new();
        src.extend_from_slice(&hex!("70 00000011 45585445524e414c 00 ffffffff"));
        src.extend_from_slice(&hex!("70 00000007 6e2c2c"));

        let first = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(
            first,
            SaslMessage::Initial(SaslInitialResponse {
                mechanism: Bytes::from_static(b"EXTERNAL"),
                payload: Bytes::new(),
            }),
        );
        let second = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(
            second,
            SaslMessage::Response(SaslResponse {
                payload: Bytes::from_static(&hex!("6e2c2c")),
            }),
        );
        assert!(codec.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn decode_waits_for_a_full_frame() {
        let mut codec = Codec::new();
        let mut src = BytesMut::new();
        src.extend_from_slice(&hex!("70"));
        assert!(codec.decode(&mut src).unwrap().is_none());
        src.extend_from_slice(&hex!("00000011"));
        assert!(codec.decode(&mut src).unwrap().is_none());
        src.extend_from_slice(&hex!("45585445524e414c 00"));
        assert!(codec.decode(&mut src).unwrap().is_none());
        src.extend_from_slice(&hex!("ffffffff"));
        let msg = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(
            msg,
            SaslMessage::Initial(SaslInitialResponse {
                mechanism: Bytes::from_static(b"EXTERNAL"),
                payload: Bytes::new(),
            }),
        );
    }

    #[test]
    fn round_trip_through_the_codec() {
        let initial = SaslMessage::Initial(SaslInitialResponse {
            mechanism: Bytes::from_static(b"SCRAM-SHA-256"),
            payload: Bytes::from_static(b"n,,n=,r=nonce"),
        });
        let response = SaslMessage::Response(SaslResponse {
            payload: Bytes::from_static(b"c=biws,r=nonce,p=proof"),
        });

        let mut codec = Codec::new();
        let mut buffer = BytesMut::new();
        codec.encode(initial.clone(), &mut buffer).unwrap();
        codec.encode(response.clone(), &mut buffer).unwrap();

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(initial));
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(response));
        assert!(buffer.is_empty());
    }

    #[test]
    fn malformed_body_surfaces_as_an_error() {
        let mut codec = Codec::new();
        let mut src = BytesMut::new();
        src.extend_from_slice(&hex!("70 00000008 53435241"));
        let err = codec.decode(&mut src).unwrap_err();
        assert_eq!(err.to_string(), "missing mechanism terminator");
    }

    #[test]
    fn unexpected_identifier_poisons_the_codec() {
        let mut codec = Codec::new();
        let mut src = BytesMut::new();
        src.extend_from_slice(&hex!("51 00000004"));
        let err = codec.decode(&mut src).unwrap_err();
        assert_eq!(err.to_string(), "unexpected message identifier 0x51");
        let err = codec.decode(&mut src).unwrap_err();
        assert!(err.to_string().contains("can't resynchronize"));
    }

    #[test]
    fn envelope_length_must_cover_itself() {
        let mut codec = Codec::new();
        let mut src = BytesMut::new();
        src.extend_from_slice(&hex!("70 00000003"));
        assert!(codec.decode(&mut src).is_err());
    }

    #[test]
    fn negative_envelope_length() {
        let mut codec = Codec::new();
        let mut src = BytesMut::new();
        src.extend_from_slice(&hex!("70 fffffffc"));
        let err = codec.decode(&mut src).unwrap_err();
        assert_eq!(err.to_string(), "invalid negative envelope length -4");
    }
}
