use bytes::{Buf, BufMut, Bytes, BytesMut};
use eyre::{bail, Error};

pub(super) trait BytesExt: Sized {
    fn try_get_i32_be(&mut self) -> Option<i32>;
    fn try_get_cstr(&mut self) -> Option<Self>;
}

impl BytesExt for Bytes {
    fn try_get_i32_be(&mut self) -> Option<i32> {
        (self.len() >= std::mem::size_of::<i32>()).then(|| self.get_i32())
    }

    fn try_get_cstr(&mut self) -> Option<Self> {
        let terminator = self.iter().position(|&byte| byte == 0)?;
        let contents = self.split_to(terminator);
        self.advance(1);
        Some(contents)
    }
}

pub(super) trait BytesMutExt: Sized {
    #[culpa::throws]
    fn try_put(&mut self, src: impl Buf);
    #[culpa::throws]
    fn try_put_u8(&mut self, n: u8);
    #[culpa::throws]
    fn try_put_i32_be(&mut self, n: i32);
    #[culpa::throws]
    fn try_put_cstr(&mut self, string: impl Buf);
}

impl BytesMutExt for BytesMut {
    #[culpa::throws]
    fn try_put(&mut self, src: impl Buf) {
        if self.remaining_mut() < src.remaining() {
            bail!("not enough space remaining");
        }
        self.put(src)
    }

    #[culpa::throws]
    fn try_put_u8(&mut self, n: u8) {
        if self.remaining_mut() < std::mem::size_of::<u8>() {
            bail!("not enough space remaining");
        }
        self.put_u8(n)
    }

    #[culpa::throws]
    fn try_put_i32_be(&mut self, n: i32) {
        if self.remaining_mut() < std::mem::size_of::<i32>() {
            bail!("not enough space remaining");
        }
        self.put_i32(n)
    }

    #[culpa::throws]
    fn try_put_cstr(&mut self, string: impl Buf) {
        self.try_put(string)?;
        self.try_put_u8(0)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cstr_consumes_terminator() {
        let mut bytes = Bytes::from_static(b"SCRAM-SHA-256\0rest");
        let contents = bytes.try_get_cstr().unwrap();
        assert_eq!(contents, Bytes::from_static(b"SCRAM-SHA-256"));
        assert_eq!(bytes, Bytes::from_static(b"rest"));
    }

    #[test]
    fn cstr_requires_terminator() {
        let mut bytes = Bytes::from_static(b"SCRAM-SHA-256");
        assert!(bytes.try_get_cstr().is_none());
    }

    #[test]
    fn i32_be_is_signed() {
        let mut bytes = Bytes::from_static(&[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(bytes.try_get_i32_be(), Some(-1));
        assert!(bytes.try_get_i32_be().is_none());
    }
}
