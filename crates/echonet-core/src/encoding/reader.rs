use crate::DecodeError;

/// Cursor over a received frame. Every read is bounds-checked and fails
/// with [`DecodeError::UnexpectedEof`] instead of panicking.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::UnexpectedEof)?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.read_array()?;
        Ok(byte)
    }

    pub fn read_be_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Reads a 3-byte big-endian value, as used by manufacturer codes.
    pub fn read_be_u24(&mut self) -> Result<u32, DecodeError> {
        let [a, b, c] = self.read_array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::DecodeError;

    #[test]
    fn reads_header_fields() {
        // EHD1, EHD2, TID 0x0102, SEOJ.
        let mut r = Reader::new(&[0x10, 0x81, 0x01, 0x02, 0x05, 0xFF, 0x01]);
        assert_eq!(r.read_u8().unwrap(), 0x10);
        assert_eq!(r.read_u8().unwrap(), 0x81);
        assert_eq!(r.read_be_u16().unwrap(), 0x0102);
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_array::<3>().unwrap(), [0x05, 0xFF, 0x01]);
        assert!(r.is_empty());
    }

    #[test]
    fn reads_manufacturer_sized_values() {
        let mut r = Reader::new(&[0x00, 0x00, 0x0B, 0xFF]);
        assert_eq!(r.read_be_u24().unwrap(), 0x00000B);
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.read_be_u24().unwrap_err(), DecodeError::UnexpectedEof);
        // A failed read consumes nothing.
        assert_eq!(r.read_exact(1).unwrap(), &[0xFF]);
    }

    #[test]
    fn huge_lengths_do_not_overflow() {
        let mut r = Reader::new(&[1, 2]);
        r.read_u8().unwrap();
        assert_eq!(r.read_exact(usize::MAX).unwrap_err(), DecodeError::UnexpectedEof);
    }
}
