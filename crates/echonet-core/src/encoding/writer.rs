use crate::EncodeError;

/// Appends frame bytes to a caller-owned buffer. A write that does not fit
/// fails with [`EncodeError::BufferTooSmall`] and leaves the buffer as it
/// was.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn as_written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let dst = self
            .buf
            .get_mut(self.pos..self.pos + data.len())
            .ok_or(EncodeError::BufferTooSmall)?;
        dst.copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.write_all(&[value])
    }

    pub fn write_be_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes the low three bytes of `value`; wider values are rejected.
    pub fn write_be_u24(&mut self, value: u32) -> Result<(), EncodeError> {
        match value.to_be_bytes() {
            [0, rest @ ..] => self.write_all(&rest),
            _ => Err(EncodeError::ValueOutOfRange),
        }
    }
}
