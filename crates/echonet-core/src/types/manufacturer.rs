use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};
use core::fmt;

/// A 3-byte manufacturer code assigned by the ECHONET Consortium (EPC
/// `0x8A`, also embedded in identification numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManufacturerCode(u32);

impl ManufacturerCode {
    pub const fn new(raw: u32) -> Option<Self> {
        if raw > 0x00FF_FFFF {
            return None;
        }
        Some(Self(raw))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Parses a `0x8A` EDT. The value must be exactly three bytes.
    pub fn from_edt(edt: &[u8]) -> Result<Self, DecodeError> {
        if edt.len() != 3 {
            return Err(DecodeError::InvalidLength);
        }
        let mut r = Reader::new(edt);
        Self::decode(&mut r)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self(r.read_be_u24()?))
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_be_u24(self.0)
    }
}

impl fmt::Display for ManufacturerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}
