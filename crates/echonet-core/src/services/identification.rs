use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ManufacturerCode;
use crate::{DecodeError, EncodeError};
use alloc::vec::Vec;

/// First byte of an identification number that embeds a manufacturer code.
pub const MANUFACTURER_ID_PREFIX: u8 = 0xFE;
/// Length of the unique part following the manufacturer code.
pub const UNIQUE_ID_LEN: usize = 13;

/// Decoded identification number (EPC `0x83`) of the `0xFE` form:
/// prefix, 3-byte manufacturer code, 13 manufacturer-defined bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationNumber {
    pub manufacturer: ManufacturerCode,
    pub unique_id: Vec<u8>,
}

impl IdentificationNumber {
    /// Decodes a `0xFE`-prefixed identification number. Other prefixes
    /// denote lower-layer identifiers and are reported as
    /// [`DecodeError::InvalidValue`]; callers keep the raw EDT instead.
    pub fn decode(edt: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(edt);
        if r.read_u8()? != MANUFACTURER_ID_PREFIX {
            return Err(DecodeError::InvalidValue);
        }
        let manufacturer = ManufacturerCode::decode(&mut r)?;
        let unique_id = r.read_exact(UNIQUE_ID_LEN)?.to_vec();
        if !r.is_empty() {
            return Err(DecodeError::InvalidLength);
        }
        Ok(Self {
            manufacturer,
            unique_id,
        })
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if self.unique_id.len() != UNIQUE_ID_LEN {
            return Err(EncodeError::InvalidLength);
        }
        w.write_u8(MANUFACTURER_ID_PREFIX)?;
        self.manufacturer.encode(w)?;
        w.write_all(&self.unique_id)
    }
}

/// Manufacturer code carried inside an identification number EDT, if the
/// EDT is of the `0xFE` form. Only the first four bytes are inspected.
pub fn manufacturer_of(edt: &[u8]) -> Option<ManufacturerCode> {
    match edt {
        [MANUFACTURER_ID_PREFIX, a, b, c, ..] => {
            ManufacturerCode::new(u32::from_be_bytes([0, *a, *b, *c]))
        }
        _ => None,
    }
}
