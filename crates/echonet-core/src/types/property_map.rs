use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// Number of properties from which a map switches to the bitmap form.
pub const BITMAP_THRESHOLD: usize = 16;
const BITMAP_LEN: usize = 16;

/// A set of property codes as carried by EPC `0x9D`, `0x9E` and `0x9F`.
///
/// Below [`BITMAP_THRESHOLD`] entries the wire form is a count followed by
/// the codes. From 16 entries on it is a count followed by a 16-byte bitmap
/// where bit `b` of byte `i` stands for EPC `0x80 + (b << 4) + i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PropertyMap(BTreeSet<u8>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, epc: u8) -> bool {
        self.0.contains(&epc)
    }

    pub fn insert(&mut self, epc: u8) -> bool {
        self.0.insert(epc)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Property codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }

    /// Decodes a property-map EDT.
    ///
    /// Trailing bytes past the declared list or bitmap are ignored; some
    /// devices pad the EDT.
    pub fn decode(edt: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(edt);
        let count = r.read_u8()? as usize;
        let mut out = BTreeSet::new();
        if count < BITMAP_THRESHOLD {
            out.extend(r.read_exact(count)?.iter().copied());
        } else {
            let bitmap = r.read_exact(BITMAP_LEN)?;
            for (i, byte) in bitmap.iter().enumerate() {
                for bit in 0..8u8 {
                    if byte & (1 << bit) != 0 {
                        out.insert(0x80 + (bit << 4) + i as u8);
                    }
                }
            }
        }
        Ok(Self(out))
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let count = u8::try_from(self.0.len()).map_err(|_| EncodeError::ValueOutOfRange)?;
        w.write_u8(count)?;
        if self.0.len() < BITMAP_THRESHOLD {
            for epc in &self.0 {
                w.write_u8(*epc)?;
            }
            return Ok(());
        }

        let mut bitmap = [0u8; BITMAP_LEN];
        for epc in &self.0 {
            if *epc < 0x80 {
                return Err(EncodeError::ValueOutOfRange);
            }
            let offset = epc - 0x80;
            bitmap[usize::from(offset & 0x0F)] |= 1 << (offset >> 4);
        }
        w.write_all(&bitmap)
    }

    pub fn to_edt(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = [0u8; 1 + BITMAP_LEN];
        let mut w = Writer::new(&mut buf);
        self.encode(&mut w)?;
        Ok(w.as_written().to_vec())
    }
}

impl FromIterator<u8> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[u8; N]> for PropertyMap {
    fn from(codes: [u8; N]) -> Self {
        codes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::PropertyMap;
    use crate::{DecodeError, EncodeError};

    #[test]
    fn decodes_short_list() {
        let map = PropertyMap::decode(&[0x03, 0x80, 0xB0, 0x9F]).unwrap();
        assert_eq!(map.to_vec(), vec![0x80, 0x9F, 0xB0]);
    }

    #[test]
    fn decodes_bitmap_form() {
        // 0x80 -> byte 0 bit 0, 0x9F -> byte 15 bit 1, 0xB0 -> byte 0 bit 3.
        let mut edt = [0u8; 17];
        edt[0] = 16;
        edt[1] = 0b0000_1001;
        edt[16] = 0b0000_0010;
        let map = PropertyMap::decode(&edt).unwrap();
        assert_eq!(map.to_vec(), vec![0x80, 0x9F, 0xB0]);
    }

    #[test]
    fn large_maps_encode_as_bitmap() {
        let map: PropertyMap = (0x80..0x94).collect();
        let edt = map.to_edt().unwrap();
        assert_eq!(edt.len(), 17);
        assert_eq!(edt[0], 20);
        assert_eq!(PropertyMap::decode(&edt).unwrap(), map);
    }

    #[test]
    fn small_maps_encode_as_list() {
        let map = PropertyMap::from([0xB0, 0x80]);
        assert_eq!(map.to_edt().unwrap(), vec![0x02, 0x80, 0xB0]);
    }

    #[test]
    fn bitmap_cannot_hold_low_codes() {
        let mut map: PropertyMap = (0x80..0x90).collect();
        map.insert(0x10);
        assert_eq!(map.to_edt().unwrap_err(), EncodeError::ValueOutOfRange);
    }

    #[test]
    fn truncated_maps_fail() {
        assert_eq!(
            PropertyMap::decode(&[]).unwrap_err(),
            DecodeError::UnexpectedEof
        );
        assert_eq!(
            PropertyMap::decode(&[0x03, 0x80]).unwrap_err(),
            DecodeError::UnexpectedEof
        );
        assert_eq!(
            PropertyMap::decode(&[0x10, 0x01]).unwrap_err(),
            DecodeError::UnexpectedEof
        );
    }
}
