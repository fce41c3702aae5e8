use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};
use core::fmt;

/// An ECHONET object identifier: class group code, class code and instance
/// code.
///
/// Ordering compares group, then class, then instance, which is the order
/// discovered instances are enumerated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Eoj {
    pub group: u8,
    pub class: u8,
    pub instance: u8,
}

impl Eoj {
    /// Node profile object, instance 1 (`0EF001`).
    pub const NODE_PROFILE: Self = Self::new(0x0E, 0xF0, 0x01);
    /// Controller device object, instance 1 (`05FF01`). Used as SEOJ for
    /// requests originated by this engine.
    pub const CONTROLLER: Self = Self::new(0x05, 0xFF, 0x01);

    pub const fn new(group: u8, class: u8, instance: u8) -> Self {
        Self {
            group,
            class,
            instance,
        }
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.group, self.class, self.instance]
    }

    /// Group and class code packed as `0xGGCC`.
    pub const fn class_code(self) -> u16 {
        ((self.group as u16) << 8) | self.class as u16
    }

    pub const fn is_node_profile(self) -> bool {
        self.group == 0x0E && self.class == 0xF0
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_all(&self.to_bytes())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b = r.read_exact(3)?;
        Ok(Self::new(b[0], b[1], b[2]))
    }
}

impl fmt::Display for Eoj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}",
            self.group, self.class, self.instance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Eoj;
    use crate::encoding::{reader::Reader, writer::Writer};

    #[test]
    fn orders_by_group_class_instance() {
        let mut eojs = [
            Eoj::new(0x02, 0x88, 0x01),
            Eoj::new(0x01, 0x30, 0x02),
            Eoj::new(0x01, 0x30, 0x01),
            Eoj::new(0x01, 0x35, 0x01),
        ];
        eojs.sort();
        assert_eq!(
            eojs,
            [
                Eoj::new(0x01, 0x30, 0x01),
                Eoj::new(0x01, 0x30, 0x02),
                Eoj::new(0x01, 0x35, 0x01),
                Eoj::new(0x02, 0x88, 0x01),
            ]
        );
    }

    #[test]
    fn encodes_three_bytes() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        Eoj::NODE_PROFILE.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x0E, 0xF0, 0x01]);

        let mut r = Reader::new(&[0x01, 0x30, 0x01]);
        let eoj = Eoj::decode(&mut r).unwrap();
        assert_eq!(eoj.class_code(), 0x0130);
        assert!(!eoj.is_node_profile());
        assert!(Eoj::NODE_PROFILE.is_node_profile());
    }

    #[test]
    fn displays_as_hex_triple() {
        assert_eq!(Eoj::CONTROLLER.to_string(), "05ff01");
    }
}
