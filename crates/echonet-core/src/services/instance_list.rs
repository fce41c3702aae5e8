use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::Eoj;
use crate::{DecodeError, EncodeError};
use alloc::vec::Vec;

/// Most instances a single instance-list EDT can carry.
pub const MAX_LISTED_INSTANCES: usize = 84;

/// Payload of node profile EPC `0xD5` (instance list notification) and
/// `0xD6` (self-node instance list S): a count byte followed by 3-byte EOJs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceList {
    pub instances: Vec<Eoj>,
}

impl InstanceList {
    pub fn new(instances: Vec<Eoj>) -> Self {
        Self { instances }
    }

    /// Decodes the list. A node with more than 84 instances reports the
    /// full count but lists only the first 84.
    pub fn decode(edt: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(edt);
        let count = usize::from(r.read_u8()?).min(MAX_LISTED_INSTANCES);
        let mut instances = Vec::with_capacity(count);
        for _ in 0..count {
            instances.push(Eoj::decode(&mut r)?);
        }
        Ok(Self { instances })
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if self.instances.len() > MAX_LISTED_INSTANCES {
            return Err(EncodeError::ValueOutOfRange);
        }
        w.write_u8(self.instances.len() as u8)?;
        for eoj in &self.instances {
            eoj.encode(w)?;
        }
        Ok(())
    }

    pub fn to_edt(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = [0u8; 1 + MAX_LISTED_INSTANCES * 3];
        let mut w = Writer::new(&mut buf);
        self.encode(&mut w)?;
        Ok(w.as_written().to_vec())
    }
}
