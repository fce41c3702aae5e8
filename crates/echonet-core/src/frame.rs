use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::{Eoj, Esv};
use crate::{DecodeError, EncodeError};
use alloc::vec;
use alloc::vec::Vec;

/// EHD1 for ECHONET Lite.
pub const EHD1_ECHONET_LITE: u8 = 0x10;
/// EHD2 for specified message format (format 1).
pub const EHD2_FORMAT1: u8 = 0x81;
/// EHD1, EHD2, TID, SEOJ, DEOJ, ESV and OPC.
pub const HEADER_LEN: usize = 12;
/// Largest property list a single OPC byte can describe.
pub const MAX_PROPERTIES: usize = 255;

/// One property entry: EPC, then PDC bytes of EDT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub epc: u8,
    pub edt: Vec<u8>,
}

impl Property {
    pub fn new(epc: u8, edt: impl Into<Vec<u8>>) -> Self {
        Self {
            epc,
            edt: edt.into(),
        }
    }

    /// An entry with no data, as sent in Get requests and returned for
    /// unavailable properties in `*_SNA` replies.
    pub const fn empty(epc: u8) -> Self {
        Self {
            epc,
            edt: Vec::new(),
        }
    }

    pub fn pdc(&self) -> usize {
        self.edt.len()
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let pdc = u8::try_from(self.edt.len()).map_err(|_| EncodeError::ValueOutOfRange)?;
        w.write_u8(self.epc)?;
        w.write_u8(pdc)?;
        w.write_all(&self.edt)
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let epc = r.read_u8()?;
        let pdc = r.read_u8()?;
        let edt = r.read_exact(usize::from(pdc))?.to_vec();
        Ok(Self { epc, edt })
    }
}

/// A format-1 ECHONET Lite frame.
///
/// `get_properties` is only carried by the SetGet family of services
/// (`0x6E`, `0x7E`, `0x5E`); for every other service it stays empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tid: u16,
    pub seoj: Eoj,
    pub deoj: Eoj,
    pub esv: Esv,
    pub properties: Vec<Property>,
    pub get_properties: Vec<Property>,
}

impl Frame {
    pub fn new(tid: u16, seoj: Eoj, deoj: Eoj, esv: Esv) -> Self {
        Self {
            tid,
            seoj,
            deoj,
            esv,
            properties: Vec::new(),
            get_properties: Vec::new(),
        }
    }

    /// A Get request for `epcs`, with empty EDTs.
    pub fn get_request(tid: u16, seoj: Eoj, deoj: Eoj, epcs: &[u8]) -> Self {
        let mut frame = Self::new(tid, seoj, deoj, Esv::Get);
        frame.properties = epcs.iter().copied().map(Property::empty).collect();
        frame
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// First entry for `epc` in the main property list.
    pub fn property(&self, epc: u8) -> Option<&Property> {
        self.properties.iter().find(|p| p.epc == epc)
    }

    /// EDT for `epc`, skipping empty entries (unavailable in `*_SNA`).
    pub fn edt(&self, epc: u8) -> Option<&[u8]> {
        self.property(epc)
            .map(|p| p.edt.as_slice())
            .filter(|edt| !edt.is_empty())
    }

    pub fn encoded_len(&self) -> usize {
        let list_len = |props: &[Property]| props.iter().map(|p| 2 + p.pdc()).sum::<usize>();
        let mut len = HEADER_LEN + list_len(self.properties.as_slice());
        if self.esv.has_get_list() {
            len += 1 + list_len(self.get_properties.as_slice());
        }
        len
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if !self.esv.has_get_list() && !self.get_properties.is_empty() {
            return Err(EncodeError::Unsupported);
        }
        w.write_u8(EHD1_ECHONET_LITE)?;
        w.write_u8(EHD2_FORMAT1)?;
        w.write_be_u16(self.tid)?;
        self.seoj.encode(w)?;
        self.deoj.encode(w)?;
        w.write_u8(self.esv.to_u8())?;
        encode_list(w, &self.properties)?;
        if self.esv.has_get_list() {
            encode_list(w, &self.get_properties)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; self.encoded_len()];
        let written = {
            let mut w = Writer::new(&mut buf);
            self.encode(&mut w)?;
            w.position()
        };
        buf.truncate(written);
        Ok(buf)
    }

    /// Decodes one frame. The buffer must hold exactly one frame; bytes
    /// after the last declared property are rejected.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_LEN {
            return Err(DecodeError::UnexpectedEof);
        }
        let mut r = Reader::new(buf);
        let ehd1 = r.read_u8()?;
        let ehd2 = r.read_u8()?;
        if ehd1 != EHD1_ECHONET_LITE || ehd2 != EHD2_FORMAT1 {
            return Err(DecodeError::InvalidHeader { ehd1, ehd2 });
        }
        let tid = r.read_be_u16()?;
        let seoj = Eoj::decode(&mut r)?;
        let deoj = Eoj::decode(&mut r)?;
        let raw_esv = r.read_u8()?;
        let esv = Esv::from_u8(raw_esv).ok_or(DecodeError::UnknownService(raw_esv))?;
        let properties = decode_list(&mut r)?;
        let get_properties = if esv.has_get_list() {
            decode_list(&mut r)?
        } else {
            Vec::new()
        };
        if !r.is_empty() {
            return Err(DecodeError::InvalidLength);
        }

        Ok(Self {
            tid,
            seoj,
            deoj,
            esv,
            properties,
            get_properties,
        })
    }
}

fn encode_list(w: &mut Writer<'_>, properties: &[Property]) -> Result<(), EncodeError> {
    if properties.len() > MAX_PROPERTIES {
        return Err(EncodeError::ValueOutOfRange);
    }
    w.write_u8(properties.len() as u8)?;
    for property in properties {
        property.encode(w)?;
    }
    Ok(())
}

fn decode_list(r: &mut Reader<'_>) -> Result<Vec<Property>, DecodeError> {
    let opc = r.read_u8()?;
    // Each entry needs at least EPC and PDC; cap the allocation by what the
    // buffer can actually hold.
    let mut out = Vec::with_capacity(usize::from(opc).min(r.remaining() / 2));
    for _ in 0..opc {
        out.push(Property::decode(r)?);
    }
    Ok(out)
}
