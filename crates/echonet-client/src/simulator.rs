//! Lightweight simulated ECHONET Lite node.
//!
//! [`SimulatedNode`] hosts a node profile plus any number of device objects
//! and answers Get, SetC, SetI and INF_REQ requests. Property maps, the
//! instance list and identification data are derived from the configured
//! objects. Useful for testing and development without physical hardware.

use crate::ClientError;
use echonet_core::encoding::writer::Writer;
use echonet_core::frame::{Frame, Property};
use echonet_core::services::identification::{IdentificationNumber, UNIQUE_ID_LEN};
use echonet_core::services::instance_list::InstanceList;
use echonet_core::types::{epc, Eoj, Esv, ManufacturerCode, PropertyMap};
use echonet_datalink::udp::MAX_FRAME_LEN;
use echonet_datalink::{DataLink, NodeAddress};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct SimulatedObject {
    properties: BTreeMap<u8, Vec<u8>>,
    settable: BTreeSet<u8>,
}

/// A simulated ECHONET Lite node.
pub struct SimulatedNode<D: DataLink> {
    manufacturer: ManufacturerCode,
    objects: Arc<RwLock<BTreeMap<Eoj, SimulatedObject>>>,
    datalink: D,
}

impl<D: DataLink> SimulatedNode<D> {
    pub fn new(manufacturer: ManufacturerCode, datalink: D) -> Self {
        Self {
            manufacturer,
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            datalink,
        }
    }

    pub fn datalink(&self) -> &D {
        &self.datalink
    }

    /// Adds a device object. Codes in `settable` accept SetC/SetI; every
    /// code in `properties` is readable.
    pub async fn add_object(
        &self,
        eoj: Eoj,
        properties: impl IntoIterator<Item = (u8, Vec<u8>)>,
        settable: &[u8],
    ) {
        let object = SimulatedObject {
            properties: properties.into_iter().collect(),
            settable: settable.iter().copied().collect(),
        };
        self.objects.write().await.insert(eoj, object);
    }

    /// Changes a property locally, as the device itself would.
    pub async fn set_property(&self, eoj: Eoj, epc: u8, edt: Vec<u8>) {
        if let Some(object) = self.objects.write().await.get_mut(&eoj) {
            object.properties.insert(epc, edt);
        }
    }

    pub async fn property(&self, eoj: Eoj, epc: u8) -> Option<Vec<u8>> {
        let objects = self.objects.read().await;
        self.read(&objects, eoj, epc)
    }

    /// Sends an instance list notification (INF, EPC `0xD5`) to `target`,
    /// as a node does when it joins the network.
    pub async fn announce(&self, target: NodeAddress) -> Result<(), ClientError> {
        let edt = {
            let objects = self.objects.read().await;
            self.instance_list(&objects)?
        };
        let frame = Frame::new(0, Eoj::NODE_PROFILE, Eoj::NODE_PROFILE, Esv::Inf)
            .with_property(Property::new(epc::INSTANCE_LIST_NOTIFICATION, edt));
        self.datalink.send(target, &frame.to_bytes()?).await?;
        Ok(())
    }

    /// Run the node loop, responding to incoming requests until the data
    /// link fails.
    pub async fn run(&self) -> Result<(), ClientError> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        loop {
            let (n, source) = self.datalink.recv(&mut buf).await?;
            if let Err(e) = self.handle_frame(&buf[..n], source).await {
                log::debug!("simulator: error handling frame from {source}: {e}");
            }
        }
    }

    async fn handle_frame(&self, bytes: &[u8], source: NodeAddress) -> Result<(), ClientError> {
        let request = Frame::decode(bytes)?;
        if !request.esv.is_request() {
            return Ok(());
        }
        for target in self.targets(request.deoj).await {
            let reply = match request.esv {
                Esv::Get | Esv::InfReq => self.handle_get(&request, target).await,
                Esv::SetC | Esv::SetI => self.handle_set(&request, target).await,
                _ => None,
            };
            if let Some(reply) = reply {
                self.datalink.send(source, &reply.to_bytes()?).await?;
            }
        }
        Ok(())
    }

    /// Objects addressed by `deoj`. Instance code `0x00` addresses every
    /// instance of the class.
    async fn targets(&self, deoj: Eoj) -> Vec<Eoj> {
        if deoj.is_node_profile() {
            return vec![Eoj::NODE_PROFILE];
        }
        let objects = self.objects.read().await;
        objects
            .keys()
            .copied()
            .filter(|eoj| {
                eoj.class_code() == deoj.class_code()
                    && (deoj.instance == 0 || eoj.instance == deoj.instance)
            })
            .collect()
    }

    async fn handle_get(&self, request: &Frame, target: Eoj) -> Option<Frame> {
        let objects = self.objects.read().await;
        let (ok, sna) = match request.esv {
            Esv::Get => (Esv::GetRes, Esv::GetSna),
            _ => (Esv::Inf, Esv::InfSna),
        };
        let mut reply = Frame::new(request.tid, target, request.seoj, ok);
        for wanted in &request.properties {
            match self.read(&objects, target, wanted.epc) {
                Some(edt) => reply.properties.push(Property::new(wanted.epc, edt)),
                None => {
                    reply.esv = sna;
                    reply.properties.push(Property::empty(wanted.epc));
                }
            }
        }
        Some(reply)
    }

    async fn handle_set(&self, request: &Frame, target: Eoj) -> Option<Frame> {
        let mut objects = self.objects.write().await;
        let object = objects.get_mut(&target)?;
        let (ok, sna) = match request.esv {
            Esv::SetC => (Some(Esv::SetRes), Esv::SetCSna),
            _ => (None, Esv::SetISna),
        };
        let mut rejected = false;
        let mut properties = Vec::with_capacity(request.properties.len());
        for entry in &request.properties {
            if object.settable.contains(&entry.epc) && !entry.edt.is_empty() {
                object.properties.insert(entry.epc, entry.edt.clone());
                properties.push(Property::empty(entry.epc));
            } else {
                rejected = true;
                properties.push(entry.clone());
            }
        }
        let esv = if rejected { sna } else { ok? };
        let mut reply = Frame::new(request.tid, target, request.seoj, esv);
        reply.properties = properties;
        Some(reply)
    }

    fn read(
        &self,
        objects: &BTreeMap<Eoj, SimulatedObject>,
        eoj: Eoj,
        code: u8,
    ) -> Option<Vec<u8>> {
        if eoj.is_node_profile() {
            return match code {
                epc::INSTANCE_LIST_NOTIFICATION | epc::SELF_NODE_INSTANCE_LIST_S => {
                    self.instance_list(objects).ok()
                }
                epc::IDENTIFICATION_NUMBER => self.identification(eoj).ok(),
                epc::MANUFACTURER_CODE => Some(self.manufacturer_edt()),
                epc::GET_PROPERTY_MAP => PropertyMap::from([
                    epc::IDENTIFICATION_NUMBER,
                    epc::MANUFACTURER_CODE,
                    epc::STATUS_ANNOUNCEMENT_MAP,
                    epc::SET_PROPERTY_MAP,
                    epc::GET_PROPERTY_MAP,
                    epc::INSTANCE_LIST_NOTIFICATION,
                    epc::SELF_NODE_INSTANCE_LIST_S,
                ])
                .to_edt()
                .ok(),
                epc::SET_PROPERTY_MAP => PropertyMap::new().to_edt().ok(),
                epc::STATUS_ANNOUNCEMENT_MAP => {
                    PropertyMap::from([epc::INSTANCE_LIST_NOTIFICATION]).to_edt().ok()
                }
                _ => None,
            };
        }

        let object = objects.get(&eoj)?;
        if let Some(edt) = object.properties.get(&code) {
            return Some(edt.clone());
        }
        match code {
            epc::IDENTIFICATION_NUMBER => self.identification(eoj).ok(),
            epc::MANUFACTURER_CODE => Some(self.manufacturer_edt()),
            epc::SET_PROPERTY_MAP => object
                .settable
                .iter()
                .copied()
                .collect::<PropertyMap>()
                .to_edt()
                .ok(),
            epc::STATUS_ANNOUNCEMENT_MAP => PropertyMap::new().to_edt().ok(),
            epc::GET_PROPERTY_MAP => {
                let mut map: PropertyMap = object.properties.keys().copied().collect();
                for code in [
                    epc::IDENTIFICATION_NUMBER,
                    epc::MANUFACTURER_CODE,
                    epc::STATUS_ANNOUNCEMENT_MAP,
                    epc::SET_PROPERTY_MAP,
                    epc::GET_PROPERTY_MAP,
                ] {
                    map.insert(code);
                }
                map.to_edt().ok()
            }
            _ => None,
        }
    }

    fn instance_list(
        &self,
        objects: &BTreeMap<Eoj, SimulatedObject>,
    ) -> Result<Vec<u8>, ClientError> {
        Ok(InstanceList::new(objects.keys().copied().collect()).to_edt()?)
    }

    fn manufacturer_edt(&self) -> Vec<u8> {
        self.manufacturer.raw().to_be_bytes()[1..].to_vec()
    }

    /// `0xFE`, the manufacturer code, then the EOJ zero-padded to 13 bytes.
    fn identification(&self, eoj: Eoj) -> Result<Vec<u8>, ClientError> {
        let mut unique_id = eoj.to_bytes().to_vec();
        unique_id.resize(UNIQUE_ID_LEN, 0x00);
        let id = IdentificationNumber {
            manufacturer: self.manufacturer,
            unique_id,
        };
        let mut buf = [0u8; 1 + 3 + UNIQUE_ID_LEN];
        let mut w = Writer::new(&mut buf);
        id.encode(&mut w)?;
        Ok(w.as_written().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedNode;
    use echonet_core::frame::{Frame, Property};
    use echonet_core::services::identification::IdentificationNumber;
    use echonet_core::services::instance_list::InstanceList;
    use echonet_core::types::{epc, Eoj, Esv, ManufacturerCode, PropertyMap};
    use echonet_datalink::{DataLink, NodeAddress, TransportError};
    use std::sync::Mutex;

    const AIRCON: Eoj = Eoj::new(0x01, 0x30, 0x01);

    /// Records every sent frame; never receives.
    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(NodeAddress, Vec<u8>)>>,
    }

    impl DataLink for Outbox {
        async fn send(&self, address: NodeAddress, payload: &[u8]) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((address, payload.to_vec()));
            Ok(())
        }

        async fn recv(&self, _buf: &mut [u8]) -> Result<(usize, NodeAddress), TransportError> {
            std::future::pending().await
        }
    }

    fn controller() -> NodeAddress {
        "192.0.2.1".parse().unwrap()
    }

    async fn node() -> SimulatedNode<Outbox> {
        let node = SimulatedNode::new(ManufacturerCode::new(0x0B).unwrap(), Outbox::default());
        node.add_object(AIRCON, [(0x80, vec![0x30]), (0xB0, vec![0x41])], &[0x80, 0xB0])
            .await;
        node
    }

    async fn roundtrip(node: &SimulatedNode<Outbox>, request: Frame) -> Vec<Frame> {
        node.handle_frame(&request.to_bytes().unwrap(), controller())
            .await
            .unwrap();
        node.datalink()
            .sent
            .lock()
            .unwrap()
            .drain(..)
            .map(|(_, bytes)| Frame::decode(&bytes).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn answers_instance_list() {
        let node = node().await;
        let request = Frame::get_request(7, Eoj::CONTROLLER, Eoj::NODE_PROFILE, &[0xD6]);
        let replies = roundtrip(&node, request).await;
        assert_eq!(replies.len(), 1);
        let reply = &replies[0];
        assert_eq!(reply.esv, Esv::GetRes);
        assert_eq!(reply.tid, 7);
        assert_eq!(reply.seoj, Eoj::NODE_PROFILE);
        let list = InstanceList::decode(reply.edt(0xD6).unwrap()).unwrap();
        assert_eq!(list.instances, vec![AIRCON]);
    }

    #[tokio::test]
    async fn derives_maps_and_identification() {
        let node = node().await;
        let request = Frame::get_request(
            8,
            Eoj::CONTROLLER,
            AIRCON,
            &[0x9E, 0x9F, epc::IDENTIFICATION_NUMBER, epc::MANUFACTURER_CODE],
        );
        let reply = roundtrip(&node, request).await.remove(0);
        assert_eq!(reply.esv, Esv::GetRes);
        assert_eq!(
            PropertyMap::decode(reply.edt(0x9E).unwrap()).unwrap(),
            PropertyMap::from([0x80, 0xB0])
        );
        let get_map = PropertyMap::decode(reply.edt(0x9F).unwrap()).unwrap();
        assert!(get_map.contains(0x80) && get_map.contains(0x8A) && get_map.contains(0x9F));
        let id = IdentificationNumber::decode(reply.edt(0x83).unwrap()).unwrap();
        assert_eq!(id.manufacturer.raw(), 0x0B);
        assert_eq!(reply.edt(0x8A), Some(&[0x00, 0x00, 0x0B][..]));
    }

    #[tokio::test]
    async fn unknown_property_yields_sna() {
        let node = node().await;
        let request = Frame::get_request(9, Eoj::CONTROLLER, AIRCON, &[0x80, 0xF3]);
        let reply = roundtrip(&node, request).await.remove(0);
        assert_eq!(reply.esv, Esv::GetSna);
        assert_eq!(reply.edt(0x80), Some(&[0x30][..]));
        assert_eq!(reply.property(0xF3), Some(&Property::empty(0xF3)));
    }

    #[tokio::test]
    async fn set_updates_settable_properties_only() {
        let node = node().await;
        let mut request = Frame::new(10, Eoj::CONTROLLER, AIRCON, Esv::SetC);
        request.properties = vec![Property::new(0x80, vec![0x31])];
        let reply = roundtrip(&node, request).await.remove(0);
        assert_eq!(reply.esv, Esv::SetRes);
        assert_eq!(node.property(AIRCON, 0x80).await, Some(vec![0x31]));

        let mut request = Frame::new(11, Eoj::CONTROLLER, AIRCON, Esv::SetC);
        request.properties = vec![Property::new(0x81, vec![0x01])];
        let reply = roundtrip(&node, request).await.remove(0);
        assert_eq!(reply.esv, Esv::SetCSna);
        assert_eq!(reply.edt(0x81), Some(&[0x01][..]));
    }

    #[tokio::test]
    async fn accepted_set_without_response_is_silent() {
        let node = node().await;
        let mut request = Frame::new(12, Eoj::CONTROLLER, AIRCON, Esv::SetI);
        request.properties = vec![Property::new(0xB0, vec![0x42])];
        assert!(roundtrip(&node, request).await.is_empty());
        assert_eq!(node.property(AIRCON, 0xB0).await, Some(vec![0x42]));
    }

    #[tokio::test]
    async fn class_wide_request_reaches_every_instance() {
        let node = node().await;
        let second = Eoj::new(0x01, 0x30, 0x02);
        node.add_object(second, [(0x80, vec![0x31])], &[]).await;
        let request =
            Frame::get_request(13, Eoj::CONTROLLER, Eoj::new(0x01, 0x30, 0x00), &[0x80]);
        let replies = roundtrip(&node, request).await;
        let sources: Vec<_> = replies.iter().map(|f| f.seoj).collect();
        assert_eq!(sources, vec![AIRCON, second]);
    }

    #[tokio::test]
    async fn announce_sends_instance_list_notification() {
        let node = node().await;
        node.announce(NodeAddress::multicast()).await.unwrap();
        let (target, bytes) = node.datalink().sent.lock().unwrap().remove(0);
        assert_eq!(target, NodeAddress::multicast());
        let frame = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.esv, Esv::Inf);
        let list = InstanceList::decode(frame.edt(0xD5).unwrap()).unwrap();
        assert_eq!(list.instances, vec![AIRCON]);
    }
}
