//! Per-host device state shared between the receive loop and discovery runs.
//!
//! All hosts live behind one [`tokio::sync::RwLock`]. Mutations apply under a
//! single write guard and snapshots clone under a single read guard, so a
//! reader never sees half of an update. Each host also owns a `watch`
//! channel that flips to `true` once the host has answered with an instance
//! list; [`DeviceStateStore::wait_discovered`] parks on it.

use echonet_core::frame::Frame;
use echonet_core::services::identification::manufacturer_of;
use echonet_core::services::instance_list::InstanceList;
use echonet_core::types::{epc, Eoj, Esv, PropertyMap};
use echonet_datalink::NodeAddress;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::timeout;

/// Everything known about one object instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceState {
    pub get_map: Option<PropertyMap>,
    pub set_map: Option<PropertyMap>,
    pub announce_map: Option<PropertyMap>,
    /// Raw EDT of the identification number (EPC `0x83`).
    pub uid: Option<Vec<u8>>,
    /// Raw EDT of the manufacturer code (EPC `0x8A`).
    pub manufacturer: Option<Vec<u8>>,
    /// Last non-empty EDT seen per EPC.
    pub properties: BTreeMap<u8, Vec<u8>>,
}

impl InstanceState {
    /// Get and set maps are both known; later map responses are ignored.
    pub fn maps_complete(&self) -> bool {
        self.get_map.is_some() && self.set_map.is_some()
    }

    /// Raw manufacturer code: EPC `0x8A` when reported, otherwise the code
    /// embedded in a `0xFE`-form identification number.
    pub fn manufacturer_code(&self) -> Option<Vec<u8>> {
        if let Some(raw) = &self.manufacturer {
            return Some(raw.clone());
        }
        let code = manufacturer_of(self.uid.as_deref()?)?;
        Some(code.raw().to_be_bytes()[1..].to_vec())
    }

    fn set_get_map(&mut self, map: PropertyMap) {
        if !self.maps_complete() {
            self.get_map = Some(map);
        }
    }

    fn set_set_map(&mut self, map: PropertyMap) {
        if !self.maps_complete() {
            self.set_map = Some(map);
        }
    }
}

/// State of one host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEntry {
    pub discovered: bool,
    /// Device objects, ordered by group, class, instance. The node profile is
    /// kept apart in `node_profile`.
    pub instances: BTreeMap<Eoj, InstanceState>,
    /// Last non-empty EDT per EPC reported by the node profile object.
    pub node_profile: BTreeMap<u8, Vec<u8>>,
}

impl HostEntry {
    pub fn instance_mut(&mut self, eoj: Eoj) -> &mut InstanceState {
        self.instances.entry(eoj).or_default()
    }

    fn record_instances(&mut self, list: &InstanceList) {
        for eoj in &list.instances {
            if !eoj.is_node_profile() {
                self.instances.entry(*eoj).or_default();
            }
        }
    }
}

#[derive(Debug)]
struct HostSlot {
    entry: HostEntry,
    signal: watch::Sender<bool>,
}

impl Default for HostSlot {
    fn default() -> Self {
        Self {
            entry: HostEntry::default(),
            signal: watch::channel(false).0,
        }
    }
}

impl HostSlot {
    fn publish(&self) {
        let discovered = self.entry.discovered;
        self.signal.send_if_modified(|current| {
            if *current == discovered {
                false
            } else {
                *current = discovered;
                true
            }
        });
    }
}

/// Shared, cloneable handle to the state of every host seen so far.
#[derive(Debug, Clone, Default)]
pub struct DeviceStateStore {
    hosts: Arc<RwLock<HashMap<NodeAddress, HostSlot>>>,
}

impl DeviceStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `f` to the entry for `host` under one write guard, creating
    /// the entry if needed, then publishes the discovered flag.
    pub async fn update<R>(&self, host: NodeAddress, f: impl FnOnce(&mut HostEntry) -> R) -> R {
        let mut hosts = self.hosts.write().await;
        let slot = hosts.entry(host).or_default();
        let out = f(&mut slot.entry);
        slot.publish();
        out
    }

    pub async fn mark_discovered(&self, host: NodeAddress) {
        self.update(host, |entry| entry.discovered = true).await;
    }

    pub async fn record_instance(&self, host: NodeAddress, eoj: Eoj) {
        if eoj.is_node_profile() {
            return;
        }
        self.update(host, |entry| {
            entry.instance_mut(eoj);
        })
        .await;
    }

    pub async fn set_get_map(&self, host: NodeAddress, eoj: Eoj, map: PropertyMap) {
        self.update(host, |entry| entry.instance_mut(eoj).set_get_map(map))
            .await;
    }

    pub async fn set_set_map(&self, host: NodeAddress, eoj: Eoj, map: PropertyMap) {
        self.update(host, |entry| entry.instance_mut(eoj).set_set_map(map))
            .await;
    }

    pub async fn set_announce_map(&self, host: NodeAddress, eoj: Eoj, map: PropertyMap) {
        self.update(host, |entry| entry.instance_mut(eoj).announce_map = Some(map))
            .await;
    }

    /// Records identification data. `None` leaves the stored value alone.
    pub async fn set_identification(
        &self,
        host: NodeAddress,
        eoj: Eoj,
        uid: Option<Vec<u8>>,
        manufacturer: Option<Vec<u8>>,
    ) {
        self.update(host, |entry| {
            let state = entry.instance_mut(eoj);
            if uid.is_some() {
                state.uid = uid;
            }
            if manufacturer.is_some() {
                state.manufacturer = manufacturer;
            }
        })
        .await;
    }

    pub async fn record_property(&self, host: NodeAddress, eoj: Eoj, epc: u8, edt: Vec<u8>) {
        self.update(host, |entry| {
            if eoj.is_node_profile() {
                entry.node_profile.insert(epc, edt);
            } else {
                entry.instance_mut(eoj).properties.insert(epc, edt);
            }
        })
        .await;
    }

    pub async fn is_discovered(&self, host: NodeAddress) -> bool {
        self.hosts
            .read()
            .await
            .get(&host)
            .is_some_and(|slot| slot.entry.discovered)
    }

    /// Device objects of `host`, sorted by group, class, instance.
    pub async fn instances_of(&self, host: NodeAddress) -> Vec<Eoj> {
        self.hosts
            .read()
            .await
            .get(&host)
            .map(|slot| slot.entry.instances.keys().copied().collect())
            .unwrap_or_default()
    }

    pub async fn snapshot(&self, host: NodeAddress, eoj: Eoj) -> Option<InstanceState> {
        self.hosts
            .read()
            .await
            .get(&host)
            .and_then(|slot| slot.entry.instances.get(&eoj).cloned())
    }

    pub async fn host_entry(&self, host: NodeAddress) -> Option<HostEntry> {
        self.hosts
            .read()
            .await
            .get(&host)
            .map(|slot| slot.entry.clone())
    }

    /// Hosts that have answered with an instance list.
    pub async fn hosts(&self) -> Vec<NodeAddress> {
        let mut hosts: Vec<_> = self
            .hosts
            .read()
            .await
            .iter()
            .filter(|(_, slot)| slot.entry.discovered)
            .map(|(host, _)| *host)
            .collect();
        hosts.sort();
        hosts
    }

    /// Forgets everything about `host`. Pending waiters see `false`.
    pub async fn purge(&self, host: NodeAddress) -> bool {
        self.hosts.write().await.remove(&host).is_some()
    }

    /// Waits up to `budget` for `host` to be marked discovered.
    pub async fn wait_discovered(&self, host: NodeAddress, budget: Duration) -> bool {
        let mut rx = {
            let mut hosts = self.hosts.write().await;
            hosts.entry(host).or_default().signal.subscribe()
        };
        let wait = async { rx.wait_for(|discovered| *discovered).await.is_ok() };
        let discovered = timeout(budget, wait).await.unwrap_or(false);
        discovered
    }

    /// Folds the data carried by an inbound frame into the state of `host`.
    /// Requests carry no data and are ignored.
    pub async fn apply_frame(&self, host: NodeAddress, frame: &Frame) {
        let list = match frame.esv {
            Esv::GetRes | Esv::GetSna | Esv::Inf | Esv::InfC | Esv::InfSna => &frame.properties,
            Esv::SetGetRes | Esv::SetGetSna => &frame.get_properties,
            _ => return,
        };
        let seoj = frame.seoj;
        self.update(host, |entry| {
            for property in list.iter().filter(|p| !p.edt.is_empty()) {
                apply_property(entry, host, seoj, property.epc, &property.edt);
            }
        })
        .await;
    }
}

fn apply_property(entry: &mut HostEntry, host: NodeAddress, seoj: Eoj, code: u8, edt: &[u8]) {
    if seoj.is_node_profile() {
        if matches!(
            code,
            epc::INSTANCE_LIST_NOTIFICATION | epc::SELF_NODE_INSTANCE_LIST_S
        ) {
            match InstanceList::decode(edt) {
                Ok(list) => {
                    entry.record_instances(&list);
                    entry.discovered = true;
                }
                Err(e) => log::debug!("{host} - bad instance list 0x{code:02x}: {e}"),
            }
        }
        entry.node_profile.insert(code, edt.to_vec());
        return;
    }

    let state = entry.instance_mut(seoj);
    match code {
        epc::GET_PROPERTY_MAP | epc::SET_PROPERTY_MAP | epc::STATUS_ANNOUNCEMENT_MAP => {
            match PropertyMap::decode(edt) {
                Ok(map) if code == epc::GET_PROPERTY_MAP => state.set_get_map(map),
                Ok(map) if code == epc::SET_PROPERTY_MAP => state.set_set_map(map),
                Ok(map) => state.announce_map = Some(map),
                Err(e) => log::debug!("{host} - bad property map 0x{code:02x} on {seoj}: {e}"),
            }
        }
        epc::IDENTIFICATION_NUMBER => state.uid = Some(edt.to_vec()),
        epc::MANUFACTURER_CODE => state.manufacturer = Some(edt.to_vec()),
        _ => {}
    }
    state.properties.insert(code, edt.to_vec());
}

#[cfg(test)]
mod tests {
    use super::{DeviceStateStore, InstanceState};
    use echonet_core::frame::{Frame, Property};
    use echonet_core::types::{Eoj, Esv, PropertyMap};
    use echonet_datalink::NodeAddress;
    use std::time::Duration;

    const AIRCON: Eoj = Eoj::new(0x01, 0x30, 0x01);
    const LIGHT: Eoj = Eoj::new(0x02, 0x90, 0x01);

    fn host(s: &str) -> NodeAddress {
        s.parse().unwrap()
    }

    fn instance_list_frame(esv: Esv, epc: u8, instances: &[Eoj]) -> Frame {
        let mut edt = vec![instances.len() as u8];
        for eoj in instances {
            edt.extend_from_slice(&eoj.to_bytes());
        }
        Frame::new(1, Eoj::NODE_PROFILE, Eoj::CONTROLLER, esv).with_property(Property::new(epc, edt))
    }

    #[tokio::test]
    async fn instance_list_marks_host_discovered() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        assert!(!store.is_discovered(a).await);

        store
            .apply_frame(a, &instance_list_frame(Esv::GetRes, 0xD6, &[LIGHT, AIRCON]))
            .await;

        assert!(store.is_discovered(a).await);
        assert_eq!(store.instances_of(a).await, vec![AIRCON, LIGHT]);
        assert_eq!(store.hosts().await, vec![a]);
    }

    #[tokio::test]
    async fn unsolicited_notification_is_recorded() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        store
            .apply_frame(a, &instance_list_frame(Esv::Inf, 0xD5, &[AIRCON]))
            .await;
        assert!(store.is_discovered(a).await);
        assert_eq!(store.instances_of(a).await, vec![AIRCON]);
    }

    #[tokio::test]
    async fn requests_do_not_mutate_state() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        store
            .apply_frame(a, &instance_list_frame(Esv::SetI, 0xD6, &[AIRCON]))
            .await;
        assert!(!store.is_discovered(a).await);
        assert!(store.host_entry(a).await.is_none());
    }

    #[tokio::test]
    async fn node_profile_is_not_an_instance() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        store
            .apply_frame(
                a,
                &instance_list_frame(Esv::GetRes, 0xD6, &[Eoj::NODE_PROFILE, AIRCON]),
            )
            .await;
        store.record_instance(a, Eoj::NODE_PROFILE).await;
        assert_eq!(store.instances_of(a).await, vec![AIRCON]);
        let entry = store.host_entry(a).await.unwrap();
        assert!(entry.node_profile.contains_key(&0xD6));
    }

    #[tokio::test]
    async fn maps_and_identification_are_folded_in() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        let maps = Frame::new(2, AIRCON, Eoj::CONTROLLER, Esv::GetRes)
            .with_property(Property::new(0x9D, vec![0x01, 0x80]))
            .with_property(Property::new(0x9E, vec![0x02, 0x80, 0xB0]))
            .with_property(Property::new(0x9F, vec![0x03, 0x80, 0x83, 0x8A]));
        let ident = Frame::new(3, AIRCON, Eoj::CONTROLLER, Esv::GetRes)
            .with_property(Property::new(0x83, vec![0xFE, 0x00, 0x00, 0x0B, 0x01]))
            .with_property(Property::new(0x8A, vec![0x00, 0x00, 0x0B]));
        store.apply_frame(a, &maps).await;
        store.apply_frame(a, &ident).await;

        let state = store.snapshot(a, AIRCON).await.unwrap();
        assert_eq!(state.announce_map, Some(PropertyMap::from([0x80])));
        assert_eq!(state.set_map, Some(PropertyMap::from([0x80, 0xB0])));
        assert_eq!(state.get_map, Some(PropertyMap::from([0x80, 0x83, 0x8A])));
        assert_eq!(state.uid.as_deref(), Some(&[0xFE, 0x00, 0x00, 0x0B, 0x01][..]));
        assert_eq!(state.manufacturer_code(), Some(vec![0x00, 0x00, 0x0B]));
        assert_eq!(state.properties.get(&0x8A), Some(&vec![0x00, 0x00, 0x0B]));
    }

    #[tokio::test]
    async fn complete_maps_are_not_replaced() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        store.set_get_map(a, AIRCON, PropertyMap::from([0x80])).await;
        store.set_set_map(a, AIRCON, PropertyMap::from([0x80])).await;

        let partial = Frame::new(4, AIRCON, Eoj::CONTROLLER, Esv::GetSna)
            .with_property(Property::empty(0x9E))
            .with_property(Property::new(0x9F, vec![0x01, 0x81]));
        store.apply_frame(a, &partial).await;

        let state = store.snapshot(a, AIRCON).await.unwrap();
        assert_eq!(state.get_map, Some(PropertyMap::from([0x80])));
        assert_eq!(state.set_map, Some(PropertyMap::from([0x80])));
    }

    #[test]
    fn manufacturer_falls_back_to_identification_number() {
        let state = InstanceState {
            uid: Some(vec![0xFE, 0x00, 0x00, 0x08, 0xAA]),
            ..InstanceState::default()
        };
        assert_eq!(state.manufacturer_code(), Some(vec![0x00, 0x00, 0x08]));

        let opaque = InstanceState {
            uid: Some(vec![0x01, 0x02]),
            ..InstanceState::default()
        };
        assert_eq!(opaque.manufacturer_code(), None);
    }

    #[tokio::test]
    async fn hosts_are_isolated() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        let b = host("192.0.2.6");
        store.mark_discovered(a).await;
        store.record_instance(a, AIRCON).await;
        store
            .set_identification(b, LIGHT, Some(vec![0x01]), None)
            .await;

        assert!(!store.is_discovered(b).await);
        assert_eq!(store.instances_of(a).await, vec![AIRCON]);
        assert_eq!(store.instances_of(b).await, vec![LIGHT]);
        assert!(store.snapshot(a, LIGHT).await.is_none());
        assert_eq!(store.hosts().await, vec![a]);

        assert!(store.purge(a).await);
        assert!(store.instances_of(a).await.is_empty());
        assert_eq!(store.instances_of(b).await, vec![LIGHT]);
    }

    #[tokio::test]
    async fn wait_discovered_wakes_on_signal() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_discovered(a, Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        store.mark_discovered(a).await;
        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_discovered_gives_up_after_budget() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.9");
        let started = tokio::time::Instant::now();
        assert!(!store.wait_discovered(a, Duration::from_secs(3)).await);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(store.hosts().await.is_empty());
    }

    #[tokio::test]
    async fn already_discovered_returns_immediately() {
        let store = DeviceStateStore::new();
        let a = host("192.0.2.5");
        store.mark_discovered(a).await;
        assert!(store.wait_discovered(a, Duration::ZERO).await);
    }
}
