use crate::discovery::{
    DiscoveryPhase, DiscoveryRun, FetchStage, HostDiscovery, InstanceFailure, InstanceRecord,
};
use crate::manufacturer::{Manufacturer, ManufacturerResolver};
use crate::store::DeviceStateStore;
use crate::ClientError;
use echonet_core::frame::{Frame, Property};
use echonet_core::types::{epc, Eoj, Esv};
use echonet_datalink::udp::MAX_FRAME_LEN;
use echonet_datalink::{DataLink, NodeAddress, TransportError, UdpTransport};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// How long a host gets to answer the instance list request.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);
/// How long each property request waits for its reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

const IDENTIFICATION: [u8; 2] = [epc::IDENTIFICATION_NUMBER, epc::MANUFACTURER_CODE];

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub discovery_timeout: Duration,
    pub request_timeout: Duration,
    pub bind_addr: SocketAddr,
    /// Interface to join the ECHONET Lite multicast group on. `None` skips
    /// the join, so only unicast traffic is seen.
    pub multicast: Option<Ipv4Addr>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            bind_addr: SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                NodeAddress::ECHONET_LITE_PORT,
            ),
            multicast: Some(Ipv4Addr::UNSPECIFIED),
        }
    }
}

#[derive(Debug)]
struct PendingRequest {
    esv: Esv,
    reply: oneshot::Sender<Frame>,
}

#[derive(Debug)]
struct Shared<D> {
    datalink: D,
    store: DeviceStateStore,
    pending: Mutex<HashMap<(NodeAddress, u16), PendingRequest>>,
}

impl<D: DataLink> Shared<D> {
    /// Applies an inbound frame to the store, then hands it to the request
    /// waiting on (source, TID) if the service code answers that request.
    async fn ingest(&self, bytes: &[u8], source: NodeAddress) {
        log::trace!("{source} <- {bytes:02x?}");
        let frame = match Frame::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("{source} - dropping undecodable frame: {e}");
                return;
            }
        };
        self.store.apply_frame(source, &frame).await;

        let mut pending = self.pending.lock().await;
        match pending.entry((source, frame.tid)) {
            Entry::Occupied(slot) if slot.get().esv.accepts_reply(frame.esv) => {
                // The requester may have given up already.
                let _ = slot.remove().reply.send(frame);
            }
            _ if frame.esv.is_request() => {}
            _ => log::debug!(
                "{source} - uncorrelated {:?} tid {} from {}",
                frame.esv,
                frame.tid,
                frame.seoj
            ),
        }
    }
}

async fn receive_loop<D: DataLink>(shared: Arc<Shared<D>>) {
    let mut buf = [0u8; MAX_FRAME_LEN];
    loop {
        match shared.datalink.recv(&mut buf).await {
            Ok((n, source)) => shared.ingest(&buf[..n], source).await,
            Err(TransportError::FrameTooLarge) => log::debug!("dropping oversized datagram"),
            Err(e) => {
                log::warn!("receive failed: {e}");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

/// ECHONET Lite controller: discovers nodes and exchanges property
/// requests with them.
///
/// A background task owns the receive side of the data link for the
/// lifetime of the client; it is aborted on drop.
#[derive(Debug)]
pub struct EchonetClient<D: DataLink> {
    shared: Arc<Shared<D>>,
    next_tid: Mutex<u16>,
    resolver: ManufacturerResolver,
    discovery_timeout: Duration,
    request_timeout: Duration,
    receiver: JoinHandle<()>,
}

impl EchonetClient<UdpTransport> {
    /// Binds `0.0.0.0:3610` and joins the multicast group on the default
    /// interface.
    pub async fn new() -> Result<Self, ClientError> {
        Self::bind(ClientConfig::default()).await
    }

    pub async fn bind(config: ClientConfig) -> Result<Self, ClientError> {
        let datalink = UdpTransport::bind(config.bind_addr).await?;
        if let Some(interface) = config.multicast {
            if let Err(e) = datalink.join_multicast(interface) {
                log::warn!("could not join the ECHONET Lite multicast group on {interface}: {e}");
            }
        }
        Ok(Self::with_config(datalink, config))
    }
}

impl<D: DataLink + 'static> EchonetClient<D> {
    /// Wraps an existing data link. Must be called within a Tokio runtime.
    pub fn with_datalink(datalink: D) -> Self {
        Self::with_config(datalink, ClientConfig::default())
    }

    pub fn with_config(datalink: D, config: ClientConfig) -> Self {
        let shared = Arc::new(Shared {
            datalink,
            store: DeviceStateStore::new(),
            pending: Mutex::new(HashMap::new()),
        });
        let receiver = tokio::spawn(receive_loop(shared.clone()));
        Self {
            shared,
            next_tid: Mutex::new(1),
            resolver: ManufacturerResolver::new(),
            discovery_timeout: config.discovery_timeout,
            request_timeout: config.request_timeout,
            receiver,
        }
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_resolver(mut self, resolver: ManufacturerResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn datalink(&self) -> &D {
        &self.shared.datalink
    }

    pub fn store(&self) -> &DeviceStateStore {
        &self.shared.store
    }

    pub fn resolver(&self) -> &ManufacturerResolver {
        &self.resolver
    }

    async fn next_tid(&self) -> u16 {
        let mut lock = self.next_tid.lock().await;
        let tid = *lock;
        *lock = lock.wrapping_add(1);
        if *lock == 0 {
            *lock = 1;
        }
        tid
    }

    async fn send_frame(&self, host: NodeAddress, frame: &Frame) -> Result<(), ClientError> {
        let bytes = frame.to_bytes()?;
        log::trace!("{host} -> {bytes:02x?}");
        self.shared.datalink.send(host, &bytes).await?;
        Ok(())
    }

    /// Sends `frame` with a fresh TID and waits for the reply correlated by
    /// (host, TID). `*_SNA` replies are returned as-is.
    async fn exchange(&self, host: NodeAddress, mut frame: Frame) -> Result<Frame, ClientError> {
        if host.is_group() {
            return Err(ClientError::GroupAddress(host));
        }
        frame.tid = self.next_tid().await;
        let key = (host, frame.tid);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(
            key,
            PendingRequest {
                esv: frame.esv,
                reply: tx,
            },
        );

        let result = async {
            self.send_frame(host, &frame).await?;
            match timeout(self.request_timeout, rx).await {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(_)) | Err(_) => Err(ClientError::Timeout),
            }
        }
        .await;

        if result.is_err() {
            self.shared.pending.lock().await.remove(&key);
        }
        result
    }

    /// Asks `host` (unicast or multicast) for its instance list. Replies are
    /// folded into the store as they arrive.
    pub async fn discover(&self, host: NodeAddress) -> Result<(), ClientError> {
        let tid = self.next_tid().await;
        let frame = Frame::get_request(
            tid,
            Eoj::CONTROLLER,
            Eoj::NODE_PROFILE,
            &[epc::SELF_NODE_INSTANCE_LIST_S],
        );
        self.send_frame(host, &frame).await
    }

    /// Discovers `host` and returns one record per object instance.
    ///
    /// Instances whose requests fail are skipped; see
    /// [`discover_host_detailed`](Self::discover_host_detailed) for the
    /// failures.
    pub async fn discover_host(
        &self,
        host: NodeAddress,
    ) -> Result<Vec<InstanceRecord>, ClientError> {
        Ok(self.discover_host_detailed(host).await?.records)
    }

    pub async fn discover_host_detailed(
        &self,
        host: NodeAddress,
    ) -> Result<HostDiscovery, ClientError> {
        if host.is_group() {
            return Err(ClientError::GroupAddress(host));
        }
        let mut run = DiscoveryRun::new(host);
        run.advance(DiscoveryPhase::AwaitingDiscovery);

        if let Err(e) = self.discover(host).await {
            log::warn!("{host} - discovery request failed: {e}");
            run.advance(DiscoveryPhase::Failed);
            return Err(ClientError::CannotConnect { host });
        }
        if !self
            .shared
            .store
            .wait_discovered(host, self.discovery_timeout)
            .await
        {
            run.advance(DiscoveryPhase::TimedOut);
            return Err(ClientError::CannotConnect { host });
        }

        run.advance(DiscoveryPhase::EnumeratingInstances);
        let instances = self.shared.store.instances_of(host).await;
        log::debug!("{host} - {} instance(s) to fetch", instances.len());

        let mut records = Vec::with_capacity(instances.len());
        let mut failures = Vec::new();
        for eoj in instances {
            run.advance(DiscoveryPhase::FetchingMaps);
            match self.fetch_instance(&mut run, host, eoj).await {
                Ok(record) => records.push(record),
                Err(failure) => {
                    log::warn!(
                        "{host} - skipping {eoj}, {:?} request failed: {}",
                        failure.stage,
                        failure.error
                    );
                    failures.push(failure);
                }
            }
        }
        run.advance(DiscoveryPhase::Complete);

        Ok(HostDiscovery {
            host,
            records,
            failures,
        })
    }

    async fn fetch_instance(
        &self,
        run: &mut DiscoveryRun,
        host: NodeAddress,
        eoj: Eoj,
    ) -> Result<InstanceRecord, InstanceFailure> {
        let failed = move |stage: FetchStage| move |error: ClientError| InstanceFailure {
            eoj,
            stage,
            error,
        };

        self.exchange(host, Frame::get_request(0, Eoj::CONTROLLER, eoj, &epc::PROPERTY_MAPS))
            .await
            .map_err(failed(FetchStage::PropertyMaps))?;
        let state = self.shared.store.snapshot(host, eoj).await.unwrap_or_default();
        let getmap = state.get_map.ok_or_else(|| {
            failed(FetchStage::PropertyMaps)(ClientError::MissingPropertyMap {
                host,
                eoj,
                epc: epc::GET_PROPERTY_MAP,
            })
        })?;
        let setmap = state.set_map.unwrap_or_default();

        run.advance(DiscoveryPhase::FetchingIdentification);
        self.exchange(host, Frame::get_request(0, Eoj::CONTROLLER, eoj, &IDENTIFICATION))
            .await
            .map_err(failed(FetchStage::Identification))?;
        let state = self.shared.store.snapshot(host, eoj).await.unwrap_or_default();
        let resolved = match state.manufacturer_code() {
            Some(raw) => self.resolver.resolve(&raw),
            None => Manufacturer::Unresolved(Vec::new()),
        };
        let manufacturer = self.resolver.display_name(host, &resolved);

        Ok(InstanceRecord {
            host,
            eojgc: eoj.group,
            eojcc: eoj.class,
            eojci: eoj.instance,
            getmap: getmap.to_vec(),
            setmap: setmap.to_vec(),
            uid: state.uid.unwrap_or_default(),
            manufacturer,
        })
    }

    /// Reads `epcs` from `eoj` on `host`. Any property the device cannot
    /// serve turns the whole call into [`ClientError::ServiceNotAvailable`].
    pub async fn get_properties(
        &self,
        host: NodeAddress,
        eoj: Eoj,
        epcs: &[u8],
    ) -> Result<Vec<Property>, ClientError> {
        let reply = self
            .exchange(host, Frame::get_request(0, Eoj::CONTROLLER, eoj, epcs))
            .await?;
        match reply.esv {
            Esv::GetRes => Ok(reply.properties),
            Esv::GetSna => Err(ClientError::ServiceNotAvailable {
                esv: reply.esv,
                epcs: reply
                    .properties
                    .iter()
                    .filter(|p| p.edt.is_empty())
                    .map(|p| p.epc)
                    .collect(),
            }),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }

    /// Writes `properties` to `eoj` on `host` with a confirmed Set (SetC).
    /// Accepted values are recorded in the store.
    pub async fn set_properties(
        &self,
        host: NodeAddress,
        eoj: Eoj,
        properties: &[Property],
    ) -> Result<(), ClientError> {
        let mut frame = Frame::new(0, Eoj::CONTROLLER, eoj, Esv::SetC);
        frame.properties = properties.to_vec();
        let reply = self.exchange(host, frame).await?;
        match reply.esv {
            Esv::SetRes => {
                for property in properties {
                    self.shared
                        .store
                        .record_property(host, eoj, property.epc, property.edt.clone())
                        .await;
                }
                Ok(())
            }
            // Rejected entries echo their EDT, accepted ones come back empty.
            Esv::SetCSna => Err(ClientError::ServiceNotAvailable {
                esv: reply.esv,
                epcs: reply
                    .properties
                    .iter()
                    .filter(|p| !p.edt.is_empty())
                    .map(|p| p.epc)
                    .collect(),
            }),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }
}

impl<D: DataLink> Drop for EchonetClient<D> {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}
