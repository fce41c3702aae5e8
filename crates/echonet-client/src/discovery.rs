use crate::ClientError;
use echonet_core::types::Eoj;
use echonet_datalink::NodeAddress;

/// One discovered object instance, in the shape the configuration flow
/// persists.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceRecord {
    pub host: NodeAddress,
    pub eojgc: u8,
    pub eojcc: u8,
    pub eojci: u8,
    /// Readable EPCs, ascending.
    pub getmap: Vec<u8>,
    /// Writable EPCs, ascending.
    pub setmap: Vec<u8>,
    /// Raw identification number; empty when the device reported none.
    pub uid: Vec<u8>,
    /// Vendor name, or `"ECHONETLite"` when the code is unknown.
    pub manufacturer: String,
}

impl InstanceRecord {
    pub fn eoj(&self) -> Eoj {
        Eoj::new(self.eojgc, self.eojcc, self.eojci)
    }
}

/// The request an instance failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    PropertyMaps,
    Identification,
}

#[derive(Debug)]
pub struct InstanceFailure {
    pub eoj: Eoj,
    pub stage: FetchStage,
    pub error: ClientError,
}

/// Full outcome of a host discovery: the instances that completed plus the
/// ones that were skipped.
#[derive(Debug)]
pub struct HostDiscovery {
    pub host: NodeAddress,
    pub records: Vec<InstanceRecord>,
    pub failures: Vec<InstanceFailure>,
}

/// Progress of one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    NotStarted,
    AwaitingDiscovery,
    EnumeratingInstances,
    FetchingMaps,
    FetchingIdentification,
    Complete,
    TimedOut,
    Failed,
}

impl DiscoveryPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::TimedOut | Self::Failed)
    }

    pub fn can_advance_to(self, next: Self) -> bool {
        use DiscoveryPhase::*;
        match (self, next) {
            (from, TimedOut | Failed) => !from.is_terminal(),
            (NotStarted, AwaitingDiscovery) => true,
            (AwaitingDiscovery, EnumeratingInstances) => true,
            (EnumeratingInstances, FetchingMaps | Complete) => true,
            // Skipping an instance or moving to the next one starts over
            // at the map request.
            (FetchingMaps, FetchingMaps | FetchingIdentification | Complete) => true,
            (FetchingIdentification, FetchingMaps | Complete) => true,
            _ => false,
        }
    }
}

/// Tracks the phase of a run against one host.
#[derive(Debug)]
pub(crate) struct DiscoveryRun {
    host: NodeAddress,
    phase: DiscoveryPhase,
}

impl DiscoveryRun {
    pub(crate) fn new(host: NodeAddress) -> Self {
        Self {
            host,
            phase: DiscoveryPhase::NotStarted,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: DiscoveryPhase) {
        if !self.phase.can_advance_to(next) {
            log::debug!(
                "{} - ignoring discovery transition {:?} -> {:?}",
                self.host,
                self.phase,
                next
            );
            return;
        }
        log::debug!("{} - discovery {:?} -> {:?}", self.host, self.phase, next);
        self.phase = next;
    }
}
