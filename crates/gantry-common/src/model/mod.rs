//! Domain model: desired specs, the capability catalog, and observed state

pub mod catalog;
pub mod cluster;
pub mod observed;

pub use catalog::{
    LifecycleState, MachineTypeOption, ProviderOptions, SupportedImage, SupportedVersion,
    VolumeTypeOption, ZoneOption,
};
pub use cluster::{
    AclExtension, ClusterSpec, Extensions, HibernationSchedule, MachineImage, MaintenanceWindow,
    NodePoolSpec, ObservabilityExtension, Taint, TaintEffect,
};
pub use observed::{ClusterHealth, CredentialsBundle, ObservedState};
