//! Domain layer
//!
//! Read-only views over mesh objects and the small value types the checkers
//! share. Nothing here performs I/O or holds state across calls.

pub mod host;
pub mod mtls;
pub mod object;
pub mod selector;

pub use host::{HostResolver, KubernetesHostResolver, ResolvedHost};
pub use mtls::{
    destination_rule_mode_for_host, mesh_wide_destination_rule_mode,
    namespace_wide_destination_rule_mode, peer_authentication_mode, MtlsMode, MtlsStatus,
};
pub use object::{MeshObject, ObjectKind, ObjectMeta};
pub use selector::canonical_selector;
