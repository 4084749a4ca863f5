mod dashmap_identity_index;
mod identity_directory;
mod ip_command_stat_source;
mod kubernetes_identity_source;

pub use dashmap_identity_index::IdentityIndex;
pub use identity_directory::IdentityDirectory;
pub use ip_command_stat_source::IpCommandStatSource;
pub use kubernetes_identity_source::{connect, KubernetesIdentitySource, ToIdentity};
