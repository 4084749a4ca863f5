//! IP Resolver Port
//!
//! Defines the interface for turning endpoint IPs into readable identities.

/// Resolver for IP address to human-readable identity.
///
/// This is an outbound port consulted once per endpoint per record on every
/// collection. Implementations must answer from memory without blocking.
pub trait IpResolver: Send + Sync {
    /// Resolve an IP address to an identity such as `namespace/name`.
    ///
    /// Returns the input unchanged when the IP is unknown. An unknown IP is
    /// the normal case for traffic leaving the cluster.
    fn resolve(&self, ip: &str) -> String;
}
