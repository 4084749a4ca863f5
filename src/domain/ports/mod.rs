mod identity_source;
mod ip_resolver;
mod stat_source;

pub use identity_source::IdentitySource;
pub use ip_resolver::IpResolver;
pub use stat_source::StatSource;
