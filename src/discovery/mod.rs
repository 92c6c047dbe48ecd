pub mod alias_resolver;
pub mod secrets;

pub use alias_resolver::AliasResolver;
pub use secrets::{EnvSecretStore, SecretStore, StaticSecretStore};
