// Service identity baked in at build time

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Plain-text greeting served on `GET /`.
pub fn banner() -> String {
    format!("{} {} - simulated CorsiHub backend", NAME, VERSION)
}
