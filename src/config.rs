use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub integrity: IntegrityConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    /// Writer flushes at least this often (buffered keys are coalesced, last write wins).
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Flush early once this many distinct keys are buffered.
    #[serde(default = "default_max_pending_writes")]
    pub max_pending_writes: usize,
}

fn default_flush_interval_ms() -> u64 {
    500
}

fn default_max_pending_writes() -> usize {
    16
}

/// Timers of the simulated backend. All have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_telemetry_interval_ms")]
    pub telemetry_interval_ms: u64,
    #[serde(default = "default_domain_sweep_interval_secs")]
    pub domain_sweep_interval_secs: u64,
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
    #[serde(default = "default_ssl_activation_delay_ms")]
    pub ssl_activation_delay_ms: u64,
    #[serde(default = "default_ssl_validity_days")]
    pub ssl_validity_days: u32,
    #[serde(default = "default_seed_step_delay_ms")]
    pub seed_step_delay_ms: u64,
}

fn default_telemetry_interval_ms() -> u64 {
    3000
}

fn default_domain_sweep_interval_secs() -> u64 {
    60
}

fn default_restart_delay_ms() -> u64 {
    2000
}

fn default_ssl_activation_delay_ms() -> u64 {
    5000
}

fn default_ssl_validity_days() -> u32 {
    90
}

fn default_seed_step_delay_ms() -> u64 {
    500
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: default_telemetry_interval_ms(),
            domain_sweep_interval_secs: default_domain_sweep_interval_secs(),
            restart_delay_ms: default_restart_delay_ms(),
            ssl_activation_delay_ms: default_ssl_activation_delay_ms(),
            ssl_validity_days: default_ssl_validity_days(),
            seed_step_delay_ms: default_seed_step_delay_ms(),
        }
    }
}

impl SimulationConfig {
    pub fn restart_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.restart_delay_ms)
    }

    pub fn ssl_activation_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ssl_activation_delay_ms)
    }

    pub fn ssl_validity(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.ssl_validity_days))
    }

    pub fn seed_step_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.seed_step_delay_ms)
    }
}

/// What happens to dependents when a workspace, server or container is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    #[default]
    Cascade,
    Restrict,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrityConfig {
    #[serde(default)]
    pub on_delete: DeletePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of telemetry snapshots kept in the broadcast channel for /ws/telemetry (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (entity counts, ws clients, storage writes) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.storage.path.is_empty(),
            "storage.path must be non-empty"
        );
        anyhow::ensure!(
            self.storage.flush_interval_ms > 0,
            "storage.flush_interval_ms must be > 0, got {}",
            self.storage.flush_interval_ms
        );
        anyhow::ensure!(
            self.storage.max_pending_writes > 0,
            "storage.max_pending_writes must be > 0, got {}",
            self.storage.max_pending_writes
        );
        anyhow::ensure!(
            self.simulation.telemetry_interval_ms > 0,
            "simulation.telemetry_interval_ms must be > 0, got {}",
            self.simulation.telemetry_interval_ms
        );
        anyhow::ensure!(
            self.simulation.domain_sweep_interval_secs > 0,
            "simulation.domain_sweep_interval_secs must be > 0, got {}",
            self.simulation.domain_sweep_interval_secs
        );
        anyhow::ensure!(
            self.simulation.ssl_validity_days > 0,
            "simulation.ssl_validity_days must be > 0, got {}",
            self.simulation.ssl_validity_days
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
