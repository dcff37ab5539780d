// Random telemetry for the simulation: start-up usage, per-tick jitter, fake heartbeats.

use std::ops::Range;

use rand::Rng;

pub const USAGE_MIN: f64 = 0.0;
pub const USAGE_MAX: f64 = 100.0;

pub const SERVER_CPU_START: Range<f64> = 10.0..40.0;
pub const SERVER_RAM_START: Range<f64> = 20.0..60.0;
pub const CONTAINER_CPU_START: Range<f64> = 5.0..30.0;
pub const CONTAINER_RAM_START: Range<f64> = 10.0..50.0;
pub const AGENT_CPU_START: Range<f64> = 0.5..5.0;
pub const AGENT_RAM_START: Range<f64> = 1.0..8.0;

/// Max absolute change per jitter tick.
pub const CPU_JITTER: f64 = 5.0;
pub const RAM_JITTER: f64 = 3.0;

/// Elapsed-seconds window the fake heartbeat string is drawn from.
pub const HEARTBEAT_MAX_SECS: u64 = 30;

pub fn clamp_usage(value: f64) -> f64 {
    if value.is_nan() {
        return USAGE_MIN;
    }
    value.clamp(USAGE_MIN, USAGE_MAX)
}

pub fn random_usage<R: Rng>(rng: &mut R, range: Range<f64>) -> f64 {
    clamp_usage(rng.random_range(range))
}

/// Adds a uniform delta in `[-max_delta, max_delta]` and clamps to [0, 100].
pub fn jitter<R: Rng>(rng: &mut R, value: f64, max_delta: f64) -> f64 {
    clamp_usage(value + rng.random_range(-max_delta..=max_delta))
}

pub fn format_heartbeat(elapsed_secs: u64) -> String {
    match elapsed_secs {
        0 => "just now".into(),
        s if s < 60 => format!("{}s ago", s),
        s if s < 3600 => format!("{}m ago", s / 60),
        s => format!("{}h ago", s / 3600),
    }
}

/// Plausible-looking "time since heartbeat"; not derived from real time.
pub fn random_heartbeat<R: Rng>(rng: &mut R) -> String {
    format_heartbeat(rng.random_range(1..=HEARTBEAT_MAX_SECS))
}

const OS_CHOICES: &[&str] = &[
    "Ubuntu 22.04 LTS",
    "Ubuntu 24.04 LTS",
    "Debian 12",
    "Rocky Linux 9",
    "Alpine 3.19",
];

pub fn random_os<R: Rng>(rng: &mut R) -> String {
    OS_CHOICES[rng.random_range(0..OS_CHOICES.len())].to_string()
}

/// Random public-looking IPv4 address.
pub fn random_ip<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.random_range(11..=223u8),
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(1..=254u8)
    )
}
