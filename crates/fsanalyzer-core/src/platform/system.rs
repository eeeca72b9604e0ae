/// Host information logged once at startup.
use crate::config::GatewayConfig;
use crate::model::size::format_size;
use sysinfo::System;
use tracing::info;

/// Number of logical processors visible to this process.
pub fn available_parallelism() -> usize {
    num_cpus::get()
}

/// Memory figures of the host, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub free: u64,
}

pub fn memory_info() -> MemoryInfo {
    let mut sys = System::new();
    sys.refresh_memory();
    MemoryInfo {
        total: sys.total_memory(),
        available: sys.available_memory(),
        free: sys.free_memory(),
    }
}

/// Log the OS, processor counts, memory and the effective pool settings.
pub fn log_system_info(config: &GatewayConfig) {
    let memory = memory_info();
    info!(
        os = System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
        arch = std::env::consts::ARCH,
        logical_cpus = num_cpus::get(),
        physical_cpus = num_cpus::get_physical(),
        total_memory = %format_size(memory.total),
        available_memory = %format_size(memory.available),
        free_memory = %format_size(memory.free),
        workers = config.workers,
        grace_period_secs = config.grace_period.as_secs_f64(),
        "System information"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_parallelism_is_positive() {
        assert!(available_parallelism() >= 1);
    }

    #[test]
    fn system_info_logs_without_a_subscriber() {
        let _ = memory_info();
        log_system_info(&GatewayConfig::default());
    }
}
