use serde::Serialize;
use sysinfo::System;

/// Load generator host, recorded next to the results so runs from different
/// machines can be told apart.
#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
    pub hostname: Option<String>,
    pub cpu_cores: u64,
    pub total_memory_mb: u64,
    pub available_memory_mb: u64,
}

pub fn get_hardware_info() -> HostInfo {
    let sys = System::new_all();

    HostInfo {
        hostname: System::host_name(),
        cpu_cores: sys.cpus().len() as u64,
        total_memory_mb: sys.total_memory() / 1024 / 1024,
        available_memory_mb: sys.available_memory() / 1024 / 1024,
    }
}
