use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// 單一階段的耗時紀錄
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: String,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// Records per-stage wall time for one run and, with the `cli` feature,
/// the process memory footprint.
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    timings: Mutex<Vec<StageTiming>>,
    #[cfg(feature = "cli")]
    system: Mutex<System>,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            start_time: Instant::now(),
            timings: Mutex::new(Vec::new()),
            #[cfg(feature = "cli")]
            system: Mutex::new(System::new()),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&self, stage: &str, elapsed: Duration) {
        if let Ok(mut timings) = self.timings.lock() {
            timings.push(StageTiming {
                stage: stage.to_string(),
                elapsed,
            });
        }
        if self.enabled {
            tracing::info!("⏱️ {} finished in {:?}{}", stage, elapsed, self.memory_suffix());
        }
    }

    pub fn timings(&self) -> Vec<StageTiming> {
        self.timings
            .lock()
            .map(|timings| timings.clone())
            .unwrap_or_default()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_final_stats(&self) {
        if self.enabled {
            tracing::info!(
                "📊 Run finished - Total Time: {:?}{}",
                self.elapsed(),
                self.memory_suffix()
            );
        }
    }

    #[cfg(feature = "cli")]
    fn memory_suffix(&self) -> String {
        let (Some(pid), Ok(mut system)) = (self.pid, self.system.lock()) else {
            return String::new();
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system
            .process(pid)
            .map(|process| format!(", Memory: {}MB", process.memory() / 1024 / 1024))
            .unwrap_or_default()
    }

    #[cfg(not(feature = "cli"))]
    fn memory_suffix(&self) -> String {
        String::new()
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
