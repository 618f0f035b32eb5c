//! CPU client, allocator and parallelism configuration

use super::device::CpuDevice;
use super::runtime::CpuRuntime;
use crate::runtime::{DeviceAllocator, RuntimeClient};
#[cfg(feature = "rayon")]
use std::sync::Arc;

/// Minimum rows handed to one rayon task when no `min_len` is configured
const DEFAULT_RAYON_MIN_LEN: usize = 1;

/// Thread and task-size settings for a CPU client
///
/// - `max_threads`: run parallel work on a dedicated pool with this many
///   threads. `None` uses rayon's global pool.
/// - `min_len`: minimum number of iterations per rayon task. `None` keeps
///   the kernel's own default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParallelismConfig {
    /// Thread count for a dedicated pool
    pub max_threads: Option<usize>,
    /// Minimum iterations per rayon task
    pub min_len: Option<usize>,
}

impl ParallelismConfig {
    /// Create a configuration
    pub fn new(max_threads: Option<usize>, min_len: Option<usize>) -> Self {
        Self {
            max_threads,
            min_len,
        }
    }
}

/// CPU client for operation dispatch
#[derive(Clone, Debug)]
pub struct CpuClient {
    pub(crate) device: CpuDevice,
    allocator: CpuAllocator,
    parallelism: ParallelismConfig,
    #[cfg(feature = "rayon")]
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl CpuClient {
    /// Create a new CPU client
    pub fn new(device: CpuDevice) -> Self {
        let allocator = CpuAllocator::new(device);
        Self {
            device,
            allocator,
            parallelism: ParallelismConfig::default(),
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }

    /// Return a client that runs parallel work according to `config`.
    ///
    /// If a dedicated pool cannot be built the client keeps using the global
    /// pool and logs a warning.
    pub fn with_parallelism(mut self, config: ParallelismConfig) -> Self {
        self.parallelism = config;

        #[cfg(feature = "rayon")]
        {
            self.pool = match config.max_threads {
                Some(threads) if threads > 0 => {
                    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                        Ok(pool) => Some(Arc::new(pool)),
                        Err(e) => {
                            tracing::warn!(threads, error = %e, "failed to build CPU thread pool");
                            None
                        }
                    }
                }
                _ => None,
            };
        }

        self
    }

    /// Current parallelism settings
    pub fn parallelism(&self) -> ParallelismConfig {
        self.parallelism
    }

    /// Minimum iterations per rayon task
    pub fn rayon_min_len(&self) -> usize {
        self.parallelism
            .min_len
            .unwrap_or(DEFAULT_RAYON_MIN_LEN)
            .max(1)
    }

    /// Run `f` inside this client's thread pool, if it has one.
    pub fn install_parallelism<T, F>(&self, f: F) -> T
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        #[cfg(feature = "rayon")]
        if let Some(pool) = &self.pool {
            return pool.install(f);
        }

        f()
    }
}

impl RuntimeClient<CpuRuntime> for CpuClient {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // CPU operations are synchronous, nothing to do
    }

    fn allocator(&self) -> &CpuAllocator {
        &self.allocator
    }
}

/// Heap allocator for the CPU runtime
pub type CpuAllocator = DeviceAllocator<CpuRuntime>;
