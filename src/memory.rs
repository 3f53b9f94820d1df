//! Heap usage snapshots.
//!
//! Two probes are provided:
//!
//! - [`ProcessMemory`] reads the resident set size of the current process
//!   (from `/proc/self/status` on Linux, through `memory-stats` elsewhere).
//! - [`TrackingAllocator`] wraps a global allocator and counts live bytes.
//!   Install it with `#[global_allocator]` and pass a reference to it as the
//!   probe for exact heap accounting.

use crate::error::{BenchError, Result};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of heap usage snapshots, in kilobytes.
pub trait MemoryProbe {
    fn current_kb(&self) -> Result<f64>;
}

impl<P: MemoryProbe + ?Sized> MemoryProbe for &P {
    fn current_kb(&self) -> Result<f64> {
        (**self).current_kb()
    }
}

/// Resident set size of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemory;

impl ProcessMemory {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryProbe for ProcessMemory {
    #[cfg(target_os = "linux")]
    fn current_kb(&self) -> Result<f64> {
        let status = std::fs::read_to_string("/proc/self/status")
            .map_err(|e| BenchError::MemoryProbe(format!("failed to read /proc/self/status: {e}")))?;
        parse_vm_rss_kb(&status).map(|kb| kb as f64)
    }

    #[cfg(not(target_os = "linux"))]
    fn current_kb(&self) -> Result<f64> {
        memory_stats::memory_stats()
            .map(|stats| stats.physical_mem as f64 / 1024.0)
            .ok_or_else(|| {
                BenchError::MemoryProbe(
                    "resident set size is not available on this platform; install TrackingAllocator instead"
                        .to_string(),
                )
            })
    }
}

/// Extract the `VmRSS` value from `/proc/<pid>/status` content.
///
/// Format: `VmRSS:     12345 kB`
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_rss_kb(status: &str) -> Result<u64> {
    let line = status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))
        .ok_or_else(|| BenchError::MemoryProbe("VmRSS not found".to_string()))?;

    line.split_whitespace()
        .nth(1)
        .ok_or_else(|| BenchError::MemoryProbe(format!("missing value in line: {line}")))?
        .parse::<u64>()
        .map_err(|e| BenchError::MemoryProbe(format!("failed to parse value in '{line}': {e}")))
}

/// Global allocator wrapper that keeps a running count of live heap bytes.
///
/// ```rust,no_run
/// use cntryl_microbench::TrackingAllocator;
///
/// #[global_allocator]
/// static ALLOCATOR: TrackingAllocator = TrackingAllocator::system();
/// ```
#[derive(Debug)]
pub struct TrackingAllocator<A = System> {
    inner: A,
    live: AtomicUsize,
}

impl TrackingAllocator<System> {
    /// Wrap the system allocator.
    pub const fn system() -> Self {
        Self::new(System)
    }
}

impl<A> TrackingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            live: AtomicUsize::new(0),
        }
    }

    /// Bytes currently allocated through this allocator and not yet freed.
    pub fn live_bytes(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

// SAFETY: every call is forwarded unchanged to the wrapped allocator; the
// wrapper only updates an atomic counter.
unsafe impl<A: GlobalAlloc> GlobalAlloc for TrackingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            self.live.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            self.live.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.inner.dealloc(ptr, layout);
        self.live.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.live
                    .fetch_add(new_size - layout.size(), Ordering::Relaxed);
            } else {
                self.live
                    .fetch_sub(layout.size() - new_size, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

impl<A> MemoryProbe for TrackingAllocator<A> {
    fn current_kb(&self) -> Result<f64> {
        Ok(self.live_bytes() as f64 / 1024.0)
    }
}
