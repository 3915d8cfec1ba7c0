//! Process-wide allocation tripwire.
//!
//! While armed, any allocation routed through [`GuardedAlloc`] aborts the
//! process with a diagnostic naming the byte count. The orchestrator arms
//! the guard once the warmup event count is reached and disarms it before
//! teardown, so the measured steady-state never pays for unexpected heap
//! activity. This is process-wide by necessity — it has to observe every
//! heap operation — but the enable/disable surface is the only thing
//! exposed; callers never touch the flag directly.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, Ordering};

static GUARD_ENABLED: AtomicBool = AtomicBool::new(false);

/// Arm the tripwire. Call once, after the warmup threshold is reached.
pub fn enable_guard() {
    GUARD_ENABLED.store(true, Ordering::SeqCst);
}

/// Disarm the tripwire. Call once, before teardown (flushing output files,
/// writing latency/histogram dumps, dropping large buffers).
pub fn disable_guard() {
    GUARD_ENABLED.store(false, Ordering::SeqCst);
}

/// Whether the tripwire is currently armed.
#[inline]
pub fn is_guarded() -> bool {
    GUARD_ENABLED.load(Ordering::Relaxed)
}

/// A `GlobalAlloc` wrapper that aborts the process if an allocation is
/// attempted while the guard is armed. Installed as the process's global
/// allocator via `#[global_allocator]` in `main.rs`; library consumers that
/// only use `mm_backtest` as a dependency (e.g. the test binary) may opt not
/// to install it, in which case the guard functions are inert bookkeeping.
pub struct GuardedAlloc;

unsafe impl GlobalAlloc for GuardedAlloc {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if GUARD_ENABLED.load(Ordering::Relaxed) {
            abort_on_allocation(layout.size());
        }
        System.alloc(layout)
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    #[inline]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if GUARD_ENABLED.load(Ordering::Relaxed) {
            abort_on_allocation(new_size);
        }
        System.realloc(ptr, layout, new_size)
    }

    #[inline]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if GUARD_ENABLED.load(Ordering::Relaxed) {
            abort_on_allocation(layout.size());
        }
        System.alloc_zeroed(layout)
    }
}

#[cold]
fn abort_on_allocation(bytes: usize) -> ! {
    eprintln!("[alloc_guard] allocation of {bytes} bytes detected in hot path");
    std::process::abort();
}

/// RAII helper that arms the guard on construction and disarms it on drop —
/// convenient for tests and benchmarks that want to assert a block of code
/// allocates nothing.
pub struct GuardScope;

impl GuardScope {
    /// Arm the guard for the lifetime of the returned value.
    pub fn new() -> Self {
        enable_guard();
        GuardScope
    }
}

impl Default for GuardScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        disable_guard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_disable_toggles_is_guarded() {
        assert!(!is_guarded());
        enable_guard();
        assert!(is_guarded());
        disable_guard();
        assert!(!is_guarded());
    }

    #[test]
    fn scope_disarms_on_drop() {
        assert!(!is_guarded());
        {
            let _g = GuardScope::new();
            assert!(is_guarded());
        }
        assert!(!is_guarded());
    }
}
