//! Best-effort thread/core pinning.
//!
//! A real pin on Linux via `sched_setaffinity`, a no-op stub elsewhere.
//! Pinning is advisory only, so failure here is logged and never aborts
//! the run.

use tracing::warn;

/// Attempt to pin the calling thread to `core`. Returns `true` if the pin
/// syscall succeeded, `false` on any failure or on unsupported platforms —
/// callers should treat both as non-fatal.
pub fn pin_to_core(core: usize) -> bool {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: `set` is a `cpu_set_t` fully owned on the stack; both calls
        // operate on a pid of `0` (the calling thread) per sched_setaffinity(2).
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core, &mut set);
            let rc = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
            if rc == 0 {
                true
            } else {
                warn!(core, "sched_setaffinity failed, continuing unpinned");
                false
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        warn!(core, "core pinning unsupported on this platform, continuing unpinned");
        false
    }
}
