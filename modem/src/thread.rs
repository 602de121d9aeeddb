use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

static WARNED_REALTIME: AtomicBool = AtomicBool::new(false);

/// Spawns a named thread running `f`. The name is applied from inside the
/// new thread itself via `pthread_setname_np`, since Rust's own thread
/// name only affects panic messages, not what `ps`/`top` report.
pub fn start<F>(name: &'static str, f: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            set_name(name);
            f();
        })
        .expect("failed to spawn thread")
}

fn set_name(name: &str) {
    let Ok(cname) = CString::new(name) else {
        return;
    };
    unsafe {
        libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr());
    }
}

/// Requests `SCHED_FIFO` scheduling for the calling thread. Audio timing
/// is sensitive to scheduling jitter; this is best-effort and only warns
/// once per process if it fails, since it commonly requires privileges
/// this process may not have.
pub fn set_realtime_priority() {
    let param = libc::sched_param {
        sched_priority: unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) },
    };
    let result = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if result != 0 && !WARNED_REALTIME.swap(true, Ordering::Relaxed) {
        log::warn!("failed to set realtime scheduling priority, continuing with default priority");
    }
}
