//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall; other unix mlockall).
//!
//! Every step here is best effort: a failure is logged and the loop still runs,
//! only with more jitter on the STEP line.

use crate::cli::RtLock;

#[cfg(unix)]
fn lock_memory(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    // SAFETY: mlockall only takes flags and reports failure through errno.
    let rc = unsafe { mlockall(flags) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if matches!(lock, RtLock::All) {
        // SAFETY: as above.
        if unsafe { mlockall(MCL_CURRENT) } == 0 {
            tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
            return Ok(());
        }
    }
    Err(eyre::eyre!(
        "mlockall failed: {err}; needs CAP_IPC_LOCK (or root) and a sufficient 'ulimit -l'"
    ))
}

#[cfg(target_os = "linux")]
fn set_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    // SAFETY: plain queries with a valid policy constant.
    let (min, max) = unsafe {
        (
            sched_get_priority_min(SCHED_FIFO),
            sched_get_priority_max(SCHED_FIFO),
        )
    };
    if min < 0 || max < 0 {
        eyre::bail!(
            "sched_get_priority_min/max failed: {}",
            std::io::Error::last_os_error()
        );
    }
    let wanted = prio.unwrap_or(max);
    let clamped = wanted.clamp(min, max);
    if clamped != wanted {
        tracing::warn!(requested = wanted, used = clamped, min, max, "rt priority clamped");
    }
    let param = sched_param {
        sched_priority: clamped,
    };
    // SAFETY: pid 0 targets the calling process; `param` lives across the call.
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        eyre::bail!(
            "sched_setscheduler(SCHED_FIFO, {clamped}) failed: {}; needs CAP_SYS_NICE or root",
            std::io::Error::last_os_error()
        );
    }
    Ok(clamped)
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) -> eyre::Result<()> {
    let max_bits = std::mem::size_of::<libc::cpu_set_t>() * 8;
    if cpu >= max_bits {
        eyre::bail!("cpu index {cpu} exceeds cpu_set_t capacity ({max_bits})");
    }
    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set and `cpu` is in range.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc != 0 {
        eyre::bail!(
            "sched_setaffinity(cpu {cpu}) failed: {}",
            std::io::Error::last_os_error()
        );
    }
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock, rt_cpu: Option<usize>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        if let Err(e) = lock_memory(lock) {
            tracing::warn!(error = %e, "memory lock not applied");
        }
        match set_fifo_priority(prio) {
            Ok(p) => tracing::info!(priority = p, "SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(error = %e, "real-time priority not applied"),
        }
        let cpu = rt_cpu.unwrap_or(0);
        match pin_to_cpu(cpu) {
            Ok(()) => tracing::info!(cpu, "pinned to cpu"),
            Err(e) => tracing::warn!(error = %e, "cpu affinity not applied"),
        }
    });
}

#[cfg(all(unix, not(target_os = "linux")))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, lock: RtLock, _rt_cpu: Option<usize>) {
    if !rt {
        return;
    }
    if let Err(e) = lock_memory(lock) {
        tracing::warn!(error = %e, "memory lock not applied");
    }
    tracing::info!("SCHED_FIFO and affinity are Linux-only; skipped");
}

#[cfg(not(unix))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, _lock: RtLock, _rt_cpu: Option<usize>) {
    if rt {
        tracing::warn!("real-time mode is not supported on this OS");
    }
}
