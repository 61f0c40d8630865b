//! Process liveness checks against the OS process table.

/// Answers whether a recorded process id still refers to a live process.
pub trait LivenessOracle: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Liveness oracle backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsLiveness;

impl LivenessOracle for OsLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        is_process_running(pid)
    }
}

/// Check if a process with the given PID is currently running.
///
/// Uses `kill(pid, 0)` on Unix (checks existence without sending a signal)
/// and `OpenProcess` + `GetExitCodeProcess` on Windows.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    // pid 0 and negative values address process groups, not a process.
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    // SAFETY: kill with signal 0 only checks existence, no signal is sent.
    if unsafe { libc::kill(raw, 0) } == 0 {
        return true;
    }

    // EPERM: the process exists but belongs to another user.
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(windows)]
pub fn is_process_running(pid: u32) -> bool {
    use std::ffi::c_void;

    const PROCESS_QUERY_LIMITED_INFORMATION: u32 = 0x1000;
    const STILL_ACTIVE: u32 = 259;

    unsafe extern "system" {
        fn OpenProcess(access: u32, inherit: i32, pid: u32) -> *mut c_void;
        fn GetExitCodeProcess(process: *mut c_void, exit_code: *mut u32) -> i32;
        fn CloseHandle(handle: *mut c_void) -> i32;
    }

    // SAFETY: OpenProcess returns null on failure (process doesn't exist or
    // access denied). CloseHandle releases the handle. No resources are leaked.
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle.is_null() {
            return false;
        }

        let mut exit_code: u32 = 0;
        let success = GetExitCodeProcess(handle, &mut exit_code);
        CloseHandle(handle);

        success != 0 && exit_code == STILL_ACTIVE
    }
}

#[cfg(not(any(unix, windows)))]
pub fn is_process_running(_pid: u32) -> bool {
    // No process table to consult; trust the recorded status.
    true
}
