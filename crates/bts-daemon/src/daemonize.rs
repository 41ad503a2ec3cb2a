// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Background daemonization and SIGTERM/SIGINT handling.

use std::sync::atomic::AtomicBool;

/// Double-fork into the background, detach from the controlling terminal,
/// and redirect stdio to `/dev/null` (spec.md §6: "flags to select config
/// file path, identity override and daemonize").
///
/// # Errors
/// Returns an I/O error if `fork()`/`setsid()` fail.
pub fn daemonize() -> std::io::Result<()> {
    // SAFETY: fork() is safe to call here; the child doesn't touch any
    // state shared with the old process image besides already-open file
    // descriptors, and the parent exits immediately.
    unsafe {
        match libc::fork() {
            -1 => return Err(std::io::Error::last_os_error()),
            0 => {} // child continues
            _ => std::process::exit(0), // parent exits
        }

        if libc::setsid() == -1 {
            return Err(std::io::Error::last_os_error());
        }

        match libc::fork() {
            -1 => return Err(std::io::Error::last_os_error()),
            0 => {}
            _ => std::process::exit(0),
        }

        let devnull = std::ffi::CString::new("/dev/null").unwrap();
        let fd = libc::open(devnull.as_ptr(), libc::O_RDWR);
        if fd >= 0 {
            libc::dup2(fd, libc::STDIN_FILENO);
            libc::dup2(fd, libc::STDOUT_FILENO);
            libc::dup2(fd, libc::STDERR_FILENO);
            if fd > libc::STDERR_FILENO {
                libc::close(fd);
            }
        }
    }
    Ok(())
}

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_sig: libc::c_int) {
    SHUTDOWN.store(true, std::sync::atomic::Ordering::Relaxed);
}

/// Install a SIGTERM/SIGINT handler and return the flag it sets; the main
/// loop polls this between `poll()` calls to know when to exit.
///
/// # Errors
/// Returns an I/O error if `sigaction()` fails.
pub fn install_shutdown_flag() -> std::io::Result<&'static AtomicBool> {
    // SAFETY: handle_signal only performs an atomic store, which is
    // async-signal-safe.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_signal as usize;
        libc::sigemptyset(&mut action.sa_mask);
        for sig in [libc::SIGTERM, libc::SIGINT] {
            if libc::sigaction(sig, &action, std::ptr::null_mut()) == -1 {
                return Err(std::io::Error::last_os_error());
            }
        }
    }
    Ok(&SHUTDOWN)
}
