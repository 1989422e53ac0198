//! Interrupt handling.
//!
//! The first SIGINT/SIGTERM raises the shared [`Interrupt`] flag so the run
//! unwinds at its next checkpoint and drops its staging directory. A second
//! signal exits at once with status 1.
//!
//! Checkpoints sit between retry attempts, inside retry sleeps and between
//! download chunks. A blocking HTTP call already in flight is not cut short:
//! the flag is seen once it returns, which is bounded by the request timeout
//! (60 s per connect or read). The status file is never written on this path.

use std::io;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

use dictsync_sync::Interrupt;

pub fn install(interrupt: &Interrupt) -> io::Result<()> {
    for signal in [SIGINT, SIGTERM] {
        // Order matters: the shutdown check must see the flag before this
        // signal sets it.
        flag::register_conditional_shutdown(signal, 1, interrupt.flag())?;
        flag::register(signal, interrupt.flag())?;
    }
    Ok(())
}
