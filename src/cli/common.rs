//! Common functions and elements used by various binaries in the quedist toolchain.

// Reset SIGPIPE, so that the output may be piped to other stuff.
// See https://stackoverflow.com/q/65755853/.
pub fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
