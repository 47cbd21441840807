use std::io;

/// Errors that can escape the reactor itself, as opposed to ordinary
/// `io::Error`s returned by registration calls (`read`, `write`, `signal`, ...),
/// which keep using `io::Result` to stay close to the teacher crate's
/// `Evented`/`Poll` surface.
#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// None of the requested backends could be constructed on this platform.
    #[error("could not initialise reactor: no backend available from {0:?}")]
    NoBackendAvailable(Vec<&'static str>),

    /// A backend's poll syscall was interrupted and no SIGINT handler is
    /// registered to explain it away as a clean abort.
    #[error("interrupted")]
    Interrupted,

    /// Wraps an ordinary syscall failure surfaced while polling or mutating
    /// backend registrations.
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ReactorError>;
