//! Thin OS-facing plumbing shared by the backends in `crate::backend`.

pub mod fd;
pub mod selfpipe;

pub use fd::FileDesc;
pub use selfpipe::SelfPipe;
