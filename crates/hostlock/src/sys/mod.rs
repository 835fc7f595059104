//! Platform backends for the lock resource.
//!
//! Exactly one backend is compiled per target, and both expose the same
//! surface: [`Resource::open`] creates or opens the OS object without
//! acquiring it, [`Resource::acquire`] waits for exclusive ownership
//! within a bounded timeout, and [`Resource::release`] gives it back.
//! Dropping a `Resource` closes the descriptor or kernel handle.
//!
//! The state machine in [`crate::handle`] owns every lifecycle decision;
//! the backends only translate it to the native primitive.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::Resource;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::Resource;
