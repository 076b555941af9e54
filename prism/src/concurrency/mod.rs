//! The scatter/gather batch executor and its cancellation plumbing.
//!
//! A batch fans out the acquire phase of every submitted task concurrently,
//! then applies the resulting merge closures sequentially in submission
//! order. See [`batch::run`] for the full contract.

mod batch;
mod cancel;

pub use batch::*;
pub use cancel::*;
