//! Single background worker owning the kernel
//!
//! # Architecture
//!
//! ```text
//! Host Thread                         Worker Thread
//!     │                                     │
//!     │                               [Build kernel]
//!     │◄──────────(startupCallback)─────────┤
//! [Dispatcher::execute]                     │
//!     ├────────(WorkerRequest)─────────────►[KernelSession::handle]
//!     │                                     │
//!     │◄────────(WorkerResponse)────────────┤
//! [Dispatcher::poll]                        │
//! ```
//!
//! The kernel is built inside the worker thread and never leaves it. The
//! dispatcher admits at most one request at a time and drops the rest.

mod dispatch;
mod handle;
mod thread;

pub use dispatch::{Admission, Dispatcher};
pub use handle::WorkerHandle;
pub use thread::WorkerThread;
