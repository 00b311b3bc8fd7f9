//! Boundary between the tab core and the native host.
//!
//! The core never talks to a window system directly. It drives a
//! [`HostRuntime`] and consumes the [`HostEvent`]s the host queues up:
//! - window and content-surface creation
//! - attach/detach/bounds on a window's render surface
//! - script injection for the event bridge
//! - load, title, and window callbacks
//!
//! [`HeadlessHost`] is the in-memory runtime used by the stdio binary and
//! by tests.

pub mod events;
pub mod headless;
pub mod runtime;
pub mod script;

pub use events::HostEvent;
pub use headless::HeadlessHost;
pub use runtime::{HostRuntime, SurfaceConfig, WindowSpec};
pub use script::dispatch_event_script;
