pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, HostError, TabError, TabdeckError};
pub use events::{DesktopEvent, EventBus, EventEnvelope};
pub use id::{ContainerId, SubscriptionId, Surface, WindowId};
pub use types::{Rect, Size};

pub type Result<T> = std::result::Result<T, TabdeckError>;
