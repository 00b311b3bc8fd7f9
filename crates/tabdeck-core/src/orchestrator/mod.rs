//! Per-window tab orchestration: URL-keyed tab set, single active tab,
//! and the frame-ready gate.

mod barrier;
mod layout;
mod lifecycle;
mod types;

pub use barrier::{FrameBarrier, TabHandle, TabRequest, TabResult};
pub use layout::TabLayout;
pub use types::*;
