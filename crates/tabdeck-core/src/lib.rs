//! Multi-window tab orchestration.
//!
//! A [`Desktop`] owns the event bus, every content container, and every
//! window. Each window carries a [`TabOrchestrator`] that keeps its
//! URL-keyed tab set, decides which container is visible, and holds tab
//! operations back until the window's renderer UI reports frame ready.
//! Renderer UI requests come in as [`Command`]s through
//! [`Desktop::dispatch`]; host callbacks are drained by [`Desktop::pump`].

pub mod container;
pub mod desktop;
pub mod orchestrator;
pub mod registry;
pub mod service;
pub mod window;

pub use container::{Container, ContainerOptions, ContainerState, ResolvedOptions};
pub use desktop::Desktop;
pub use orchestrator::{CloseTabOptions, TabContext, TabHandle, TabLayout, TabOrchestrator};
pub use registry::ContainerRegistry;
pub use service::{Command, Reply};
pub use window::{Window, WindowOptions, WindowRegistry};
