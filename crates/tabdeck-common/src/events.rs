//! Lifecycle notifications and the synchronous bus that carries them across
//! the core/UI boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::id::{ContainerId, SubscriptionId, WindowId};

pub const ON_CREATE_TAB: &str = "desktop.onCreateTab";
pub const ON_SWITCH_TAB: &str = "desktop.onSwitchTab";
pub const ON_CLOSE_TAB: &str = "desktop.onCloseTab";
pub const ON_TAB_TITLE: &str = "desktop.onTabTitle";
pub const ON_TAB_ICON: &str = "desktop.onTabIcon";

/// JSON key carrying the window filter inside an envelope's `data`.
pub const WINDOW_ID_KEY: &str = "windowId";
/// JSON key carrying the container filter inside an envelope's `data`.
pub const CONTAINER_IDS_KEY: &str = "containerIds";

#[derive(Debug, Clone, PartialEq)]
pub enum DesktopEvent {
    TabCreated {
        id: ContainerId,
        window_id: WindowId,
    },
    TabSwitched {
        id: ContainerId,
        window_id: WindowId,
    },
    TabClosed {
        id: ContainerId,
        window_id: WindowId,
    },
    TabTitle {
        id: ContainerId,
        title: String,
    },
    TabIcon {
        id: ContainerId,
        icon_url: String,
    },
    /// Application-defined notification with explicit delivery filters.
    Custom {
        event_name: String,
        data: Value,
        window_id: Option<WindowId>,
        container_ids: Option<Vec<ContainerId>>,
    },
}

impl DesktopEvent {
    pub fn name(&self) -> &str {
        match self {
            DesktopEvent::TabCreated { .. } => ON_CREATE_TAB,
            DesktopEvent::TabSwitched { .. } => ON_SWITCH_TAB,
            DesktopEvent::TabClosed { .. } => ON_CLOSE_TAB,
            DesktopEvent::TabTitle { .. } => ON_TAB_TITLE,
            DesktopEvent::TabIcon { .. } => ON_TAB_ICON,
            DesktopEvent::Custom { event_name, .. } => event_name,
        }
    }

    /// Window this event is restricted to, if any.
    pub fn window_filter(&self) -> Option<WindowId> {
        match self {
            DesktopEvent::TabCreated { window_id, .. }
            | DesktopEvent::TabSwitched { window_id, .. }
            | DesktopEvent::TabClosed { window_id, .. } => Some(*window_id),
            DesktopEvent::TabTitle { .. } | DesktopEvent::TabIcon { .. } => None,
            DesktopEvent::Custom { window_id, .. } => *window_id,
        }
    }

    /// Containers this event is restricted to, if any.
    pub fn container_filter(&self) -> Option<&[ContainerId]> {
        match self {
            DesktopEvent::Custom { container_ids, .. } => container_ids.as_deref(),
            _ => None,
        }
    }

    /// Whether a window's renderer UI should receive this event.
    pub fn targets_window(&self, window: WindowId) -> bool {
        self.window_filter().is_none_or(|w| w == window)
    }

    /// Whether a container should receive this event, given the window it is
    /// currently attached to.
    pub fn targets_container(&self, id: ContainerId, attached_to: Option<WindowId>) -> bool {
        if let Some(ids) = self.container_filter() {
            if !ids.contains(&id) {
                return false;
            }
        }
        match self.window_filter() {
            Some(w) => attached_to == Some(w),
            None => true,
        }
    }

    /// Wire form mirrored to the renderer UI and to containers.
    pub fn envelope(&self) -> EventEnvelope {
        let data = match self {
            DesktopEvent::TabCreated { id, window_id }
            | DesktopEvent::TabSwitched { id, window_id }
            | DesktopEvent::TabClosed { id, window_id } => {
                json!({ "id": id, "windowId": window_id })
            }
            DesktopEvent::TabTitle { id, title } => json!({ "id": id, "title": title }),
            DesktopEvent::TabIcon { id, icon_url } => json!({ "id": id, "iconUrl": icon_url }),
            DesktopEvent::Custom {
                data,
                window_id,
                container_ids,
                ..
            } => {
                let mut data = match data {
                    Value::Object(map) => Value::Object(map.clone()),
                    Value::Null => json!({}),
                    other => json!({ "value": other }),
                };
                if let Value::Object(map) = &mut data {
                    if let Some(w) = window_id {
                        map.insert(WINDOW_ID_KEY.into(), json!(w));
                    }
                    if let Some(ids) = container_ids {
                        map.insert(CONTAINER_IDS_KEY.into(), json!(ids));
                    }
                }
                data
            }
        };
        EventEnvelope {
            event_name: self.name().to_string(),
            data,
        }
    }
}

/// `{eventName, data}` as seen by the renderer UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_name: String,
    pub data: Value,
}

type Handler = Arc<dyn Fn(&DesktopEvent) + Send + Sync>;

/// Synchronous publish/subscribe channel.
///
/// `publish` invokes every handler subscribed at call time, in subscription
/// order. Handlers may subscribe or unsubscribe while a dispatch is running;
/// the change applies to the next publish.
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DesktopEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(handler)));
        tracing::debug!(subscription = %id, "bus subscriber added");
        id
    }

    /// Returns whether a subscriber was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.lock();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        before != subs.len()
    }

    /// Deliver to every current subscriber. Returns how many were invoked.
    pub fn publish(&self, event: DesktopEvent) -> usize {
        let snapshot: Vec<Handler> = self.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        tracing::debug!(event = event.name(), subscribers = snapshot.len(), "publish");
        for handler in &snapshot {
            handler(&event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Handler)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
