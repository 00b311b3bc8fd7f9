//! One-shot frame-ready gate for tab operations.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tabdeck_common::{ContainerId, TabError};
use tokio::sync::oneshot;

use crate::container::ContainerOptions;

pub type TabResult = Result<ContainerId, TabError>;

/// A tab operation held back until the renderer UI can show it.
#[derive(Debug, Clone, PartialEq)]
pub enum TabRequest {
    Create {
        url: String,
        options: ContainerOptions,
    },
    Switch {
        url: String,
        options: ContainerOptions,
    },
}

impl TabRequest {
    pub fn url(&self) -> &str {
        match self {
            TabRequest::Create { url, .. } | TabRequest::Switch { url, .. } => url,
        }
    }
}

pub(crate) struct Deferred {
    pub request: TabRequest,
    pub reply: oneshot::Sender<TabResult>,
}

/// Closed until the first `open`, then open forever.
#[derive(Default)]
pub struct FrameBarrier {
    ready: bool,
    queue: VecDeque<Deferred>,
}

impl FrameBarrier {
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Hold `request` until the barrier opens.
    pub(crate) fn defer(&mut self, request: TabRequest) -> TabHandle {
        let (reply, rx) = oneshot::channel();
        self.queue.push_back(Deferred { request, reply });
        TabHandle::queued(rx)
    }

    /// Open the barrier and hand back everything waiting on it, oldest
    /// first. `None` if it was already open.
    pub(crate) fn open(&mut self) -> Option<Vec<Deferred>> {
        if self.ready {
            return None;
        }
        self.ready = true;
        Some(self.queue.drain(..).collect())
    }

    /// Drop every waiter; their handles resolve to `Abandoned`.
    pub(crate) fn abandon(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        count
    }
}

enum HandleState {
    Done(Option<TabResult>),
    Queued(oneshot::Receiver<TabResult>),
}

/// Result of a gated tab operation.
///
/// Completes immediately once the frame-ready signal has fired; before that
/// it stays pending until `set_frame_ready` releases it. Usable both as a
/// future and by polling with [`TabHandle::try_take`].
pub struct TabHandle {
    state: HandleState,
}

impl TabHandle {
    pub(crate) fn done(result: TabResult) -> Self {
        Self {
            state: HandleState::Done(Some(result)),
        }
    }

    fn queued(rx: oneshot::Receiver<TabResult>) -> Self {
        Self {
            state: HandleState::Queued(rx),
        }
    }

    /// Whether the operation was held back by the barrier.
    pub fn is_queued(&self) -> bool {
        matches!(self.state, HandleState::Queued(_))
    }

    /// Take the result if the operation has run. Returns `None` while still
    /// waiting and after the result has been taken.
    pub fn try_take(&mut self) -> Option<TabResult> {
        match &mut self.state {
            HandleState::Done(result) => result.take(),
            HandleState::Queued(rx) => match rx.try_recv() {
                Ok(result) => {
                    self.state = HandleState::Done(None);
                    Some(result)
                }
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.state = HandleState::Done(None);
                    Some(Err(TabError::Abandoned))
                }
            },
        }
    }
}

impl Future for TabHandle {
    type Output = TabResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            HandleState::Done(result) => {
                Poll::Ready(result.take().unwrap_or(Err(TabError::Abandoned)))
            }
            HandleState::Queued(rx) => Pin::new(rx)
                .poll(cx)
                .map(|r| r.unwrap_or(Err(TabError::Abandoned))),
        }
    }
}

impl std::fmt::Debug for TabHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabHandle")
            .field("queued", &self.is_queued())
            .finish()
    }
}
