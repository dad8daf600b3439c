use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A spawned unit of work owned by the executor queue.
pub struct Task {
    future: Pin<Box<dyn Future<Output = ()> + Send>>,
    id: usize,
}

impl Task {
    pub fn new(future: Pin<Box<dyn Future<Output = ()> + Send>>, id: usize) -> Self {
        Task { future, id }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let poll = self.future.as_mut().poll(cx);
        if poll.is_ready() {
            tracing::trace!(task = self.id, "task finished");
        }
        poll
    }
}
