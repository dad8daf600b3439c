use std::collections::VecDeque;
use std::future::Future;
use std::pin::pin;
use std::sync::{Arc, mpsc};
use std::task::{Context, Poll, Wake, Waker};

use crate::runtime::task::Task;

/// Single-threaded executor that sleeps on a wake channel instead of spinning.
pub struct Executor {
    wake_receiver: mpsc::Receiver<()>,
    wake_sender: mpsc::Sender<()>,
    task_queue: VecDeque<Task>,
    next_task_id: usize,
}

impl Executor {
    pub fn new() -> Self {
        let (wake_sender, wake_receiver) = mpsc::channel();
        Executor {
            wake_receiver,
            wake_sender,
            task_queue: VecDeque::new(),
            next_task_id: 0,
        }
    }

    /// Run a future to completion on the calling thread.
    pub fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        let mut future = pin!(future);
        let waker = self.create_waker();
        let mut context = Context::from_waker(&waker);

        loop {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(result) => return result,
                Poll::Pending => {
                    // we hold a sender ourselves, so this only returns on a wake
                    let _ = self.wake_receiver.recv();
                }
            }
        }
    }

    pub fn spawn<F>(&mut self, future: F) -> usize
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_task_id;
        self.task_queue.push_back(Task::new(Box::pin(future), id));
        self.next_task_id += 1;
        id
    }

    pub fn pending_tasks(&self) -> usize {
        self.task_queue.len()
    }

    /// Drive every spawned task to completion.
    pub fn run(&mut self) {
        while !self.task_queue.is_empty() {
            self.poll_tasks();

            if !self.task_queue.is_empty() {
                let _ = self.wake_receiver.recv();
            }
        }
    }

    fn poll_tasks(&mut self) {
        let mut remaining_tasks = VecDeque::new();
        let waker = self.create_waker();
        let mut cx = Context::from_waker(&waker);

        while let Some(mut task) = self.task_queue.pop_front() {
            match task.poll(&mut cx) {
                Poll::Ready(()) => {}
                Poll::Pending => remaining_tasks.push_back(task),
            }
        }
        self.task_queue = remaining_tasks;
    }

    fn create_waker(&self) -> Waker {
        Waker::from(Arc::new(ChannelWaker(self.wake_sender.clone())))
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// Wakes the executor by posting to its wake channel.
struct ChannelWaker(mpsc::Sender<()>);

impl Wake for ChannelWaker {
    fn wake(self: Arc<Self>) {
        let _ = self.0.send(());
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let _ = self.0.send(());
    }
}
