use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use thiserror::Error;

use crate::error::HuffmanError;

/// Bounded FIFO channel whose `send` waits while the buffer is full.
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let shared = Arc::new(Mutex::new(ChannelState {
        buffer: VecDeque::with_capacity(capacity),
        capacity: capacity.max(1),
        receiver_waker: None,
        sender_wakers: VecDeque::new(),
        closed: false,
        sender_count: 1,
    }));

    let sender = Sender {
        shared: Arc::clone(&shared),
    };
    let receiver = Receiver { shared };

    (sender, receiver)
}

struct ChannelState<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    receiver_waker: Option<Waker>,
    // blocked senders, deduplicated by `Waker::will_wake`
    sender_wakers: VecDeque<Waker>,
    closed: bool,
    sender_count: usize,
}

// a panicked holder leaves the queue itself intact
fn lock<T>(shared: &Mutex<ChannelState<T>>) -> MutexGuard<'_, ChannelState<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// a dropped send future may still hold a queue entry, so every blocked sender is woken
fn wake_senders<T>(state: &mut ChannelState<T>) {
    for waker in state.sender_wakers.drain(..) {
        waker.wake();
    }
}

pub struct Sender<T> {
    shared: Arc<Mutex<ChannelState<T>>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        lock(&self.shared).sender_count += 1;
        Sender {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut state = lock(&self.shared);
        state.sender_count -= 1;

        if state.sender_count == 0 {
            state.closed = true;
            if let Some(waker) = state.receiver_waker.take() {
                waker.wake();
            }
        }
    }
}

impl<T> Sender<T> {
    pub fn send(&self, value: T) -> SendFuture<'_, T> {
        SendFuture {
            sender: self,
            value: Some(value),
        }
    }
}

pub struct Receiver<T> {
    shared: Arc<Mutex<ChannelState<T>>>,
}

impl<T> Receiver<T> {
    pub fn recv(&self) -> RecvFuture<'_, T> {
        RecvFuture { receiver: self }
    }

    /// Take a message if one is buffered, without waiting.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = lock(&self.shared);
        match state.buffer.pop_front() {
            Some(value) => {
                wake_senders(&mut state);
                Ok(value)
            }
            None if state.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        let mut state = lock(&self.shared);
        state.closed = true;
        wake_senders(&mut state);
    }
}

pub struct SendFuture<'a, T> {
    sender: &'a Sender<T>,
    value: Option<T>,
}

impl<T> Unpin for SendFuture<'_, T> {}

impl<T> Future for SendFuture<'_, T> {
    type Output = Result<(), SendError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = lock(&this.sender.shared);

        if state.closed {
            return Poll::Ready(Err(SendError::Closed));
        }

        if state.buffer.len() < state.capacity {
            let Some(value) = this.value.take() else {
                return Poll::Ready(Ok(()));
            };
            state.buffer.push_back(value);

            if let Some(waker) = state.receiver_waker.take() {
                waker.wake();
            }
            return Poll::Ready(Ok(()));
        }

        // a woken sender can lose the freed slot to another one, so register on every miss
        if !state.sender_wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.sender_wakers.push_back(cx.waker().clone());
        }

        Poll::Pending
    }
}

pub struct RecvFuture<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Unpin for RecvFuture<'_, T> {}

impl<T> Future for RecvFuture<'_, T> {
    type Output = Result<T, RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = lock(&self.receiver.shared);

        if let Some(value) = state.buffer.pop_front() {
            wake_senders(&mut state);
            return Poll::Ready(Ok(value));
        }

        if state.closed {
            return Poll::Ready(Err(RecvError::Closed));
        }

        state.receiver_waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("receiver dropped")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    #[error("all senders dropped")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    #[error("no message yet")]
    Empty,
    #[error("all senders dropped")]
    Closed,
}

impl From<SendError> for HuffmanError {
    fn from(_: SendError) -> Self {
        HuffmanError::WorkerDisconnected
    }
}

impl From<RecvError> for HuffmanError {
    fn from(_: RecvError) -> Self {
        HuffmanError::WorkerDisconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::executor::Executor;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::task::Wake;

    #[test]
    fn test_channel_fifo_ordering() {
        let mut executor = Executor::new();
        let (tx, rx) = channel::<i32>(2);

        // the third send waits until the receiver drains one
        executor.spawn(async move {
            tx.send(1).await.unwrap();
            tx.send(2).await.unwrap();
            tx.send(3).await.unwrap();
        });

        executor.spawn(async move {
            assert_eq!(rx.recv().await.unwrap(), 1);
            assert_eq!(rx.recv().await.unwrap(), 2);
            assert_eq!(rx.recv().await.unwrap(), 3);
            assert_eq!(rx.recv().await, Err(RecvError::Closed));
        });

        executor.run();
    }

    #[test]
    fn test_backpressure() {
        let mut executor = Executor::new();
        let (tx, rx) = channel::<String>(1);

        executor.spawn(async move {
            tx.send("first".to_string()).await.unwrap();
            tx.send("second".to_string()).await.unwrap();
        });

        executor.spawn(async move {
            assert_eq!(rx.recv().await.unwrap(), "first");
            assert_eq!(rx.recv().await.unwrap(), "second");
        });

        executor.run();
    }

    #[test]
    fn test_try_recv_states() {
        let mut executor = Executor::new();
        let (tx, rx) = channel::<u8>(1);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        executor.block_on(tx.send(7)).unwrap();
        assert_eq!(rx.try_recv(), Ok(7));

        drop(tx);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let mut executor = Executor::new();
        let (tx, rx) = channel::<u8>(1);
        drop(rx);
        assert_eq!(executor.block_on(tx.send(1)), Err(SendError::Closed));
    }

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    #[test]
    fn test_blocked_sender_rewoken_after_losing_slot() {
        let mut executor = Executor::new();
        let (a, rx) = channel::<u8>(1);
        let b = a.clone();

        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);

        executor.block_on(b.send(1)).unwrap();
        let mut send_a = a.send(2);
        assert!(Pin::new(&mut send_a).poll(&mut cx).is_pending());

        assert_eq!(rx.try_recv(), Ok(1));
        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 1);

        // b takes the freed slot before a gets polled again
        executor.block_on(b.send(3)).unwrap();
        assert!(Pin::new(&mut send_a).poll(&mut cx).is_pending());
        // polling twice with the same waker queues it once
        assert!(Pin::new(&mut send_a).poll(&mut cx).is_pending());

        assert_eq!(rx.try_recv(), Ok(3));
        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 2);

        assert_eq!(Pin::new(&mut send_a).poll(&mut cx), Poll::Ready(Ok(())));
        assert_eq!(rx.try_recv(), Ok(2));
        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_two_threads_share_a_slot() {
        let (tx, rx) = channel::<u32>(1);
        let workers: Vec<_> = (0..2u32)
            .map(|worker| {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    let mut executor = Executor::new();
                    for n in 0..50 {
                        executor.block_on(tx.send(worker * 100 + n)).unwrap();
                    }
                })
            })
            .collect();
        drop(tx);

        let mut executor = Executor::new();
        let mut received = Vec::new();
        while let Ok(n) = executor.block_on(rx.recv()) {
            received.push(n);
        }
        for worker in workers {
            worker.join().unwrap();
        }
        received.sort_unstable();
        let expected: Vec<u32> = (0..50).chain(100..150).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn test_send_across_threads() {
        let (tx, rx) = channel::<u64>(1);
        let worker = std::thread::spawn(move || {
            let mut executor = Executor::new();
            for n in 0..5 {
                executor.block_on(tx.send(n)).unwrap();
            }
        });

        let mut executor = Executor::new();
        let mut received = Vec::new();
        while let Ok(n) = executor.block_on(rx.recv()) {
            received.push(n);
        }
        worker.join().unwrap();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }
}
