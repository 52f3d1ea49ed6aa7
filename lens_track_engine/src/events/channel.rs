//! Stateless pub-sub plumbing for engine events.
//!
//! A handler owns an mpsc channel and a user-supplied async callback. Producers are cheap clones
//! of the sending half; each received event runs its callback on a fresh task so a slow hook
//! never blocks the channel. Handlers see only the event itself, never engine state.
use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::AtomicI64, Arc},
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    inbox: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, inbox) = mpsc::channel(buffer_size);
        Self { inbox, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight callbacks to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler running");
        // The handler keeps a sender only so subscribe() can clone it. Dropping it here means the
        // receive loop ends as soon as the last outside producer goes away.
        drop(self.sender);
        let in_flight = Arc::new(AtomicI64::new(0));
        while let Some(event) = self.inbox.recv().await {
            trace!("📬️ Event received");
            let handler = Arc::clone(&self.handler);
            in_flight.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let counter = Arc::clone(&in_flight);
            tokio::spawn(async move {
                (handler)(event).await;
                counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                trace!("📬️ Event handled");
            });
        }
        while in_flight.load(std::sync::atomic::Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for {} callbacks to finish", in_flight.load(std::sync::atomic::Ordering::SeqCst));
            tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
