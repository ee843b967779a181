// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Plumbing shared by chain clients: the single-consumer outbound stream and
//! the cancellable background task.

use crate::types::Transfer;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

pub(crate) struct OutboundStream {
    sender: Mutex<Option<mpsc::Sender<Transfer>>>,
    receiver: Mutex<Option<mpsc::Receiver<Transfer>>>,
}

impl OutboundStream {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
        }
    }

    /// Hands the sending side to the producer task. Only the first call gets it.
    pub(crate) fn take_sender(&self) -> Option<mpsc::Sender<Transfer>> {
        self.sender.lock().take()
    }

    pub(crate) fn take_receiver(&self) -> mpsc::Receiver<Transfer> {
        match self.receiver.lock().take() {
            Some(rx) => rx,
            None => {
                let (_, rx) = mpsc::channel(1);
                rx
            }
        }
    }

    /// Drops the sender if no task took it, closing the stream.
    pub(crate) fn close(&self) {
        self.sender.lock().take();
    }
}

pub(crate) struct Worker {
    name: &'static str,
    cancel: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Worker {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            cancel: CancellationToken::new(),
            handles: Mutex::new(vec![]),
        }
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.lock().push(tokio::spawn(fut));
    }

    /// Cancels all tasks and waits for them, giving up after `SHUTDOWN_TIMEOUT`.
    pub(crate) async fn shutdown(&self) {
        self.cancel.cancel();
        self.wait().await;
    }

    /// Waits for the tasks to finish on their own, then cancels whatever is left.
    pub(crate) async fn join(&self) {
        self.wait().await;
        self.cancel.cancel();
    }

    async fn wait(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("[{}] Task ended abnormally: {}", self.name, e),
                Err(_) => warn!("[{}] Shutdown timeout exceeded", self.name),
            }
        }
    }
}
