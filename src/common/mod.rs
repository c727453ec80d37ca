use std::sync::Arc;
use std::thread::JoinHandle;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::address_book::Address;
use crate::errors::{BullyError, Result};

#[derive(Debug)]
pub struct Worker {
    pub join_handle: JoinHandle<()>,
    pub terminate_worker_tx: Sender<()>,
}

pub fn run_worker<T: Send + 'static, F: Fn(T, Receiver<()>) + Send + 'static>(worker: F, params: T) -> Worker {
    let (terminate_worker_tx, terminate_worker_rx): (Sender<()>, Receiver<()>) = crossbeam_channel::unbounded();

    let join_handle = thread::spawn(move || worker(params, terminate_worker_rx));

    Worker { join_handle, terminate_worker_tx }
}

impl Worker {
    pub fn terminate(self) {
        if self.terminate_worker_tx.send(()).is_err() {
            error!("Cannot send termination signal")
        }
        if self.join_handle.join().is_err() {
            error!("Worker returned an error")
        }
    }
}

/// Broadcast shutdown flag. Dropping the `ShutdownTrigger` fires every cloned signal.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    shutdown_rx: Receiver<()>,
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    _shutdown_tx: Sender<()>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);

    (ShutdownTrigger { _shutdown_tx: shutdown_tx }, ShutdownSignal { shutdown_rx })
}

impl ShutdownSignal {
    /// Waits for `delay`. Returns false if the node shut down meanwhile.
    pub fn wait(&self, delay: Duration) -> bool {
        let timeout = crossbeam_channel::after(delay);
        select!(
            recv(timeout) -> _ => true,
            recv(self.shutdown_rx) -> _ => false,
        )
    }
}

/// Issues one request per peer concurrently and collects every result.
#[derive(Clone)]
pub struct PeerFanOut {
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for PeerFanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerFanOut")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl PeerFanOut {
    pub fn new(node_id: i32, parallelism: usize) -> Result<PeerFanOut> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism.max(1))
            .thread_name(move |index| format!("node-{}-fan-out-{}", node_id, index))
            .build()
            .map_err(|err| BullyError::Startup(err.to_string()))?;

        Ok(PeerFanOut { pool: Arc::new(pool) })
    }

    /// Returns after every request resolved: response, transport error or deadline.
    pub fn request_peers<Req, Resp, Requester>(
        &self,
        request: Req,
        peers: Vec<Address>,
        requester: Requester,
    ) -> Vec<(Address, Result<Resp>)>
    where
        Requester: Fn(&Address, Req) -> Result<Resp> + Sync + Send,
        Req: Clone + Sync + Send,
        Resp: Send,
    {
        if peers.is_empty() {
            return Vec::new();
        }

        self.pool.install(|| {
            peers
                .into_par_iter()
                .map(|peer| {
                    let response = requester(&peer, request.clone());
                    (peer, response)
                })
                .collect()
        })
    }
}
