//! Outbox for best-effort object removals.
//!
//! Superseded and deleted objects are not removed inline: the orchestrator
//! enqueues a removal task once the metadata write has succeeded, and a
//! worker processes the queue off the request path. Removal failures are
//! logged and dropped: by the time a task exists here the metadata no
//! longer references the object, which is the success criterion. Orphaned
//! bytes are a hygiene problem, not a correctness one.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use propdoc_core::{Container, ObjectStore};

/// One queued object removal.
#[derive(Debug, Clone)]
pub struct RemovalTask {
    pub id: Uuid,
    pub container: Container,
    pub path: String,
}

/// Sending half of the cleanup outbox, held by the orchestrator.
#[derive(Clone)]
pub struct CleanupQueue {
    tx: mpsc::UnboundedSender<RemovalTask>,
}

impl CleanupQueue {
    /// Enqueue a removal. Failure to enqueue (worker gone) is itself a
    /// cleanup problem and only logged.
    pub fn enqueue(&self, container: Container, path: String) {
        let task = RemovalTask {
            id: Uuid::now_v7(),
            container,
            path,
        };
        if let Err(e) = self.tx.send(task) {
            warn!(
                subsystem = "engine",
                component = "cleanup",
                op = "enqueue",
                container = e.0.container.name(),
                object_path = %e.0.path,
                "cleanup worker is gone; orphaned object will not be removed"
            );
        }
    }
}

/// Receiving half of the cleanup outbox.
pub struct CleanupWorker {
    rx: mpsc::UnboundedReceiver<RemovalTask>,
    objects: Arc<dyn ObjectStore>,
}

/// Create a connected queue/worker pair.
pub fn channel(objects: Arc<dyn ObjectStore>) -> (CleanupQueue, CleanupWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CleanupQueue { tx }, CleanupWorker { rx, objects })
}

impl CleanupWorker {
    /// Process tasks until every queue handle is dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            self.process(task).await;
        }
        debug!(
            subsystem = "engine",
            component = "cleanup",
            op = "run",
            "cleanup queue closed, worker exiting"
        );
    }

    /// Process everything currently queued, without waiting for more.
    /// Mostly useful in tests and at shutdown.
    pub async fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(task) = self.rx.try_recv() {
            self.process(task).await;
            processed += 1;
        }
        processed
    }

    async fn process(&self, task: RemovalTask) {
        match self
            .objects
            .remove(task.container, std::slice::from_ref(&task.path))
            .await
        {
            Ok(()) => debug!(
                subsystem = "engine",
                component = "cleanup",
                op = "remove_object",
                task_id = %task.id,
                container = task.container.name(),
                object_path = %task.path,
                "removed orphaned object"
            ),
            Err(e) => warn!(
                subsystem = "engine",
                component = "cleanup",
                op = "remove_object",
                task_id = %task.id,
                container = task.container.name(),
                object_path = %task.path,
                error = %e,
                "failed to remove orphaned object"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propdoc_core::ObjectStore;
    use propdoc_store::memory::InMemoryObjectStore;

    #[tokio::test]
    async fn test_drain_removes_queued_objects() {
        let objects = Arc::new(InMemoryObjectStore::new());
        objects
            .put(Container::Public, "P-1/a.jpg", b"x", "image/jpeg")
            .await
            .unwrap();

        let (queue, mut worker) = channel(objects.clone());
        queue.enqueue(Container::Public, "P-1/a.jpg".to_string());

        assert_eq!(worker.drain().await, 1);
        assert!(!objects.contains(Container::Public, "P-1/a.jpg"));
    }

    #[tokio::test]
    async fn test_removal_failure_is_swallowed() {
        let objects = Arc::new(InMemoryObjectStore::new());
        objects
            .put(Container::Public, "P-1/a.jpg", b"x", "image/jpeg")
            .await
            .unwrap();
        objects.fail_removals(true);

        let (queue, mut worker) = channel(objects.clone());
        queue.enqueue(Container::Public, "P-1/a.jpg".to_string());

        // Failure is logged, not returned.
        assert_eq!(worker.drain().await, 1);
        assert!(objects.contains(Container::Public, "P-1/a.jpg"));
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_dropped_does_not_panic() {
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let (queue, worker) = channel(objects);
        drop(worker);
        queue.enqueue(Container::Public, "P-1/a.jpg".to_string());
    }
}
