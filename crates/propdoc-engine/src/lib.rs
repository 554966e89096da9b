//! # propdoc-engine
//!
//! The attachment orchestrator for propdoc: the transactional choreography
//! of storing bytes, mutating record metadata, and cleaning up superseded
//! objects, with compensating actions on partial failure.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use propdoc_engine::{cleanup, AttachmentService};
//!
//! let (queue, worker) = cleanup::channel(objects.clone());
//! tokio::spawn(worker.run());
//!
//! let service = AttachmentService::new(objects, records, queue);
//! let outcome = service.upload(request).await?;
//! println!("stored at {}", outcome.access_url);
//! ```

pub mod cleanup;
pub mod service;

pub use cleanup::{channel, CleanupQueue, CleanupWorker, RemovalTask};
pub use service::AttachmentService;
