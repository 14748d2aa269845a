//! Header rule synchronization engine
//!
//! Keeps an editable, persisted set of per-host header override rules and pushes the
//! enabled subset to a local header-injection service as `POST {endpoint}/rules`.
//!
//! ```ignore
//! let storage: Arc<dyn KvStore> = Arc::new(FileStore::open("headit.json")?);
//! let mut session = SessionBuilder::new()
//!     .host("example.com")
//!     .build(storage, SyncClient::builder().build()?);
//! session.activate();
//! session.handle(EditEvent::AddRow);
//! ```

pub mod debounce;
pub mod error;
pub mod keys;
pub mod parser;
pub mod payload;
pub mod projector;
pub mod rule;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;
pub mod sync;
pub mod validation;

pub use debounce::DebounceController;
pub use error::SyncError;
pub use payload::HostHeaders;
pub use projector::{Projection, project};
pub use rule::{HostFilter, Rule, RuleSet};
pub use session::{EditEmitter, EditEvent, Editor, Scope, SessionBuilder, SyncSession, UiMode};
pub use settings::{Endpoint, EndpointKey, Settings};
pub use storage::{FileStore, KvStore, MemoryStore};
pub use store::RuleStore;
pub use sync::{HttpTransport, SyncClient, SyncClientBuilder, SyncOutcome, Transport};
