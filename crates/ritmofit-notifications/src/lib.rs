pub mod adapters;
pub mod backend;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod error;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod tap;
pub mod types;

pub use adapters::{LogNavigator, LogPresenter, Navigator, NotificationPresenter};
pub use backend::{BookingBackend, HttpBookingBackend};
pub use config::PollingConfig;
pub use dedup::DedupCache;
pub use dispatcher::{NotificationDispatcher, REMINDER_TITLE, UPDATE_TITLE};
pub use error::NotificationError;
pub use resolver::DeepLinkResolver;
pub use scheduler::PollingScheduler;
pub use service::NotificationService;
pub use session::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SessionStore, SessionUser,
};
pub use tap::TapListener;
pub use types::*;
