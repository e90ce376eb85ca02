pub mod error;
pub mod net;
pub mod render;
pub mod util;
pub mod view_model;

pub use error::{FailureKind, FetchError};
pub use net::{HttpTransport, Incoming, IncomingKind, Transport};
pub use view_model::{Phase, PollingViewModel, DEFAULT_POLL_INTERVAL};
