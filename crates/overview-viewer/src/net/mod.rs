pub mod http;
pub mod protocol;

pub use http::{HttpTransport, Transport};
pub use protocol::{Incoming, IncomingKind};
