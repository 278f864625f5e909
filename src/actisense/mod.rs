//! The actisense module contains the ASCII interchange format used by the
//! bus transport, the outbound transport abstraction, and the serial gateway
//! connection.

pub mod format;
pub mod serial;
pub mod transport;

pub use format::{format_serial_line, SerialLine};
pub use serial::{ActisenseSerial, SerialConfig};
pub use transport::{FrameTransport, WriterTransport};
