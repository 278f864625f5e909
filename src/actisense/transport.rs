//! Outbound transports for Actisense lines.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::EmpirBusError;

/// Accepts one formatted Actisense line for transmission.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    async fn send_line(&self, line: &str) -> Result<(), EmpirBusError>;
}

/// Writes each line, newline-terminated, to an async writer (serial port
/// half, stdout, a file).
pub struct WriterTransport<W> {
    writer: Mutex<W>,
}

impl<W> WriterTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> FrameTransport for WriterTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_line(&self, line: &str) -> Result<(), EmpirBusError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}
