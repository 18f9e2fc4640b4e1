//! Serial transport for CI-V rigs
//!
//! A thin byte pipe: frames from the commander go out unchanged, received
//! bytes go back unchanged (the frame codec upstream does all reframing).
//! The one extra control surface is the RTS line, used as the PTT key for
//! rigs that predate the `1C 00` command.
//!
//! Each connection runs in its own spawned task; the commander holds only
//! channel handles, never the port.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

/// Errors from the serial transport
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: tokio_serial::Error,
    },

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RTS control failed: {0}")]
    Rts(tokio_serial::Error),
}

/// An open serial connection to a rig
#[derive(Debug)]
pub struct SerialTransport {
    port_name: String,
    stream: SerialStream,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, SerialError> {
        let stream = tokio_serial::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()
            .map_err(|source| SerialError::Open {
                port: port_name.to_string(),
                source,
            })?;

        info!("opened serial port {} at {} baud", port_name, baud_rate);

        Ok(Self {
            port_name: port_name.to_string(),
            stream,
        })
    }

    /// Drive the port until a channel closes or the port fails
    ///
    /// * `outbound_rx` - encoded frames from the commander
    /// * `inbound_tx` - raw received bytes toward the commander
    /// * `rts_rx` - PTT keying for rigs using the RTS line
    ///
    /// Serial reads carry no deadline; framing delimiters upstream decide
    /// when a command is complete. On a clean shutdown (outbound channel
    /// closed) any queued bytes are flushed before the port drops; on an
    /// I/O error they are not.
    pub async fn run(
        mut self,
        mut outbound_rx: mpsc::Receiver<Vec<u8>>,
        inbound_tx: mpsc::Sender<Vec<u8>>,
        mut rts_rx: mpsc::Receiver<bool>,
    ) -> Result<(), SerialError> {
        let mut buf = [0u8; 1024];

        loop {
            tokio::select! {
                read = self.stream.read(&mut buf) => {
                    match read {
                        Ok(0) => {
                            debug!("serial port {} closed", self.port_name);
                            return Ok(());
                        }
                        Ok(n) => {
                            if inbound_tx.send(buf[..n].to_vec()).await.is_err() {
                                // Commander gone; nothing left to feed.
                                return Ok(());
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                        Err(e) => {
                            warn!("serial read error on {}: {}", self.port_name, e);
                            return Err(e.into());
                        }
                    }
                }
                frame = outbound_rx.recv() => {
                    match frame {
                        Some(bytes) => {
                            self.stream.write_all(&bytes).await?;
                        }
                        None => {
                            // Clean close: drain what the OS still buffers.
                            let _ = self.stream.flush().await;
                            return Ok(());
                        }
                    }
                }
                rts = rts_rx.recv() => {
                    if let Some(on) = rts {
                        debug!("RTS {} for PTT", if on { "asserted" } else { "released" });
                        self.stream
                            .write_request_to_send(on)
                            .map_err(SerialError::Rts)?;
                    }
                }
            }
        }
    }
}

/// Spawn a serial transport task wired to the given channels
///
/// Returns the join handle; the task resolves with the reason the port
/// stopped.
pub fn spawn(
    port_name: &str,
    baud_rate: u32,
    outbound_rx: mpsc::Receiver<Vec<u8>>,
    inbound_tx: mpsc::Sender<Vec<u8>>,
    rts_rx: mpsc::Receiver<bool>,
) -> Result<tokio::task::JoinHandle<Result<(), SerialError>>, SerialError> {
    let transport = SerialTransport::open(port_name, baud_rate)?;
    Ok(tokio::spawn(
        transport.run(outbound_rx, inbound_tx, rts_rx),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_names_the_port() {
        let err = SerialTransport::open("/dev/does-not-exist-rig", 115_200).unwrap_err();
        match err {
            SerialError::Open { port, .. } => assert_eq!(port, "/dev/does-not-exist-rig"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
