//! TCP accept loop and per-client tasks

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::session::{ClientSession, LineResult};
use crate::RigCtlHandle;

/// The rigctld-compatible TCP server
///
/// Each accepted connection gets its own task and its own
/// [`ClientSession`]; clients share nothing but the commander handle, so
/// one client's errors never disturb another.
pub struct RigCtlServer {
    listener: TcpListener,
    handle: RigCtlHandle,
    version: String,
}

impl RigCtlServer {
    /// Bind the server socket
    pub async fn bind(
        addr: SocketAddr,
        handle: RigCtlHandle,
        version: String,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("rigctl server listening on {}", addr);
        Ok(Self {
            listener,
            handle,
            version,
        })
    }

    /// Local address the listener bound to (useful with port 0)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept clients until the listener fails
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("rigctl client connected: {}", peer);

            let session = ClientSession::new(self.handle.clone(), self.version.clone());
            tokio::spawn(async move {
                if let Err(e) = handle_client(stream, session).await {
                    warn!("rigctl client {} error: {}", peer, e);
                }
                debug!("rigctl client {} disconnected", peer);
            });
        }
    }
}

async fn handle_client(stream: TcpStream, mut session: ClientSession) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();

    loop {
        raw.clear();
        // No read deadline: clients may idle indefinitely between commands.
        let n = reader.read_until(b'\n', &mut raw).await?;
        if n == 0 {
            return Ok(());
        }

        let line = ClientSession::expand_escapes(&raw);
        match session.process_line(&line).await {
            LineResult::Reply(reply) => {
                if !reply.is_empty() {
                    writer.write_all(reply.as_bytes()).await?;
                    writer.flush().await?;
                }
            }
            LineResult::Quit => return Ok(()),
        }
    }
}
