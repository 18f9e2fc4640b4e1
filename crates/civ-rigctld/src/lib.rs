//! Hamlib-compatible command server
//!
//! Replicates the subset of the `rigctld` vocabulary this system exposes,
//! backed by the rig state register: reads are non-blocking snapshots,
//! writes mark register keys and let the commander's reconciliation pass
//! turn them into CI-V traffic.
//!
//! - [`server`]: TCP accept loop, one task per client
//! - [`session`]: line parsing and the command vocabulary
//! - [`dump`]: `dump_state`, `get_rig_info`, CRC-32
//! - [`cal`]: per-model S-meter calibration for `STRENGTH`

pub mod cal;
pub mod dump;
pub mod server;
pub mod session;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use civ_protocol::models::RigCapabilities;
use civ_rig::{CommanderCommand, RigState, StateKey, StateValue};

pub use server::RigCtlServer;
pub use session::{ClientSession, LineResult};

/// A client's handle to the rig commander
///
/// Cheap to clone; every TCP session gets one. All access goes through
/// the commander's mailbox, so the register stays single-owner.
#[derive(Clone)]
pub struct RigCtlHandle {
    cmd_tx: mpsc::Sender<CommanderCommand>,
}

impl RigCtlHandle {
    pub fn new(cmd_tx: mpsc::Sender<CommanderCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Snapshot the full register; `None` if the commander is gone
    pub async fn snapshot(&self) -> Option<RigState> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(CommanderCommand::QueryState { respond: tx })
            .await
            .ok()?;
        rx.await.ok()
    }

    /// The bound capability record, once identification has completed
    pub async fn caps(&self) -> Option<RigCapabilities> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(CommanderCommand::QueryCaps { respond: tx })
            .await
            .ok()?;
        rx.await.ok().flatten()
    }

    /// Write one register key; the commander reconciles it to the rig
    pub async fn set(&self, key: StateKey, value: StateValue) {
        if self
            .cmd_tx
            .send(CommanderCommand::SetState { key, value })
            .await
            .is_err()
        {
            warn!("commander mailbox closed, dropping write to {:?}", key);
        }
    }
}
