//! Integration tests for the rig commander
//!
//! These drive the actor end-to-end over its channels: identification,
//! reconciliation ordering, passband precedence, and the spectrum path.

use tokio::sync::{broadcast, mpsc, oneshot};

use civ_protocol::bcd::freq_to_bcd;
use civ_rig::{
    run_commander, CommanderCommand, RigEvent, RigState, SessionConfig, StateKey, StateValue,
};

struct Harness {
    cmd_tx: mpsc::Sender<CommanderCommand>,
    data_tx: mpsc::Sender<Vec<u8>>,
    wire_rx: mpsc::Receiver<Vec<u8>>,
    event_rx: broadcast::Receiver<RigEvent>,
}

fn spawn() -> Harness {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (data_tx, data_rx) = mpsc::channel(64);
    let (wire_tx, wire_rx) = mpsc::channel(256);
    let (event_tx, event_rx) = broadcast::channel(1024);

    tokio::spawn(run_commander(
        SessionConfig::default(),
        cmd_rx,
        data_rx,
        wire_tx,
        None,
        event_tx,
    ));

    Harness {
        cmd_tx,
        data_tx,
        wire_rx,
        event_rx,
    }
}

async fn identify(h: &mut Harness, model_id: u8, civ: u8) {
    h.cmd_tx.send(CommanderCommand::FindRigs).await.unwrap();
    let _query = h.wire_rx.recv().await.unwrap();

    let reply = vec![0xFE, 0xFE, 0xE1, civ, 0x19, 0x00, model_id, 0xFD];
    h.data_tx.send(reply).await.unwrap();

    loop {
        if let RigEvent::DiscoveredRig { .. } = h.event_rx.recv().await.unwrap() {
            break;
        }
    }
}

async fn snapshot(h: &Harness) -> RigState {
    let (tx, rx) = oneshot::channel();
    h.cmd_tx
        .send(CommanderCommand::QueryState { respond: tx })
        .await
        .unwrap();
    rx.await.unwrap()
}

#[tokio::test]
async fn every_write_is_followed_by_its_read_and_settles() {
    let mut h = spawn();
    identify(&mut h, 0x94, 0x94).await;

    for (key, value) in [
        (StateKey::VfoAFreq, StateValue::U64(7_074_000)),
        (StateKey::Mode, StateValue::U8(0x01)),
        (StateKey::AfGain, StateValue::U8(128)),
    ] {
        h.cmd_tx
            .send(CommanderCommand::SetState { key, value })
            .await
            .unwrap();
    }

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let mut sent = Vec::new();
    while let Ok(frame) = h.wire_rx.try_recv() {
        sent.push(frame);
    }

    // Write-then-read discipline, per key.
    for (write, read) in [(0x05u8, 0x03u8), (0x06, 0x04)] {
        let w = sent.iter().position(|f| f[4] == write).unwrap();
        let r = sent.iter().position(|f| f[4] == read).unwrap();
        assert!(w < r, "write 0x{write:02X} must precede read 0x{read:02X}");
    }
    let af_write = sent
        .iter()
        .position(|f| f[4] == 0x14 && f[5] == 0x01 && f.len() > 7)
        .unwrap();
    let af_read = sent
        .iter()
        .position(|f| f[4] == 0x14 && f[5] == 0x01 && f.len() == 7)
        .unwrap();
    assert!(af_write < af_read);

    // After reconciliation no key is left marked.
    let state = snapshot(&h).await;
    assert!(state.updated_keys().is_empty());
}

#[tokio::test]
async fn rig_reported_passband_overrides_the_fallback() {
    let mut h = spawn();
    identify(&mut h, 0x94, 0x94).await;

    // Mode USB, filter 2: fallback passband is 2400 Hz.
    h.data_tx
        .send(vec![0xFE, 0xFE, 0xE1, 0x94, 0x04, 0x01, 0x02, 0xFD])
        .await
        .unwrap();
    loop {
        if let RigEvent::StateChanged {
            key: StateKey::Filter,
            ..
        } = h.event_rx.recv().await.unwrap()
        {
            break;
        }
    }

    let state = snapshot(&h).await;
    assert!(!state.is_valid(StateKey::Passband));
    assert_eq!(
        state.effective_passband(Some(civ_protocol::ModeKind::Usb)),
        2400
    );

    // The rig reports filter width register 31: 600 + 21*100 = 2700 Hz.
    h.data_tx
        .send(vec![0xFE, 0xFE, 0xE1, 0x94, 0x1A, 0x03, 0x31, 0xFD])
        .await
        .unwrap();
    loop {
        if let RigEvent::StateChanged {
            key: StateKey::Passband,
            value,
        } = h.event_rx.recv().await.unwrap()
        {
            assert_eq!(value.as_u16(), 2700);
            break;
        }
    }

    let state = snapshot(&h).await;
    assert!(state.is_valid(StateKey::Passband));
    assert_eq!(
        state.effective_passband(Some(civ_protocol::ModeKind::Usb)),
        2700
    );
}

#[tokio::test]
async fn spectrum_fragments_assemble_through_the_commander() {
    let mut h = spawn();
    identify(&mut h, 0x94, 0x94).await;

    // Fragment 1: center mode, center 14.2 MHz, half-span 50 kHz.
    let mut first = vec![0xFE, 0xFE, 0xE1, 0x94, 0x27, 0x00, 0x00, 0x01, 0x11, 0x00];
    first.extend(freq_to_bcd(14_200_000, 5));
    first.extend(freq_to_bcd(50_000, 5));
    first.push(0x00);
    first.push(0xFD);
    h.data_tx.send(first).await.unwrap();

    for seq in 2..=11u8 {
        let mut frag = vec![
            0xFE,
            0xFE,
            0xE1,
            0x94,
            0x27,
            0x00,
            0x00,
            ((seq / 10) << 4) | (seq % 10),
            0x11,
        ];
        let pixels = if seq == 11 { 25 } else { 50 };
        frag.extend(std::iter::repeat(0x42).take(pixels));
        frag.push(0xFD);
        h.data_tx.send(frag).await.unwrap();
    }

    loop {
        if let RigEvent::Spectrum(line) = h.event_rx.recv().await.unwrap() {
            assert_eq!(line.start_hz, 14_150_000);
            assert_eq!(line.end_hz, 14_250_000);
            assert_eq!(line.pixels.len(), 475);
            break;
        }
    }
}

#[tokio::test]
async fn unknown_model_still_operates() {
    let mut h = spawn();
    h.cmd_tx.send(CommanderCommand::FindRigs).await.unwrap();
    let _ = h.wire_rx.recv().await.unwrap();

    h.data_tx
        .send(vec![0xFE, 0xFE, 0xE1, 0x42, 0x19, 0x00, 0x42, 0xFD])
        .await
        .unwrap();

    loop {
        if let RigEvent::DiscoveredRig { caps } = h.event_rx.recv().await.unwrap() {
            assert_eq!(caps.name, "IC-0x42");
            assert_eq!(caps.civ_address, 0x42);
            break;
        }
    }

    // Frequency control still works against the synthetic record.
    h.cmd_tx
        .send(CommanderCommand::SetState {
            key: StateKey::VfoAFreq,
            value: StateValue::U64(7_100_000),
        })
        .await
        .unwrap();
    let write = h.wire_rx.recv().await.unwrap();
    assert_eq!(&write[..5], &[0xFE, 0xFE, 0x42, 0xE1, 0x05]);
}

#[tokio::test]
async fn rts_rigs_key_the_line_instead_of_sending_ptt() {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (data_tx, data_rx) = mpsc::channel(64);
    let (wire_tx, mut wire_rx) = mpsc::channel(256);
    let (event_tx, mut event_rx) = broadcast::channel(1024);
    let (rts_tx, mut rts_rx) = mpsc::channel(8);

    tokio::spawn(run_commander(
        SessionConfig::default(),
        cmd_rx,
        data_rx,
        wire_tx,
        Some(rts_tx),
        event_tx,
    ));

    // An IC-718 answers the broadcast: no PTT command, RTS keying.
    cmd_tx.send(CommanderCommand::FindRigs).await.unwrap();
    let _ = wire_rx.recv().await.unwrap();
    data_tx
        .send(vec![0xFE, 0xFE, 0xE1, 0x5E, 0x19, 0x00, 0x5E, 0xFD])
        .await
        .unwrap();
    loop {
        if let RigEvent::DiscoveredRig { caps } = event_rx.recv().await.unwrap() {
            assert!(caps.use_rts_for_ptt);
            break;
        }
    }

    cmd_tx
        .send(CommanderCommand::SetState {
            key: StateKey::Ptt,
            value: StateValue::Bool(true),
        })
        .await
        .unwrap();

    // The line asserts, and no 1C frame goes out.
    assert!(rts_rx.recv().await.unwrap());
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    while let Ok(frame) = wire_rx.try_recv() {
        assert_ne!(frame[4], 0x1C, "PTT must not be commanded on an RTS rig");
    }
}

#[tokio::test]
async fn malformed_bcd_frame_is_dropped_without_state_update() {
    let mut h = spawn();
    identify(&mut h, 0x94, 0x94).await;

    // 0x4A is not a BCD digit pair.
    h.data_tx
        .send(vec![
            0xFE, 0xFE, 0xE1, 0x94, 0x03, 0x00, 0x60, 0x4A, 0x14, 0x00, 0x00, 0xFD,
        ])
        .await
        .unwrap();

    // A good frame afterwards still parses: the stream survived.
    h.data_tx
        .send(vec![
            0xFE, 0xFE, 0xE1, 0x94, 0x03, 0x00, 0x60, 0x45, 0x14, 0x00, 0x00, 0xFD,
        ])
        .await
        .unwrap();

    loop {
        if let RigEvent::StateChanged {
            key: StateKey::VfoAFreq,
            value,
        } = h.event_rx.recv().await.unwrap()
        {
            assert_eq!(value.as_u64(), 14_456_000);
            break;
        }
    }
}
