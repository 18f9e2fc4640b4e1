//! End-to-end tests: TCP client -> command server -> commander -> wire
//!
//! A fake rig sits on the commander's transport channels; the test talks
//! to the server over a real TCP socket, exactly like `rigctl -m 2`.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};

use civ_rig::{run_commander, CommanderCommand, SessionConfig};
use civ_rigctld::{RigCtlHandle, RigCtlServer};

struct Fixture {
    client: BufReader<TcpStream>,
    data_tx: mpsc::Sender<Vec<u8>>,
    wire_rx: mpsc::Receiver<Vec<u8>>,
}

async fn start_ic7300() -> Fixture {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (data_tx, data_rx) = mpsc::channel(64);
    let (wire_tx, mut wire_rx) = mpsc::channel(256);
    let (event_tx, mut event_rx) = broadcast::channel(1024);

    tokio::spawn(run_commander(
        SessionConfig::default(),
        cmd_rx,
        data_rx,
        wire_tx,
        None,
        event_tx,
    ));

    // Identify the rig before any client shows up.
    cmd_tx.send(CommanderCommand::FindRigs).await.unwrap();
    let _query = wire_rx.recv().await.unwrap();
    data_tx
        .send(vec![0xFE, 0xFE, 0xE1, 0x94, 0x19, 0x00, 0x94, 0xFD])
        .await
        .unwrap();
    loop {
        if let civ_rig::RigEvent::DiscoveredRig { .. } = event_rx.recv().await.unwrap() {
            break;
        }
    }

    let server = RigCtlServer::bind(
        "127.0.0.1:0".parse().unwrap(),
        RigCtlHandle::new(cmd_tx.clone()),
        "0.4.0".to_string(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let client = BufReader::new(TcpStream::connect(addr).await.unwrap());

    Fixture {
        client,
        data_tx,
        wire_rx,
    }
}

async fn send_line(f: &mut Fixture, line: &str) {
    f.client
        .get_mut()
        .write_all(format!("{line}\n").as_bytes())
        .await
        .unwrap();
}

async fn read_line(f: &mut Fixture) -> String {
    let mut line = String::new();
    f.client.read_line(&mut line).await.unwrap();
    line.trim_end().to_string()
}

#[tokio::test]
async fn set_freq_emits_the_civ_frame_and_reports_ok() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "F 14250000").await;

    // The commander writes then reads.
    let write = f.wire_rx.recv().await.unwrap();
    assert_eq!(
        write,
        vec![0xFE, 0xFE, 0x94, 0xE1, 0x05, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]
    );
    let read = f.wire_rx.recv().await.unwrap();
    assert_eq!(read, vec![0xFE, 0xFE, 0x94, 0xE1, 0x03, 0xFD]);

    assert_eq!(read_line(&mut f).await, "RPRT 0");
}

#[tokio::test]
async fn get_freq_round_trips_a_set() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "F 14250000").await;
    assert_eq!(read_line(&mut f).await, "RPRT 0");

    send_line(&mut f, "f").await;
    assert_eq!(read_line(&mut f).await, "14250000");
}

#[tokio::test]
async fn long_form_get_freq_labels_the_reply() {
    let mut f = start_ic7300().await;

    // Rig reports 14.25 MHz.
    f.data_tx
        .send(vec![
            0xFE, 0xFE, 0xE1, 0x94, 0x03, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD,
        ])
        .await
        .unwrap();
    // Give the commander a beat to parse before asking.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    send_line(&mut f, "+f").await;
    assert_eq!(read_line(&mut f).await, "Frequency: 14250000");
    assert_eq!(read_line(&mut f).await, "RPRT 0");
}

#[tokio::test]
async fn separator_prefix_changes_field_separator() {
    let mut f = start_ic7300().await;

    send_line(&mut f, ";s").await;
    let line = read_line(&mut f).await;
    // Split flag and TX VFO on one line, semicolon-separated.
    assert_eq!(line, "0;VFOB;");
}

#[tokio::test]
async fn mode_set_and_get_with_passband() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "M USB 2400").await;
    assert_eq!(read_line(&mut f).await, "RPRT 0");

    send_line(&mut f, "m").await;
    assert_eq!(read_line(&mut f).await, "USB");
    assert_eq!(read_line(&mut f).await, "2400");
}

#[tokio::test]
async fn unimplemented_command_reports_minus_eleven() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "G XCHG").await;
    assert_eq!(read_line(&mut f).await, "RPRT -11");
}

#[tokio::test]
async fn dump_state_trailer_appears_after_chk_vfo() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "dump_state").await;
    let mut saw_model = false;
    let mut masks = 0;
    // Without chk_vfo the dump ends after the six capability masks.
    while masks < 6 {
        let line = read_line(&mut f).await;
        if line == "3073" {
            saw_model = true;
        }
        if line == "0xffffffffffffffff" {
            masks += 1;
        }
    }
    assert!(saw_model);

    send_line(&mut f, "chk_vfo").await;
    assert_eq!(read_line(&mut f).await, "0");

    send_line(&mut f, "dump_state").await;
    let mut saw_done = false;
    loop {
        let line = read_line(&mut f).await;
        if line == "done" {
            saw_done = true;
            break;
        }
    }
    assert!(saw_done);
}

#[tokio::test]
async fn get_rig_info_carries_a_crc_trailer() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "get_rig_info").await;
    let mut body = String::new();
    let crc_line = loop {
        let line = read_line(&mut f).await;
        if line.starts_with("CRC=0x") {
            break line;
        }
        body.push_str(&line);
        body.push('\n');
    };

    assert!(body.contains("App=wfview"));
    assert!(body.contains("Rig=IC-7300"));
    let declared = u32::from_str_radix(crc_line.trim_start_matches("CRC=0x"), 16).unwrap();
    assert_eq!(declared, civ_rigctld::dump::crc32(body.as_bytes()));
}

#[tokio::test]
async fn quit_closes_the_connection() {
    let mut f = start_ic7300().await;

    send_line(&mut f, "q").await;
    let mut line = String::new();
    let n = f.client.read_line(&mut line).await.unwrap();
    assert_eq!(n, 0, "server should close after q");
}
