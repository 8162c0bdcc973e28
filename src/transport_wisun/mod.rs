use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::sync::{oneshot, Mutex};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::config::CommunicationConfig;
use crate::echonet::EchonetController;

/* ECHONET Lite service port, as the SK stack prints it */
const ECHONET_PORT_HEX: &str = "0E1A";
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

type PendingCommand = Arc<Mutex<Option<oneshot::Sender<String>>>>;
type SharedWriter = Arc<Mutex<WriteHalf<SerialStream>>>;

/// B-route side of the emulator: a line-oriented SK command channel to the
/// Wi-SUN dongle. ECHONET frames arrive inside ERXUDP notifications and
/// replies leave as SKSENDTO commands; everything else on the wire is
/// command/response plumbing.
///
/// A missing dongle only disables B-route visibility. The UDP side keeps
/// serving.
pub struct WiSunManager {
    controller: Arc<EchonetController>,
    device: String,
    baudrate: u32,
    b_route_id: String,
    b_route_password: String,
    pending: PendingCommand,
}

impl WiSunManager {
    pub fn new(controller: Arc<EchonetController>, config: &CommunicationConfig) -> Self {
        return WiSunManager {
            controller,
            device: config.wisun_device.clone(),
            baudrate: config.wisun_baudrate,
            b_route_id: config.b_route_id.clone(),
            b_route_password: config.b_route_password.clone(),
            pending: Arc::new(Mutex::new(None)),
        };
    }

    pub async fn start_thread(&mut self) {
        let stream = match tokio_serial::new(self.device.as_str(), self.baudrate).open_native_async() {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "Wi-SUN dongle not found on {} ({e}), B-route disabled",
                    self.device
                );
                return;
            }
        };
        info!("Connected to Wi-SUN dongle at {}", self.device);

        let (read_half, write_half) = tokio::io::split(stream);
        let writer: SharedWriter = Arc::new(Mutex::new(write_half));

        let controller = Arc::clone(&self.controller);
        let pending = Arc::clone(&self.pending);
        let reader_writer = Arc::clone(&writer);
        tokio::spawn(async move {
            read_loop(read_half, pending, controller, reader_writer).await;
        });

        self.initialize_stack(&writer).await;
    }

    /// SK stack bring-up: reset, credentials, then start coordinator mode.
    /// A failed step is logged and aborts the sequence; nothing retries.
    async fn initialize_stack(&self, writer: &SharedWriter) {
        info!("Initializing Wi-SUN stack");

        let _ = write_line(writer, "SKRESET").await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let cmd = format!("SKSETPWD C {}", self.b_route_password);
        if !self.send_command_wait_ok(writer, &cmd).await {
            error!("Failed to set B-route password");
            return;
        }

        let cmd = format!("SKSETRBID {}", self.b_route_id);
        if !self.send_command_wait_ok(writer, &cmd).await {
            error!("Failed to set B-route id");
            return;
        }

        if self.send_command_wait_ok(writer, "SKSTART").await {
            info!("Wi-SUN stack started (coordinator mode)");
        } else {
            error!("Failed to start the Wi-SUN stack");
        }
    }

    async fn send_command_wait_ok(&self, writer: &SharedWriter, cmd: &str) -> bool {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            *pending = Some(tx);
        }

        if write_line(writer, cmd).await.is_err() {
            let mut pending = self.pending.lock().await;
            *pending = None;
            return false;
        }

        let result = match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(res)) => res == "OK",
            Ok(Err(_)) => false,
            Err(_) => {
                warn!("Command timeout: {cmd}");
                false
            }
        };

        let mut pending = self.pending.lock().await;
        *pending = None;
        return result;
    }
}

async fn write_line(writer: &SharedWriter, line: &str) -> std::io::Result<()> {
    let mut w = writer.lock().await;
    w.write_all(format!("{line}\r\n").as_bytes()).await?;
    w.flush().await?;
    info!("TX: {line}");
    return Ok(());
}

async fn read_loop(
    read_half: ReadHalf<SerialStream>,
    pending: PendingCommand,
    controller: Arc<EchonetController>,
    writer: SharedWriter,
) {
    info!("Starting serial read loop");
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                warn!("Serial stream closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Serial read error: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("RX: {line}");

        /* Command responses resolve the outstanding future, if any */
        if line == "OK" || line.starts_with("FAIL") {
            let mut slot = pending.lock().await;
            if let Some(tx) = slot.take() {
                let _ = tx.send(if line == "OK" { "OK" } else { "FAIL" }.to_string());
            }
        }

        if line.starts_with("EVENT") {
            handle_event(line);
        }

        if line.starts_with("ERXUDP") {
            if let Some((sender, payload)) = parse_erxudp(line) {
                info!("Received ECHONET packet from {sender}");
                if let Some(reply) = controller.handle_frame(&payload) {
                    send_udp(&writer, &sender, &reply).await;
                }
            }
        }
    }
}

fn handle_event(line: &str) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return;
    }
    match parts[1] {
        /* PANA connection established */
        "25" => info!("PANA connection established with {}", parts[2]),
        /* UDP send completed */
        "21" => debug!("UDP send completed"),
        other => debug!("Wi-SUN event {other}"),
    }
}

/// ERXUDP <sender> <dest> <rport> <lport> <senderlla> <secured> <len> <data>.
/// Only ECHONET Lite traffic (local port 0E1A) passes; anything else on the
/// dongle (PANA and friends) is dropped here.
fn parse_erxudp(line: &str) -> Option<(String, Vec<u8>)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 9 {
        return None;
    }

    let sender = parts[1];
    let lport = parts[4];
    if !lport.eq_ignore_ascii_case(ECHONET_PORT_HEX) {
        debug!("Skipping non-ECHONET packet on port {lport}");
        return None;
    }

    match hex::decode(parts[8]) {
        Ok(payload) => Some((sender.to_string(), payload)),
        Err(e) => {
            warn!("Bad ERXUDP payload: {e}");
            None
        }
    }
}

/// SKSENDTO carries the frame as raw bytes after the header; the stack
/// consumes exactly the announced length, so no trailing CRLF.
async fn send_udp(writer: &SharedWriter, ip: &str, data: &[u8]) {
    let header = format!("SKSENDTO 1 {ip} {ECHONET_PORT_HEX} 1 {:04X} ", data.len());
    let mut w = writer.lock().await;
    let result = async {
        w.write_all(header.as_bytes()).await?;
        w.write_all(data).await?;
        w.flush().await
    }
    .await;
    match result {
        Ok(_) => debug!("UDP sent to {ip}: {} bytes", data.len()),
        Err(e) => error!("Failed to send UDP reply to {ip}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erxudp_accepts_echonet_port() {
        let line = "ERXUDP FE80:0000:0000:0000:021D:1290:1234:5678 \
                    FF02:0000:0000:0000:0000:0000:0000:0001 0E1A 0E1A \
                    001D129012345678 1 0012 108100000EF0010EF0017301D50400";
        let (sender, payload) = parse_erxudp(line).unwrap();
        assert!(sender.starts_with("FE80"));
        assert_eq!(payload[0], 0x10);
        assert_eq!(payload[1], 0x81);
    }

    #[test]
    fn erxudp_filters_other_ports() {
        let line = "ERXUDP FE80::1 FF02::1 02CC 02CC 001D129012345678 1 0004 DEADBEEF";
        assert!(parse_erxudp(line).is_none());
    }

    #[test]
    fn erxudp_rejects_short_lines() {
        assert!(parse_erxudp("ERXUDP FE80::1 FF02::1 0E1A").is_none());
    }

    #[test]
    fn erxudp_rejects_bad_hex() {
        let line = "ERXUDP FE80::1 FF02::1 0E1A 0E1A 001D 1 0004 XYZ!";
        assert!(parse_erxudp(line).is_none());
    }
}
