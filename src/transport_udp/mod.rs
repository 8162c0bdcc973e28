use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::UdpSocket;

use crate::config::CommunicationConfig;
use crate::echonet::frame::{EchonetFrame, ESV_INF, NODE_PROFILE_KEY};
use crate::echonet::EchonetController;

/// Wi-Fi facing ECHONET Lite endpoint: unicast on the service port plus the
/// 224.0.23.0 presence group. Answers through the shared controller; all
/// socket failures degrade to log lines.
pub struct UdpManager {
    controller: Arc<EchonetController>,
    port: u16,
    multicast_group: Ipv4Addr,
}

impl UdpManager {
    pub fn new(controller: Arc<EchonetController>, config: &CommunicationConfig) -> Self {
        let multicast_group = config
            .multicast_group
            .parse()
            .unwrap_or(Ipv4Addr::new(224, 0, 23, 0));
        return UdpManager {
            controller,
            port: config.echonet_port,
            multicast_group,
        };
    }

    pub async fn start_thread(&mut self) {
        let socket = match self.open_socket() {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to start the ECHONET Lite UDP endpoint: {e}");
                return;
            }
        };
        info!(
            "ECHONET Lite UDP server listening on port {} (multicast {})",
            self.port, self.multicast_group
        );

        self.announce_instances(&socket).await;

        let mut buf = [0u8; 1500];
        loop {
            let (len, addr) = match socket.recv_from(&mut buf).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("UDP receive error: {e}");
                    continue;
                }
            };
            debug!("RX {} bytes from {addr}", len);
            if let Some(reply) = self.controller.handle_frame(&buf[..len]) {
                if let Err(e) = socket.send_to(&reply, addr).await {
                    warn!("UDP send error to {addr}: {e}");
                }
            }
        }
    }

    fn open_socket(&self) -> std::io::Result<UdpSocket> {
        let socket = std::net::UdpSocket::bind(("0.0.0.0", self.port))?;
        socket.join_multicast_v4(&self.multicast_group, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_multicast_ttl_v4(2)?;
        socket.set_nonblocking(true)?;
        return UdpSocket::from_std(socket);
    }

    /// One unsolicited INF carrying the node-profile instance list (0xD5),
    /// announcing this node to the multicast group.
    async fn announce_instances(&self, socket: &UdpSocket) {
        let node_profile = match self.controller.get_object(&NODE_PROFILE_KEY) {
            Some(o) => o,
            None => {
                warn!("No node profile registered, skipping announcement");
                return;
            }
        };
        let instance_list = match node_profile.get_property(0xD5) {
            Some(v) => v,
            None => return,
        };

        let mut frame = EchonetFrame::new(ESV_INF);
        frame.seoj = NODE_PROFILE_KEY;
        frame.deoj = NODE_PROFILE_KEY;
        frame.props.push((0xD5, instance_list));

        match socket
            .send_to(&frame.to_bytes(), (self.multicast_group, self.port))
            .await
        {
            Ok(_) => info!(
                "Sent instance list notification to {}:{}",
                self.multicast_group, self.port
            ),
            Err(e) => error!("Failed to send instance list notification: {e}"),
        }
    }
}
