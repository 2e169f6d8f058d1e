//! pnet-based packet capture implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, NetworkInterface};
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;
use tracing::debug;

use super::PacketCapture;
use crate::domain::{Frame, FrameProtocol, HardwareAddress, ETHERTYPE_WOL, WOL_UDP_PORT};
use crate::error::CaptureError;

/// How long a read blocks before the running flag is checked again.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Packet capture using the pnet library.
pub struct PnetCapture {
    interface: NetworkInterface,
    running: Arc<AtomicBool>,
}

impl PnetCapture {
    /// Create a new capture on the specified interface.
    pub fn new(interface_name: &str) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface_name.to_string()))?;

        Ok(Self {
            interface,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// List all available network interfaces.
    pub fn list_interfaces() -> Vec<String> {
        datalink::interfaces()
            .into_iter()
            .map(|iface| {
                let status = if iface.is_up() { "UP" } else { "DOWN" };
                let mac = iface
                    .mac
                    .map(|mac| HardwareAddress::new(mac.octets()).to_string())
                    .unwrap_or_else(|| "no MAC".to_string());
                format!("{}: {} [{}]", iface.name, status, mac)
            })
            .collect()
    }
}

impl PacketCapture for PnetCapture {
    fn capture_wol_frames(&mut self) -> Result<Box<dyn Iterator<Item = Frame> + '_>, CaptureError> {
        let config = Config {
            read_timeout: Some(READ_TIMEOUT),
            ..Config::default()
        };

        let rx = match datalink::channel(&self.interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(CaptureError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(CaptureError::InsufficientPermissions);
                }
                let msg = e.to_string();
                if msg.contains("permission") || msg.contains("Operation not permitted") {
                    return Err(CaptureError::InsufficientPermissions);
                }
                return Err(CaptureError::ChannelCreation(msg));
            }
        };

        Ok(Box::new(WolFrameIterator {
            rx,
            running: Arc::clone(&self.running),
        }))
    }

    fn interface_name(&self) -> &str {
        &self.interface.name
    }

    fn set_running(&mut self, running: Arc<AtomicBool>) {
        self.running = running;
    }
}

/// Iterator that yields candidate WOL frames from the network.
struct WolFrameIterator {
    rx: Box<dyn datalink::DataLinkReceiver>,
    running: Arc<AtomicBool>,
}

impl Iterator for WolFrameIterator {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        while self.running.load(Ordering::SeqCst) {
            match self.rx.next() {
                Ok(packet) => {
                    if let Some(frame) = extract_wol_frame(packet) {
                        return Some(frame);
                    }
                }
                // Read timeout, re-check the running flag.
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => debug!("Capture error: {}", e),
            }
        }
        None
    }
}

/// Apply the capture filter to a raw Ethernet frame.
///
/// Accepts frames with the WOL ethertype and IPv4/IPv6 UDP datagrams sent
/// to port 9. Everything else is `None`.
pub fn extract_wol_frame(data: &[u8]) -> Option<Frame> {
    let ethernet = EthernetPacket::new(data)?;

    let (protocol, payload) = match ethernet.get_ethertype() {
        EtherType(ETHERTYPE_WOL) => (FrameProtocol::RawEthernet, ethernet.payload().to_vec()),
        EtherTypes::Ipv4 => {
            let ipv4 = Ipv4Packet::new(ethernet.payload())?;
            udp_to_wol_port(ipv4.get_next_level_protocol(), ipv4.payload())?
        }
        EtherTypes::Ipv6 => {
            let ipv6 = Ipv6Packet::new(ethernet.payload())?;
            udp_to_wol_port(ipv6.get_next_header(), ipv6.payload())?
        }
        _ => return None,
    };

    Some(Frame {
        length: data.len(),
        destination: HardwareAddress::new(ethernet.get_destination().octets()),
        source: HardwareAddress::new(ethernet.get_source().octets()),
        protocol,
        payload,
    })
}

fn udp_to_wol_port(next: IpNextHeaderProtocol, data: &[u8]) -> Option<(FrameProtocol, Vec<u8>)> {
    if next != IpNextHeaderProtocols::Udp {
        return None;
    }
    let udp = UdpPacket::new(data)?;
    let port = udp.get_destination();
    if port != WOL_UDP_PORT {
        return None;
    }
    Some((FrameProtocol::Udp { port }, udp.payload().to_vec()))
}
