//! IPv4 header view with transport ports
//!
//! Parses just enough of an IPv4 packet to fill the network and transport
//! fields of an exact-match flow rule.

use super::IpProtocol;
use crate::{Error, Result};
use std::net::Ipv4Addr;

pub const MIN_HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    /// DSCP in the upper six bits, ECN cleared
    pub tos: u8,
    pub protocol: u8,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    header_len: usize,
    fragment_offset: u16,
}

/// Transport identifiers: ports for TCP/UDP, type/code for ICMP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPorts {
    pub src: u16,
    pub dst: u16,
}

impl Ipv4Header {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_HEADER_SIZE {
            return Err(Error::Parse("IPv4 header too short".into()));
        }
        let version = data[0] >> 4;
        if version != 4 {
            return Err(Error::Parse(format!("not IPv4 (version {})", version)));
        }
        let header_len = usize::from(data[0] & 0x0f) * 4;
        if header_len < MIN_HEADER_SIZE || data.len() < header_len {
            return Err(Error::Parse(format!("bad IHL ({} bytes)", header_len)));
        }

        Ok(Self {
            tos: data[1] & 0xfc,
            protocol: data[9],
            src: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            dst: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            header_len,
            fragment_offset: u16::from_be_bytes([data[6], data[7]]) & 0x1fff,
        })
    }

    /// Transport identifiers, present only in the first fragment
    pub fn transport_ports(&self, packet: &[u8]) -> Option<TransportPorts> {
        if self.fragment_offset != 0 {
            return None;
        }
        let l4 = packet.get(self.header_len..)?;
        match IpProtocol::from_u8(self.protocol)? {
            IpProtocol::Tcp | IpProtocol::Udp => {
                let ports = l4.get(..4)?;
                Some(TransportPorts {
                    src: u16::from_be_bytes([ports[0], ports[1]]),
                    dst: u16::from_be_bytes([ports[2], ports[3]]),
                })
            }
            IpProtocol::Icmp => {
                let head = l4.get(..2)?;
                Some(TransportPorts {
                    src: u16::from(head[0]),
                    dst: u16::from(head[1]),
                })
            }
        }
    }
}

/// Build a minimal IPv4 header for synthetic test frames
#[cfg(test)]
pub(crate) fn build_header(
    protocol: u8,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    payload_len: usize,
) -> Vec<u8> {
    let total_len = u16::try_from(MIN_HEADER_SIZE + payload_len)
        .expect("IPv4 total length exceeds 65535 bytes");
    let mut header = vec![0u8; MIN_HEADER_SIZE];
    header[0] = 0x45;
    header[2..4].copy_from_slice(&total_len.to_be_bytes());
    header[8] = 64;
    header[9] = protocol;
    header[12..16].copy_from_slice(&src.octets());
    header[16..20].copy_from_slice(&dst.octets());

    let checksum = !header
        .chunks(2)
        .map(|w| u32::from(u16::from_be_bytes([w[0], w[1]])))
        .fold(0u32, |acc, w| {
            let sum = acc + w;
            (sum & 0xffff) + (sum >> 16)
        }) as u16;
    header[10..12].copy_from_slice(&checksum.to_be_bytes());
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp_packet(src_port: u16, dst_port: u16) -> Vec<u8> {
        let mut packet = build_header(
            IpProtocol::Udp as u8,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 3),
            8,
        );
        packet.extend_from_slice(&src_port.to_be_bytes());
        packet.extend_from_slice(&dst_port.to_be_bytes());
        packet.extend_from_slice(&[0, 8, 0, 0]);
        packet
    }

    #[test]
    fn test_parse_udp_ports() {
        let packet = udp_packet(5353, 53);
        let header = Ipv4Header::parse(&packet).unwrap();
        assert_eq!(header.protocol, 17);
        assert_eq!(header.src, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(header.dst, Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(
            header.transport_ports(&packet),
            Some(TransportPorts { src: 5353, dst: 53 })
        );
    }

    #[test]
    fn test_icmp_type_code() {
        let mut packet = build_header(
            IpProtocol::Icmp as u8,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            4,
        );
        packet.extend_from_slice(&[8, 0, 0, 0]);
        let header = Ipv4Header::parse(&packet).unwrap();
        assert_eq!(
            header.transport_ports(&packet),
            Some(TransportPorts { src: 8, dst: 0 })
        );
    }

    #[test]
    fn test_later_fragment_has_no_ports() {
        let mut packet = udp_packet(1, 2);
        packet[7] = 0x10;
        let header = Ipv4Header::parse(&packet).unwrap();
        assert_eq!(header.transport_ports(&packet), None);
    }

    #[test]
    fn test_checksum_verifies() {
        let header = build_header(6, Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(5, 6, 7, 8), 0);
        let mut sum: u32 = header
            .chunks(2)
            .map(|w| u32::from(u16::from_be_bytes([w[0], w[1]])))
            .sum();
        while sum > 0xffff {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        assert_eq!(sum, 0xffff);
    }

    #[test]
    fn test_rejects_bad_headers() {
        assert!(Ipv4Header::parse(&[0x45; 10]).is_err());
        let mut packet = udp_packet(1, 2);
        packet[0] = 0x65;
        assert!(Ipv4Header::parse(&packet).is_err());
        packet[0] = 0x4f;
        assert!(Ipv4Header::parse(&packet).is_err());
    }

    #[test]
    fn test_build_header_total_length() {
        let header = build_header(17, Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST, 65515);
        assert_eq!(u16::from_be_bytes([header[2], header[3]]), u16::MAX);
    }

    #[test]
    #[should_panic(expected = "exceeds 65535")]
    fn test_build_header_rejects_oversized_payload() {
        build_header(17, Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST, 65516);
    }
}
