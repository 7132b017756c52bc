//! Common protocol types

use std::fmt;
use std::str::FromStr;

/// Hardware (MAC) address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);

    /// Build from the first six bytes of a slice
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
        Some(MacAddr(octets))
    }

    /// Group bit set. Broadcast is a multicast address too.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error type for MAC address parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseMacAddrError {
    #[error("invalid MAC address length")]
    Length,
    #[error("invalid MAC address format")]
    Format,
    #[error("invalid hex digit in MAC address")]
    Hex,
}

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    /// Accepts "00:11:22:33:44:55", "00-11-22-33-44-55" and "001122334455"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let groups: Vec<&str> = if s.contains(':') {
            s.split(':').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else if s.len() == 12 && s.is_ascii() {
            (0..6).map(|i| &s[i * 2..i * 2 + 2]).collect()
        } else {
            return Err(ParseMacAddrError::Format);
        };

        if groups.len() != 6 {
            return Err(ParseMacAddrError::Length);
        }

        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(&groups) {
            if group.len() != 2 {
                return Err(ParseMacAddrError::Format);
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| ParseMacAddrError::Hex)?;
        }

        Ok(MacAddr(octets))
    }
}

/// EtherType values the match builder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum EtherType {
    Ipv4 = 0x0800,
    Arp = 0x0806,
    Vlan = 0x8100,
}

impl EtherType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0800 => Some(EtherType::Ipv4),
            0x0806 => Some(EtherType::Arp),
            0x8100 => Some(EtherType::Vlan),
            _ => None,
        }
    }
}

/// IP protocol numbers carried in a flow match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IpProtocol {
    Icmp = 1,
    Tcp = 6,
    Udp = 17,
}

impl IpProtocol {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(IpProtocol::Icmp),
            6 => Some(IpProtocol::Tcp),
            17 => Some(IpProtocol::Udp),
            _ => None,
        }
    }
}

/// 802.1Q tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanTag {
    /// Priority Code Point (3 bits)
    pub pcp: u8,
    /// Drop Eligible Indicator
    pub dei: bool,
    /// VLAN ID (12 bits)
    pub vid: u16,
}

impl VlanTag {
    pub fn new(vid: u16) -> Self {
        Self {
            pcp: 0,
            dei: false,
            vid: vid & 0x0FFF,
        }
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        let tci =
            ((self.pcp as u16 & 0x07) << 13) | ((self.dei as u16) << 12) | (self.vid & 0x0FFF);
        tci.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        let tci = u16::from_be_bytes(bytes);
        Self {
            pcp: ((tci >> 13) & 0x07) as u8,
            dei: (tci >> 12) & 0x01 != 0,
            vid: tci & 0x0FFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_is_multicast() {
        assert!(MacAddr::BROADCAST.is_multicast());
    }

    #[test]
    fn test_multicast_group_bit() {
        let ipv4_mcast = MacAddr([0x01, 0x00, 0x5e, 0x00, 0x00, 0xfb]);
        assert!(ipv4_mcast.is_multicast());

        let host = MacAddr([0xd0, 0x13, 0x1c, 0x1b, 0x76, 0xa0]);
        assert!(!host.is_multicast());
    }

    #[test]
    fn test_parse_formats() {
        let expected = MacAddr([0xb8, 0x94, 0x91, 0x62, 0xf1, 0x65]);
        assert_eq!("b8:94:91:62:f1:65".parse::<MacAddr>().unwrap(), expected);
        assert_eq!("B8-94-91-62-F1-65".parse::<MacAddr>().unwrap(), expected);
        assert_eq!("b8949162f165".parse::<MacAddr>().unwrap(), expected);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "00:11:22:33:44".parse::<MacAddr>(),
            Err(ParseMacAddrError::Length)
        );
        assert_eq!(
            "00:11:22:33:44:gg".parse::<MacAddr>(),
            Err(ParseMacAddrError::Hex)
        );
        assert_eq!(
            "00.11.22.33.44.55".parse::<MacAddr>(),
            Err(ParseMacAddrError::Format)
        );
        assert_eq!(
            "0:11:22:33:44:555".parse::<MacAddr>(),
            Err(ParseMacAddrError::Format)
        );
    }

    #[test]
    fn test_display() {
        let mac = MacAddr([0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(mac.to_string(), "00:00:00:00:00:01");
    }

    #[test]
    fn test_from_slice() {
        assert_eq!(
            MacAddr::from_slice(&[1, 2, 3, 4, 5, 6, 7]),
            Some(MacAddr([1, 2, 3, 4, 5, 6]))
        );
        assert_eq!(MacAddr::from_slice(&[1, 2, 3]), None);
    }

    #[test]
    fn test_vlan_tag_bits() {
        let tag = VlanTag {
            pcp: 5,
            dei: true,
            vid: 100,
        };
        assert_eq!(tag.to_bytes(), [0xB0, 0x64]);
        assert_eq!(VlanTag::from_bytes([0xB0, 0x64]), tag);
        assert_eq!(VlanTag::new(0xFFFF).vid, 0x0FFF);
    }

    #[test]
    fn test_ethertype_and_protocol() {
        assert_eq!(EtherType::from_u16(0x0806), Some(EtherType::Arp));
        assert_eq!(EtherType::from_u16(0x1234), None);
        assert_eq!(IpProtocol::from_u8(17), Some(IpProtocol::Udp));
        assert_eq!(IpProtocol::from_u8(89), None);
    }
}
