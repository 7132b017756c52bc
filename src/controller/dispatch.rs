//! Turning decisions into switch instructions
//!
//! Every action becomes exactly one message on the owning connection:
//! a flooding packet-out, an empty (dropping) packet-out, or a flow-mod
//! that installs the forwarding rule and releases the buffered frame.

use super::connection::SwitchConnection;
use super::engine::{Action, PacketEvent};
use crate::openflow::{
    FlowMatch, FlowMod, OutputPort, PacketOut, SwitchMessage, DEFAULT_PRIORITY,
};
use crate::Result;
use tracing::trace;

/// Parameters of installed forwarding rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSettings {
    /// Seconds of inactivity before the switch removes the rule (0 = never)
    pub idle_timeout: u16,
    /// Absolute rule lifetime in seconds (0 = never)
    pub hard_timeout: u16,
    pub priority: u16,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            idle_timeout: 0,
            hard_timeout: 0,
            priority: DEFAULT_PRIORITY,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher {
    rules: RuleSettings,
}

impl ActionDispatcher {
    pub fn new(rules: RuleSettings) -> Self {
        Self { rules }
    }

    /// Build the single instruction that carries out `action`
    pub fn instruction(&self, event: &PacketEvent<'_>, action: Action) -> SwitchMessage {
        let packet_in = event.packet_in;
        match action {
            Action::Flood => SwitchMessage::PacketOut(PacketOut::release(
                packet_in,
                vec![OutputPort::Flood],
            )),
            Action::Drop(_) => SwitchMessage::PacketOut(PacketOut::release(packet_in, vec![])),
            Action::Forward {
                port,
                install_rule: true,
            } => {
                let flow_match = FlowMatch::from_frame(event.in_port, &event.frame);
                SwitchMessage::FlowMod(
                    FlowMod::add_releasing(flow_match, packet_in, vec![OutputPort::Physical(port)])
                        .timeouts(self.rules.idle_timeout, self.rules.hard_timeout)
                        .priority(self.rules.priority),
                )
            }
            Action::Forward {
                port,
                install_rule: false,
            } => SwitchMessage::PacketOut(PacketOut::release(
                packet_in,
                vec![OutputPort::Physical(port)],
            )),
        }
    }

    /// Send the instruction for `action` over `connection`
    pub fn dispatch(
        &self,
        connection: &mut dyn SwitchConnection,
        event: &PacketEvent<'_>,
        action: Action,
    ) -> Result<()> {
        let message = self.instruction(event, action);
        trace!(
            "Sending {} to {} ({:?})",
            message.kind(),
            connection.dpid(),
            action
        );
        connection.send(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::engine::DropReason;
    use crate::openflow::{DatapathId, PacketIn};
    use crate::protocol::ethernet::FrameBuilder;
    use crate::protocol::MacAddr;

    const A: MacAddr = MacAddr([0, 0, 0, 0, 0, 1]);
    const B: MacAddr = MacAddr([0, 0, 0, 0, 0, 2]);

    fn packet_in(buffer: Option<u32>) -> PacketIn {
        let data = FrameBuilder::new()
            .dst_mac(B)
            .src_mac(A)
            .ethertype(0x0800)
            .payload(&[0u8; 46])
            .build();
        let pkt = PacketIn::new(3, data);
        match buffer {
            Some(id) => pkt.with_buffer(id),
            None => pkt,
        }
    }

    #[test]
    fn test_flood_excludes_ingress_via_flood_port() {
        let pkt = packet_in(Some(9));
        let event = PacketEvent::from_packet_in(DatapathId(1), &pkt).unwrap();

        let msg = ActionDispatcher::default().instruction(&event, Action::Flood);
        let SwitchMessage::PacketOut(out) = msg else {
            panic!("expected packet-out");
        };
        assert_eq!(out.actions, vec![OutputPort::Flood]);
        assert_eq!(out.in_port, 3);
        assert_eq!(out.buffer_id, Some(9));
    }

    #[test]
    fn test_drop_is_explicit_empty_packet_out() {
        let pkt = packet_in(None);
        let event = PacketEvent::from_packet_in(DatapathId(1), &pkt).unwrap();

        let msg = ActionDispatcher::default()
            .instruction(&event, Action::Drop(DropReason::SamePort));
        let SwitchMessage::PacketOut(out) = msg else {
            panic!("expected packet-out");
        };
        assert!(out.is_drop());
        assert_eq!(out.data, pkt.data);
    }

    #[test]
    fn test_forward_installs_rule() {
        let pkt = packet_in(Some(42));
        let event = PacketEvent::from_packet_in(DatapathId(1), &pkt).unwrap();
        let dispatcher = ActionDispatcher::new(RuleSettings {
            idle_timeout: 10,
            hard_timeout: 30,
            priority: 100,
        });

        let msg = dispatcher.instruction(
            &event,
            Action::Forward {
                port: 1,
                install_rule: true,
            },
        );
        let SwitchMessage::FlowMod(flow_mod) = msg else {
            panic!("expected flow-mod");
        };
        assert_eq!(flow_mod.actions, vec![OutputPort::Physical(1)]);
        assert_eq!(flow_mod.buffer_id, Some(42));
        assert_eq!(flow_mod.flow_match.in_port, Some(3));
        assert_eq!(flow_mod.flow_match.dl_src, Some(A));
        assert_eq!(flow_mod.flow_match.dl_dst, Some(B));
        assert_eq!((flow_mod.idle_timeout, flow_mod.hard_timeout), (10, 30));
        assert_eq!(flow_mod.priority, 100);
    }

    #[test]
    fn test_forward_without_rule_is_packet_out() {
        let pkt = packet_in(None);
        let event = PacketEvent::from_packet_in(DatapathId(1), &pkt).unwrap();

        let msg = ActionDispatcher::default().instruction(
            &event,
            Action::Forward {
                port: 2,
                install_rule: false,
            },
        );
        assert_eq!(
            msg,
            SwitchMessage::PacketOut(PacketOut {
                buffer_id: None,
                in_port: 3,
                actions: vec![OutputPort::Physical(2)],
                data: pkt.data.clone(),
            })
        );
    }
}
