use crate::buffer::Buffer;
use crate::error::Result;
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const VERSION_IHL_OFFSET: usize = 0;
const TOS_OFFSET: usize = 1;
const TOTAL_LENGTH_OFFSET: usize = 2;
const IDENTIFICATION_OFFSET: usize = 4;
const FLAGS_AND_FRAGMENT_OFFSET_OFFSET: usize = 6;
const TIME_TO_LIVE_OFFSET: usize = 8;
const PROTOCOL_OFFSET: usize = 9;
const CHECKSUM_OFFSET: usize = 10;
const SOURCE_OFFSET: usize = 12;
const DESTINATION_OFFSET: usize = 16;

/// An `IPv4` packet without options.
///
/// The header length is assumed to be the minimum of 5 words: probes never
/// carry options and the payload always starts at byte 20.
pub struct Ipv4Packet<'a> {
    buf: Buffer<'a>,
}

impl<'a> Ipv4Packet<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::mutable("Ipv4Packet", packet, Self::minimum_packet_size())?,
        })
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::immutable("Ipv4Packet", packet, Self::minimum_packet_size())?,
        })
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    #[must_use]
    pub fn get_version(&self) -> u8 {
        self.buf.read(VERSION_IHL_OFFSET) >> 4
    }

    #[must_use]
    pub fn get_header_length(&self) -> u8 {
        self.buf.read(VERSION_IHL_OFFSET) & 0x0f
    }

    #[must_use]
    pub fn get_tos(&self) -> u8 {
        self.buf.read(TOS_OFFSET)
    }

    #[must_use]
    pub fn get_total_length(&self) -> u16 {
        self.buf.get_u16(TOTAL_LENGTH_OFFSET)
    }

    #[must_use]
    pub fn get_identification(&self) -> u16 {
        self.buf.get_u16(IDENTIFICATION_OFFSET)
    }

    #[must_use]
    pub fn get_flags_and_fragment_offset(&self) -> u16 {
        self.buf.get_u16(FLAGS_AND_FRAGMENT_OFFSET_OFFSET)
    }

    #[must_use]
    pub fn get_ttl(&self) -> u8 {
        self.buf.read(TIME_TO_LIVE_OFFSET)
    }

    #[must_use]
    pub fn get_protocol(&self) -> IpProtocol {
        IpProtocol::from(self.buf.read(PROTOCOL_OFFSET))
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.buf.get_bytes(SOURCE_OFFSET))
    }

    #[must_use]
    pub fn get_destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.buf.get_bytes(DESTINATION_OFFSET))
    }

    pub fn set_version(&mut self, version: u8) {
        let ihl = self.get_header_length();
        self.buf.write(VERSION_IHL_OFFSET, (version << 4) | ihl);
    }

    pub fn set_header_length(&mut self, ihl: u8) {
        let version = self.buf.read(VERSION_IHL_OFFSET) & 0xf0;
        self.buf.write(VERSION_IHL_OFFSET, version | (ihl & 0x0f));
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.buf.write(TOS_OFFSET, tos);
    }

    pub fn set_total_length(&mut self, total_length: u16) {
        self.buf.set_u16(TOTAL_LENGTH_OFFSET, total_length);
    }

    pub fn set_identification(&mut self, identification: u16) {
        self.buf.set_u16(IDENTIFICATION_OFFSET, identification);
    }

    pub fn set_flags_and_fragment_offset(&mut self, value: u16) {
        self.buf.set_u16(FLAGS_AND_FRAGMENT_OFFSET_OFFSET, value);
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.buf.write(TIME_TO_LIVE_OFFSET, ttl);
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) {
        self.buf.write(PROTOCOL_OFFSET, protocol.id());
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, checksum);
    }

    pub fn set_source(&mut self, addr: Ipv4Addr) {
        self.buf.set_bytes(SOURCE_OFFSET, addr.octets());
    }

    pub fn set_destination(&mut self, addr: Ipv4Addr) {
        self.buf.set_bytes(DESTINATION_OFFSET, addr.octets());
    }

    /// Copy the transport payload in after the header.
    ///
    /// The payload must fill the rest of the buffer exactly.
    pub fn set_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.buf
            .set_tail("Ipv4Packet", Self::minimum_packet_size(), payload)
    }

    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.buf.as_slice()[..Self::minimum_packet_size()]
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf.as_slice()[Self::minimum_packet_size()..]
    }
}

impl Debug for Ipv4Packet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4Packet")
            .field("version", &self.get_version())
            .field("header_length", &self.get_header_length())
            .field("tos", &self.get_tos())
            .field("total_length", &self.get_total_length())
            .field("identification", &self.get_identification())
            .field(
                "flags_and_fragment_offset",
                &self.get_flags_and_fragment_offset(),
            )
            .field("ttl", &self.get_ttl())
            .field("protocol", &self.get_protocol())
            .field("checksum", &self.get_checksum())
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use hex_literal::hex;

    #[test]
    fn test_version_and_header_length() {
        let mut buf = [0_u8; Ipv4Packet::minimum_packet_size()];
        let mut packet = Ipv4Packet::new(&mut buf).unwrap();
        packet.set_version(4);
        packet.set_header_length(5);
        assert_eq!(4, packet.get_version());
        assert_eq!(5, packet.get_header_length());
        assert_eq!(0x45, packet.packet()[0]);
        packet.set_header_length(0x0f);
        assert_eq!(4, packet.get_version());
        assert_eq!(0x4f, packet.packet()[0]);
    }

    #[test]
    fn test_ttl() {
        let mut buf = [0_u8; Ipv4Packet::minimum_packet_size()];
        let mut packet = Ipv4Packet::new(&mut buf).unwrap();
        packet.set_ttl(1);
        assert_eq!(1, packet.get_ttl());
        assert_eq!(0x01, packet.packet()[8]);
        packet.set_ttl(u8::MAX);
        assert_eq!(u8::MAX, packet.get_ttl());
        assert_eq!(0xff, packet.packet()[8]);
    }

    #[test]
    fn test_addresses() {
        let mut buf = [0_u8; Ipv4Packet::minimum_packet_size()];
        let mut packet = Ipv4Packet::new(&mut buf).unwrap();
        packet.set_source(Ipv4Addr::new(10, 0, 0, 2));
        packet.set_destination(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(Ipv4Addr::new(10, 0, 0, 2), packet.get_source());
        assert_eq!(Ipv4Addr::new(10, 0, 0, 1), packet.get_destination());
        assert_eq!([0x0a, 0x00, 0x00, 0x02], packet.packet()[12..16]);
        assert_eq!([0x0a, 0x00, 0x00, 0x01], packet.packet()[16..20]);
    }

    #[test]
    fn test_payload() {
        let mut buf = [0_u8; 22];
        let mut packet = Ipv4Packet::new(&mut buf).unwrap();
        packet.set_payload(&[0xab, 0xcd]).unwrap();
        assert_eq!(&[0xab, 0xcd], packet.payload());
        assert!(packet.set_payload(&[0x01]).is_err());
    }

    #[test]
    fn test_view() {
        let buf = hex!("45 00 0f fc 38 c0 40 00 40 01 2e 3b 0a 00 00 02 0a 00 00 01");
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert_eq!(4, packet.get_version());
        assert_eq!(5, packet.get_header_length());
        assert_eq!(0, packet.get_tos());
        assert_eq!(4092, packet.get_total_length());
        assert_eq!(0x38c0, packet.get_identification());
        assert_eq!(0x4000, packet.get_flags_and_fragment_offset());
        assert_eq!(64, packet.get_ttl());
        assert_eq!(IpProtocol::Icmp, packet.get_protocol());
        assert_eq!(0x2e3b, packet.get_checksum());
        assert_eq!(Ipv4Addr::new(10, 0, 0, 2), packet.get_source());
        assert_eq!(Ipv4Addr::new(10, 0, 0, 1), packet.get_destination());
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_insufficient_buffer() {
        let buf = [0_u8; 19];
        let err = Ipv4Packet::new_view(&buf).unwrap_err();
        assert_eq!(Error::InsufficientPacketBuffer("Ipv4Packet", 20, 19), err);
    }
}
