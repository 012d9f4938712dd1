use crate::buffer::Buffer;
use crate::error::Result;
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

/// The `ICMPv4` type of an echo request.
pub const ECHO_REQUEST_TYPE: u8 = 8;

const TYPE_OFFSET: usize = 0;
const CODE_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;
const IDENTIFIER_OFFSET: usize = 4;
const SEQUENCE_OFFSET: usize = 6;

/// An `ICMPv4` echo request packet.
pub struct EchoRequestPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> EchoRequestPacket<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::mutable("EchoRequestPacket", packet, Self::minimum_packet_size())?,
        })
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::immutable("EchoRequestPacket", packet, Self::minimum_packet_size())?,
        })
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        8
    }

    #[must_use]
    pub fn get_icmp_type(&self) -> u8 {
        self.buf.read(TYPE_OFFSET)
    }

    #[must_use]
    pub fn get_icmp_code(&self) -> u8 {
        self.buf.read(CODE_OFFSET)
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_identifier(&self) -> u16 {
        self.buf.get_u16(IDENTIFIER_OFFSET)
    }

    #[must_use]
    pub fn get_sequence(&self) -> u16 {
        self.buf.get_u16(SEQUENCE_OFFSET)
    }

    pub fn set_icmp_type(&mut self, icmp_type: u8) {
        self.buf.write(TYPE_OFFSET, icmp_type);
    }

    pub fn set_icmp_code(&mut self, icmp_code: u8) {
        self.buf.write(CODE_OFFSET, icmp_code);
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, checksum);
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.buf.set_u16(IDENTIFIER_OFFSET, identifier);
    }

    pub fn set_sequence(&mut self, sequence: u16) {
        self.buf.set_u16(SEQUENCE_OFFSET, sequence);
    }

    pub fn set_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.buf
            .set_tail("EchoRequestPacket", Self::minimum_packet_size(), payload)
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

impl Debug for EchoRequestPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoRequestPacket")
            .field("icmp_type", &self.get_icmp_type())
            .field("icmp_code", &self.get_icmp_code())
            .field("checksum", &self.get_checksum())
            .field("identifier", &self.get_identifier())
            .field("sequence", &self.get_sequence())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}
