use crate::buffer::Buffer;
use crate::error::Result;
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

const SOURCE_PORT_OFFSET: usize = 0;
const DESTINATION_PORT_OFFSET: usize = 2;
const LENGTH_OFFSET: usize = 4;
const CHECKSUM_OFFSET: usize = 6;

/// A `UDP` packet.
pub struct UdpPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> UdpPacket<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::mutable("UdpPacket", packet, Self::minimum_packet_size())?,
        })
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::immutable("UdpPacket", packet, Self::minimum_packet_size())?,
        })
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        8
    }

    #[must_use]
    pub fn get_source(&self) -> u16 {
        self.buf.get_u16(SOURCE_PORT_OFFSET)
    }

    #[must_use]
    pub fn get_destination(&self) -> u16 {
        self.buf.get_u16(DESTINATION_PORT_OFFSET)
    }

    #[must_use]
    pub fn get_length(&self) -> u16 {
        self.buf.get_u16(LENGTH_OFFSET)
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    pub fn set_source(&mut self, port: u16) {
        self.buf.set_u16(SOURCE_PORT_OFFSET, port);
    }

    pub fn set_destination(&mut self, port: u16) {
        self.buf.set_u16(DESTINATION_PORT_OFFSET, port);
    }

    pub fn set_length(&mut self, length: u16) {
        self.buf.set_u16(LENGTH_OFFSET, length);
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, checksum);
    }

    pub fn set_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.buf
            .set_tail("UdpPacket", Self::minimum_packet_size(), payload)
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

impl Debug for UdpPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpPacket")
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("length", &self.get_length())
            .field("checksum", &self.get_checksum())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}
