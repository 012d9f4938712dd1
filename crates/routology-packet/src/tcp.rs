use crate::buffer::Buffer;
use crate::error::Result;
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

/// The `SYN` bit of the `TCP` flags.
pub const TCP_FLAG_SYN: u16 = 0x002;

const SOURCE_PORT_OFFSET: usize = 0;
const DESTINATION_PORT_OFFSET: usize = 2;
const SEQUENCE_OFFSET: usize = 4;
const ACKNOWLEDGEMENT_OFFSET: usize = 8;
const DATA_OFFSET_AND_FLAGS_OFFSET: usize = 12;
const WINDOW_SIZE_OFFSET: usize = 14;
const CHECKSUM_OFFSET: usize = 16;
const URGENT_POINTER_OFFSET: usize = 18;

/// A `TCP` segment without options.
pub struct TcpPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> TcpPacket<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::mutable("TcpPacket", packet, Self::minimum_packet_size())?,
        })
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        Ok(Self {
            buf: Buffer::immutable("TcpPacket", packet, Self::minimum_packet_size())?,
        })
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
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
    pub fn get_sequence(&self) -> u32 {
        self.buf.get_u32(SEQUENCE_OFFSET)
    }

    #[must_use]
    pub fn get_acknowledgement(&self) -> u32 {
        self.buf.get_u32(ACKNOWLEDGEMENT_OFFSET)
    }

    /// The header length in 32-bit words.
    #[must_use]
    pub fn get_data_offset(&self) -> u8 {
        (self.buf.get_u16(DATA_OFFSET_AND_FLAGS_OFFSET) >> 12) as u8
    }

    #[must_use]
    pub fn get_flags(&self) -> u16 {
        self.buf.get_u16(DATA_OFFSET_AND_FLAGS_OFFSET) & 0x01ff
    }

    #[must_use]
    pub fn get_window_size(&self) -> u16 {
        self.buf.get_u16(WINDOW_SIZE_OFFSET)
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_urgent_pointer(&self) -> u16 {
        self.buf.get_u16(URGENT_POINTER_OFFSET)
    }

    pub fn set_source(&mut self, port: u16) {
        self.buf.set_u16(SOURCE_PORT_OFFSET, port);
    }

    pub fn set_destination(&mut self, port: u16) {
        self.buf.set_u16(DESTINATION_PORT_OFFSET, port);
    }

    pub fn set_sequence(&mut self, sequence: u32) {
        self.buf.set_u32(SEQUENCE_OFFSET, sequence);
    }

    pub fn set_acknowledgement(&mut self, acknowledgement: u32) {
        self.buf.set_u32(ACKNOWLEDGEMENT_OFFSET, acknowledgement);
    }

    pub fn set_data_offset(&mut self, words: u8) {
        let flags = self.get_flags();
        self.buf.set_u16(
            DATA_OFFSET_AND_FLAGS_OFFSET,
            (u16::from(words & 0x0f) << 12) | flags,
        );
    }

    pub fn set_flags(&mut self, flags: u16) {
        let data_offset = self.buf.get_u16(DATA_OFFSET_AND_FLAGS_OFFSET) & 0xf000;
        self.buf
            .set_u16(DATA_OFFSET_AND_FLAGS_OFFSET, data_offset | (flags & 0x01ff));
    }

    pub fn set_window_size(&mut self, window_size: u16) {
        self.buf.set_u16(WINDOW_SIZE_OFFSET, window_size);
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        self.buf.set_u16(CHECKSUM_OFFSET, checksum);
    }

    pub fn set_urgent_pointer(&mut self, urgent_pointer: u16) {
        self.buf.set_u16(URGENT_POINTER_OFFSET, urgent_pointer);
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

impl Debug for TcpPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpPacket")
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("sequence", &self.get_sequence())
            .field("acknowledgement", &self.get_acknowledgement())
            .field("data_offset", &self.get_data_offset())
            .field("flags", &self.get_flags())
            .field("window_size", &self.get_window_size())
            .field("checksum", &self.get_checksum())
            .field("urgent_pointer", &self.get_urgent_pointer())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}
