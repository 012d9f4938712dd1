//! The 16-bit one's complement internet checksum (RFC 1071).
//!
//! Each function takes the full packet bytes and skips the word which holds
//! the checksum itself, so a checksum can be computed on a packet before or
//! after the field has been populated.

use crate::IpProtocol;
use std::net::Ipv4Addr;

/// Word index of the checksum in an `IPv4` header.
const IPV4_CHECKSUM_WORD: usize = 5;

/// Word index of the checksum in an `ICMP` header.
const ICMP_CHECKSUM_WORD: usize = 1;

/// Word index of the checksum in a `UDP` header.
const UDP_CHECKSUM_WORD: usize = 3;

/// Word index of the checksum in a `TCP` header.
const TCP_CHECKSUM_WORD: usize = 8;

/// Calculate the checksum of an `IPv4` header.
#[must_use]
pub fn ipv4_header_checksum(header: &[u8]) -> u16 {
    fold(sum_words(header, IPV4_CHECKSUM_WORD))
}

/// Calculate the checksum of an `ICMPv4` packet.
#[must_use]
pub fn icmp_ipv4_checksum(packet: &[u8]) -> u16 {
    fold(sum_words(packet, ICMP_CHECKSUM_WORD))
}

/// Calculate the checksum of a `UDP` packet carried over `IPv4`.
///
/// A computed value of zero is sent as `0xffff` as zero means "no checksum"
/// for `UDP`.
#[must_use]
pub fn udp_ipv4_checksum(packet: &[u8], src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
    match pseudo_header_checksum(packet, UDP_CHECKSUM_WORD, src_addr, dest_addr, IpProtocol::Udp)
    {
        0 => 0xffff,
        checksum => checksum,
    }
}

/// Calculate the checksum of a `TCP` segment carried over `IPv4`.
#[must_use]
pub fn tcp_ipv4_checksum(packet: &[u8], src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
    pseudo_header_checksum(packet, TCP_CHECKSUM_WORD, src_addr, dest_addr, IpProtocol::Tcp)
}

fn pseudo_header_checksum(
    packet: &[u8],
    skip_word: usize,
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    protocol: IpProtocol,
) -> u16 {
    let pseudo = addr_sum(src_addr)
        + addr_sum(dest_addr)
        + u32::from(protocol.id())
        + packet.len() as u32;
    fold(pseudo + sum_words(packet, skip_word))
}

fn addr_sum(addr: Ipv4Addr) -> u32 {
    let [a, b, c, d] = addr.octets();
    u32::from(u16::from_be_bytes([a, b])) + u32::from(u16::from_be_bytes([c, d]))
}

/// Sum the big-endian 16-bit words of `data`, skipping the word at `skip_word`.
///
/// A trailing odd byte is padded with a zero low byte.
fn sum_words(data: &[u8], skip_word: usize) -> u32 {
    let words = data.chunks(2).enumerate().filter(|(i, _)| *i != skip_word);
    words
        .map(|(_, word)| match *word {
            [hi, lo] => u32::from(u16::from_be_bytes([hi, lo])),
            [hi] => u32::from(hi) << 8,
            _ => 0,
        })
        .sum()
}

const fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xffff);
    }
    !(sum as u16)
}
