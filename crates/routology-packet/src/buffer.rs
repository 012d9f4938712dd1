use crate::error::{Error, Result};

/// Bytes backing a packet view, either borrowed for writing or for reading only.
#[derive(Debug)]
pub enum Buffer<'a> {
    Immutable(&'a [u8]),
    Mutable(&'a mut [u8]),
}

impl<'a> Buffer<'a> {
    /// Wrap a mutable buffer which must hold at least `min` bytes.
    pub fn mutable(name: &'static str, bytes: &'a mut [u8], min: usize) -> Result<Self> {
        if bytes.len() < min {
            return Err(Error::InsufficientPacketBuffer(name, min, bytes.len()));
        }
        Ok(Self::Mutable(bytes))
    }

    /// Wrap an immutable buffer which must hold at least `min` bytes.
    pub fn immutable(name: &'static str, bytes: &'a [u8], min: usize) -> Result<Self> {
        if bytes.len() < min {
            return Err(Error::InsufficientPacketBuffer(name, min, bytes.len()));
        }
        Ok(Self::Immutable(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Immutable(bytes) => bytes,
            Self::Mutable(bytes) => bytes,
        }
    }

    /// # Panics
    ///
    /// Panics if the buffer was created with [`Buffer::immutable`].
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Immutable(_) => panic!("write to an immutable packet buffer"),
            Self::Mutable(bytes) => bytes,
        }
    }

    pub fn read(&self, offset: usize) -> u8 {
        self.as_slice()[offset]
    }

    pub fn write(&mut self, offset: usize, value: u8) {
        self.as_slice_mut()[offset] = value;
    }

    pub fn get_bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut bytes = [0_u8; N];
        bytes.copy_from_slice(&self.as_slice()[offset..offset + N]);
        bytes
    }

    pub fn set_bytes<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) {
        self.as_slice_mut()[offset..offset + N].copy_from_slice(&bytes);
    }

    pub fn get_u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes(self.get_bytes(offset))
    }

    pub fn set_u16(&mut self, offset: usize, value: u16) {
        self.set_bytes(offset, value.to_be_bytes());
    }

    pub fn get_u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes(self.get_bytes(offset))
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) {
        self.set_bytes(offset, value.to_be_bytes());
    }

    /// Copy `payload` into the buffer from `offset` to the end.
    ///
    /// The payload must fill the remaining space exactly.
    pub fn set_tail(&mut self, name: &'static str, offset: usize, payload: &[u8]) -> Result<()> {
        let tail = &mut self.as_slice_mut()[offset..];
        if tail.len() != payload.len() {
            return Err(Error::PayloadSize(payload.len(), name, tail.len()));
        }
        tail.copy_from_slice(payload);
        Ok(())
    }
}
