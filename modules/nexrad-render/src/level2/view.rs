use crate::error::{RenderError, Result};

/// Bounds-checked big-endian reads over a message buffer.
#[derive(Clone, Copy)]
pub(crate) struct ByteView<'a> {
    buf: &'a [u8],
    what: &'static str,
}

impl<'a> ByteView<'a> {
    pub(crate) fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, what }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.buf.get(offset..end))
            .ok_or(RenderError::Truncated {
                what: self.what,
                offset,
            })
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    pub(crate) fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    pub(crate) fn u16_at(&self, offset: usize) -> Result<u16> {
        self.array(offset).map(u16::from_be_bytes)
    }

    pub(crate) fn i16_at(&self, offset: usize) -> Result<i16> {
        self.array(offset).map(i16::from_be_bytes)
    }

    pub(crate) fn u32_at(&self, offset: usize) -> Result<u32> {
        self.array(offset).map(u32::from_be_bytes)
    }

    pub(crate) fn i32_at(&self, offset: usize) -> Result<i32> {
        self.array(offset).map(i32::from_be_bytes)
    }

    pub(crate) fn f32_at(&self, offset: usize) -> Result<f32> {
        self.array(offset).map(f32::from_be_bytes)
    }
}
