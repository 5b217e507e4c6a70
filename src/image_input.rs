//! Seekable big-endian byte source shared by the segment scanner and the lossless decoder.

use crate::error::Result;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

pub struct ImageInput<R> {
    inner: R,
    marks: Vec<u64>,
}

impl<'a> ImageInput<Cursor<&'a [u8]>> {
    pub fn from_slice(source: &'a [u8]) -> Self {
        Self::new(Cursor::new(source))
    }
}

impl<R: Read + Seek> ImageInput<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            marks: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<BigEndian>()?)
    }

    pub fn read_fully(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buffer)?;
        Ok(())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; count];
        self.read_fully(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads up to `buffer.len()` bytes, returning fewer only at end of stream.
    pub fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buffer.len() {
            match self.inner.read(&mut buffer[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(count as i64))?;
        Ok(())
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Total length of the underlying source. The current position is preserved.
    pub fn length(&mut self) -> Result<u64> {
        let position = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(end)
    }

    /// Pushes the current position; `reset` pops and returns to it.
    pub fn mark(&mut self) -> Result<()> {
        let position = self.position()?;
        self.marks.push(position);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        if let Some(position) = self.marks.pop() {
            self.seek(position)?;
        }
        Ok(())
    }
}
