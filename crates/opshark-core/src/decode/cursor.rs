use super::error::DecodeError;

/// Bounds-checked little-endian cursor over a packet payload.
///
/// Every read either consumes exactly the bytes it returns or fails with
/// [`DecodeError::TruncatedBuffer`] without moving the position, so the
/// reported offset always points at the byte the failing read started on.
///
/// # Examples
/// ```
/// use opshark_core::Cursor;
///
/// let mut cursor = Cursor::new(&[0x2a, 0x00, 0x00, 0x00]);
/// assert_eq!(cursor.read_u32()?, 42);
/// assert!(cursor.is_empty());
/// # Ok::<(), opshark_core::DecodeError>(())
/// ```
#[derive(Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the payload.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the position and the end of the payload.
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub const fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::TruncatedBuffer {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += needed;
        Ok(&self.data[start..self.pos])
    }

    /// Reads exactly `N` bytes into a fixed array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads `len` raw bytes without interpreting them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Reads a NUL-terminated string, consuming the terminator.
    ///
    /// Invalid UTF-8 is replaced lossily; wire names are not guaranteed to be
    /// well formed. Fails with [`DecodeError::UnterminatedString`] when no
    /// NUL byte exists before the end of the payload, without advancing.
    pub fn read_cstring(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        let rest = &self.data[start..];
        let nul = rest
            .iter()
            .position(|&byte| byte == 0)
            .ok_or(DecodeError::UnterminatedString { offset: start })?;
        let value = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos = start + nul + 1;
        Ok(value)
    }
}
