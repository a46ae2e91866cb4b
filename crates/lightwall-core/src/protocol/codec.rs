//! Binary codec for pixel-frame datagrams sent to network grids.
//!
//! Wire format:
//! ```text
//! [magic:2 = "LW"][version:1][reserved:1][width:2][height:2][seq:8][rgb:width*height*3]
//! ```
//! Header size: 16 bytes.  All multi-byte integers are big-endian.  Pixels are
//! packed row-major, three bytes (r, g, b) each.
//!
//! A whole frame travels in one datagram, so a frame must fit in the largest
//! UDP payload (65 507 bytes), i.e. at most 21 830 pixels.

use thiserror::Error;

use crate::domain::color::{Color, ColorGrid, GridSize};

/// Datagram magic bytes.
pub const MAGIC: [u8; 2] = *b"LW";

/// Current wire format version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Largest payload a single IPv4 UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the header or the declared pixel data.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The datagram does not start with the `LW` magic.
    #[error("bad magic: {0:02X?}")]
    BadMagic([u8; 2]),

    /// The version byte is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// A zero dimension, or one that does not fit the 16-bit header fields.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoded frame would not fit in one datagram.
    #[error("frame of {size} bytes exceeds the {max}-byte datagram limit")]
    FrameTooLarge { size: usize, max: usize },
}

/// Decoded header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub size: GridSize,
    pub sequence: u64,
}

/// Encodes `grid` into one datagram stamped with `sequence`.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidDimensions`] when a dimension exceeds
/// `u16::MAX`, or [`ProtocolError::FrameTooLarge`] when the datagram would not
/// fit the UDP payload limit.
///
/// # Examples
///
/// ```rust
/// use lightwall_core::{decode_frame, encode_frame, Color, ColorGrid, GridSize};
///
/// let grid = ColorGrid::filled(GridSize::new(2, 1), Color::RED).unwrap();
/// let bytes = encode_frame(&grid, 7).unwrap();
/// let (header, decoded) = decode_frame(&bytes).unwrap();
/// assert_eq!(header.sequence, 7);
/// assert_eq!(decoded, grid);
/// ```
pub fn encode_frame(grid: &ColorGrid, sequence: u64) -> Result<Vec<u8>, ProtocolError> {
    let (width, height) = match (u16::try_from(grid.width()), u16::try_from(grid.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(ProtocolError::InvalidDimensions {
                width: grid.width(),
                height: grid.height(),
            })
        }
    };

    let size = HEADER_SIZE + grid.size().area() * 3;
    if size > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size,
            max: MAX_DATAGRAM_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(&MAGIC);
    buf.push(PROTOCOL_VERSION);
    buf.push(0x00); // reserved
    buf.extend_from_slice(&width.to_be_bytes());
    buf.extend_from_slice(&height.to_be_bytes());
    buf.extend_from_slice(&sequence.to_be_bytes());
    for color in grid.pixels() {
        buf.extend_from_slice(&[color.r, color.g, color.b]);
    }
    Ok(buf)
}

/// Decodes one datagram back into its header and grid.
///
/// Trailing bytes after the declared pixel data are ignored.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the datagram is truncated or malformed.
pub fn decode_frame(bytes: &[u8]) -> Result<(FrameHeader, ColorGrid), ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let magic = [bytes[0], bytes[1]];
    if magic != MAGIC {
        return Err(ProtocolError::BadMagic(magic));
    }
    let version = bytes[2];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let width = u32::from(u16::from_be_bytes([bytes[4], bytes[5]]));
    let height = u32::from(u16::from_be_bytes([bytes[6], bytes[7]]));
    let mut seq = [0u8; 8];
    seq.copy_from_slice(&bytes[8..16]);
    let sequence = u64::from_be_bytes(seq);

    let size = GridSize::new(width, height);
    let mut grid = ColorGrid::new(size)
        .map_err(|_| ProtocolError::InvalidDimensions { width, height })?;

    let needed = HEADER_SIZE + size.area() * 3;
    if bytes.len() < needed {
        return Err(ProtocolError::InsufficientData {
            needed,
            available: bytes.len(),
        });
    }

    for (i, rgb) in bytes[HEADER_SIZE..needed].chunks_exact(3).enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        // In range by construction: i < width * height.
        let _ = grid.set(x, y, Color::new(rgb[0], rgb[1], rgb[2]));
    }

    Ok((
        FrameHeader {
            version,
            size,
            sequence,
        },
        grid,
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
