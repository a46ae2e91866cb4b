//! Network grid driver: streams frames to a remote pixel grid over UDP.
//!
//! On every [`Device::show`] the driver publishes its staging buffer and sends
//! the complete visible grid as one datagram (see
//! [`lightwall_core::protocol::codec`]) to the configured address.  The remote
//! side simply displays the latest datagram it receives.
//!
//! # Why send the whole frame? (for beginners)
//!
//! UDP does not guarantee delivery.  If the driver only sent the pixels that
//! changed, one lost datagram would leave the remote grid wrong until those
//! exact pixels changed again.  Sending the whole grid makes every datagram
//! self-contained: a lost frame is simply replaced by the next one.  The
//! sequence number lets the receiver drop datagrams that arrive out of order.
//!
//! A failed `send_to` is reported as a transient [`DeviceError::Io`], so the
//! pipeline keeps running while the remote end is unreachable.

use std::net::{SocketAddr, UdpSocket};

use lightwall_core::protocol::SequenceCounter;
use lightwall_core::{encode_frame, Color, Device, DeviceError, GridSize, PixelBuffers};
use tracing::{debug, info};

use crate::application::build_registry::DeviceSpecError;

/// A pixel grid reached over UDP.
#[derive(Debug)]
pub struct NetworkGridDevice {
    buffers: PixelBuffers,
    socket: UdpSocket,
    target: SocketAddr,
    sequence: SequenceCounter,
}

impl NetworkGridDevice {
    /// Binds an ephemeral local socket for sending to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceSpecError`] for an empty size, a grid too large for one
    /// datagram, or when the socket cannot be bound.
    pub fn connect(
        name: impl Into<String>,
        size: GridSize,
        target: SocketAddr,
    ) -> Result<Self, DeviceSpecError> {
        let buffers = PixelBuffers::new(name, size)?;
        // Reject grids that could never be encoded before any frame is sent.
        encode_frame(buffers.visible(), 0).map_err(|e| DeviceSpecError::InvalidField {
            field: "width",
            reason: e.to_string(),
        })?;

        let bind: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind)?;
        info!("network grid [{}] streaming {size} to {target}", buffers.name());

        Ok(Self {
            buffers,
            socket,
            target,
            sequence: SequenceCounter::new(),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Number of frames sent so far; also the sequence of the next one.
    pub fn frames_sent(&self) -> u64 {
        self.sequence.current()
    }
}

impl Device for NetworkGridDevice {
    fn name(&self) -> &str {
        self.buffers.name()
    }

    fn size(&self) -> GridSize {
        self.buffers.size()
    }

    fn set(&mut self, color: Color, x: u32, y: u32) -> Result<(), DeviceError> {
        self.buffers.stage(color, x, y)
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        let sequence = self.sequence.next();
        let frame = self.buffers.publish();
        let datagram = encode_frame(frame, sequence).map_err(|e| DeviceError::Fatal {
            device: self.buffers.name().to_string(),
            reason: e.to_string(),
        })?;

        self.socket
            .send_to(&datagram, self.target)
            .map_err(|source| DeviceError::Io {
                device: self.buffers.name().to_string(),
                source,
            })?;
        debug!("sent frame {sequence} ({} bytes) to {}", datagram.len(), self.target);
        Ok(())
    }

    fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.buffers.visible().get(x, y)
    }
}
