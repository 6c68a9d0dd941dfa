use core::fmt::{Display, Formatter};

/// A specialized [`Result`] type for laser operations.
///
/// Uses [`Error<E>`] as the error variant, where `E` is the serial port's error type.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Reasons a frame was rejected by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The first byte was not `FRAME_START`.
    BadStart(u8),
    /// The last byte was not `FRAME_END`.
    BadEnd(u8),
    /// Fewer bytes than the smallest possible frame.
    TooShort(usize),
    /// The frame does not fit in `MAX_FRAME_LEN` bytes.
    Overflow,
    /// The checksum byte does not match the frame contents.
    Checksum { expected: u8, found: u8 },
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        match self {
            Self::BadStart(b) => write!(f, "frame does not start with 0xAA (got {b:#04X})"),
            Self::BadEnd(b) => write!(f, "frame does not end with 0xA8 (got {b:#04X})"),
            Self::TooShort(len) => write!(f, "frame too short ({len} bytes)"),
            Self::Overflow => write!(f, "frame too long"),
            Self::Checksum { expected, found } => {
                write!(f, "checksum should be {expected:#04X}, was {found:#04X}")
            }
        }
    }
}

impl core::error::Error for FrameError {}

/// Which half of the request a reply failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mismatch {
    Command { sent: u8, received: u8 },
    Address { sent: u8, received: u8 },
}

/// Why the module did not carry out a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Failure {
    /// The reply did not start with the acknowledgment byte.
    NotAcknowledged(u8),
    /// The reply payload could not be interpreted.
    Garbled,
}

/// Error type for laser operations.
///
/// The generic parameter `E` carries the serial port's own error.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The reply frame was malformed or failed its checksum.
    Frame(FrameError),
    /// The reply was for a different command or address.
    Mismatch(Mismatch),
    /// The module replied but did not acknowledge, or replied with garbage.
    CommandFailed(Failure),
    /// Too much ambient light, or the target is too close.
    TooBright,
    /// The laser spot is too dim; use reflective tape or a shorter distance.
    TooDim,
    /// Unable to measure, often because the target is moving.
    BadReading,
    /// No complete frame arrived within the configured timeout.
    Timeout,
    /// A port-specific input/output error.
    Io(E),
}

impl<E> Error<E> {
    /// Returns `true` if the reply was rejected because of a bad checksum.
    pub fn is_checksum(&self) -> bool {
        matches!(self, Self::Frame(FrameError::Checksum { .. }))
    }
}

impl<E: core::fmt::Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        match self {
            Self::Frame(err) => write!(f, "invalid frame: {err}"),
            Self::Mismatch(Mismatch::Command { sent, received }) => write!(
                f,
                "received command {received:#04X} does not match sent command {sent:#04X}"
            ),
            Self::Mismatch(Mismatch::Address { sent, received }) => write!(
                f,
                "received address {received:#04X} does not match sent address {sent:#04X}"
            ),
            Self::CommandFailed(Failure::NotAcknowledged(cmd)) => {
                write!(f, "command {cmd:#04X} was not acknowledged")
            }
            Self::CommandFailed(Failure::Garbled) => write!(f, "garbled response"),
            Self::TooBright => write!(f, "too much ambient light, or laser too close"),
            Self::TooDim => write!(f, "laser spot too dim"),
            Self::BadReading => write!(f, "unable to measure, is the target moving?"),
            Self::Timeout => write!(f, "timed out waiting for a reply"),
            Self::Io(err) => write!(f, "input/output error: {err:?}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

impl<E> From<FrameError> for Error<E> {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}
