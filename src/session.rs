// Pieces of an exchange that do not depend on how bytes are waited for. Both
// the blocking and the async driver go through these, so framing,
// correlation and acknowledgment rules live in exactly one place.

use embedded_io::ErrorKind;
use log::{debug, error, warn};

use crate::command::Command;
use crate::constants::ACK;
use crate::error::{Error, Failure, FrameError, Mismatch};
use crate::frame::{build_frame, parse_frame, Frame, Payload};

// Builds the outgoing frame for `command`.
pub(crate) fn request<E>(
    command: Command,
    address: u8,
    data: &[u8],
) -> Result<Frame, Error<E>> {
    let frame = build_frame(command.opcode(), address, data)?;
    debug!(
        "Sending {:?} to {:#04X}: {:02X?}",
        command,
        address,
        frame.as_bytes()
    );
    Ok(frame)
}

// Validates a reply frame and checks that it answers `command` from `address`.
pub(crate) fn correlate<E>(
    frame: &[u8],
    command: Command,
    address: u8,
) -> Result<Payload, Error<E>> {
    debug!("Received frame: {:02X?}", frame);
    let reply = parse_frame(frame).map_err(|e| {
        error!("Rejected reply frame {:02X?}: {:?}", frame, e);
        e
    })?;

    if reply.command != command.opcode() {
        warn!(
            "Received command {:#04X} does not match sent command {:#04X}",
            reply.command,
            command.opcode()
        );
        return Err(Error::Mismatch(Mismatch::Command {
            sent: command.opcode(),
            received: reply.command,
        }));
    }
    if reply.address != address {
        warn!(
            "Received address {:#04X} does not match sent address {:#04X}",
            reply.address, address
        );
        return Err(Error::Mismatch(Mismatch::Address {
            sent: address,
            received: reply.address,
        }));
    }

    // Cannot overflow: the payload came out of a frame no longer than MAX_FRAME_LEN
    Payload::from_slice(reply.payload).map_err(|_| Error::Frame(FrameError::Overflow))
}

// Succeeds if the module acknowledged `command`.
pub(crate) fn check_ack<E>(command: Command, payload: &[u8]) -> Result<(), Error<E>> {
    match payload.first() {
        Some(&ACK) => Ok(()),
        _ => {
            error!(
                "Tried to send {:?} but it failed, reply: {:02X?}",
                command, payload
            );
            Err(Error::CommandFailed(Failure::NotAcknowledged(command.opcode())))
        }
    }
}

// The single byte answer of a query command.
pub(crate) fn first_byte<E>(command: Command, payload: &[u8]) -> Result<u8, Error<E>> {
    payload.first().copied().ok_or_else(|| {
        error!("Empty reply to {:?}", command);
        Error::CommandFailed(Failure::Garbled)
    })
}

// Maps the result of a port read to the number of bytes received. A port that
// gives up after its own per-read timeout has simply delivered nothing; only
// the overall reply timeout ends an exchange.
pub(crate) fn read_outcome<E: embedded_io::Error>(
    result: Result<usize, E>,
) -> Result<usize, Error<E>> {
    match result {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
        Err(e) => {
            error!("Serial read error: {:?}", e);
            Err(Error::Io(e))
        }
    }
}
