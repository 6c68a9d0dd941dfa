use crate::constants::{ERR_BAD_READING, ERR_TOO_BRIGHT, ERR_TOO_DIM};
use crate::error::{Error, Failure};

/// The outcome of a measurement as reported by the module.
///
/// Quality failures are ordinary replies on the wire, so they are kept as
/// data here and only turned into an [`Error`] by [`Measurement::into_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Measurement {
    /// Distance to the target in millimetres.
    Distance(u32),
    /// Too much ambient light, or the laser is too close.
    TooBright,
    /// The return spot was too dim to be interpreted.
    TooDim,
    /// The module could not settle on a reading.
    BadReading,
}

impl Measurement {
    /// Classifies the payload of a measurement reply.
    ///
    /// Returns `None` if the payload is neither a known error code nor an
    /// ASCII decimal number.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            ERR_TOO_BRIGHT => Some(Self::TooBright),
            ERR_TOO_DIM => Some(Self::TooDim),
            ERR_BAD_READING => Some(Self::BadReading),
            digits => parse_decimal(digits).map(Self::Distance),
        }
    }

    /// Returns the distance in millimetres, or the matching error.
    pub fn into_distance<E>(self) -> Result<u32, Error<E>> {
        match self {
            Self::Distance(mm) => Ok(mm),
            Self::TooBright => Err(Error::TooBright),
            Self::TooDim => Err(Error::TooDim),
            Self::BadReading => Err(Error::BadReading),
        }
    }
}

/// Interprets a measurement payload straight into a distance in millimetres.
pub fn interpret<E>(payload: &[u8]) -> Result<u32, Error<E>> {
    match Measurement::from_payload(payload) {
        Some(measurement) => {
            if !matches!(measurement, Measurement::Distance(_)) {
                log::warn!("Module reported {:?}", measurement);
            }
            measurement.into_distance()
        }
        None => {
            log::error!("Unexpected measurement payload: {:02X?}", payload);
            Err(Error::CommandFailed(Failure::Garbled))
        }
    }
}

fn parse_decimal(digits: &[u8]) -> Option<u32> {
    core::str::from_utf8(digits).ok()?.trim().parse().ok()
}
