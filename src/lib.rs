//! Driver for Egismos laser distance modules ("Laser Module 2").
//!
//! The module talks a small framed protocol over UART at 9600 baud:
//!
//! ```text
//! 0xAA | address | command | data... | checksum | 0xA8
//! ```
//!
//! where the checksum is the sum of address, command and data bytes masked to
//! 7 bits. Every command is answered by a frame echoing the command and
//! address; simple commands reply with `0x01` on success, measurements reply
//! with the distance in millimetres as ASCII digits.
//!
//! Two drivers share the same codec and correlation rules:
//!
//! * [`Laser`] for blocking ports implementing `embedded_io` traits.
//! * [`AsyncLaser`] for async ports implementing `embedded_io_async` traits,
//!   with the reply timeout enforced by `embassy_time::with_timeout`.
//!
//! Each driver owns its port, so only one exchange can be in flight at a time.
//! Nothing is retried internally: timeouts and malformed replies are returned
//! to the caller.
#![cfg_attr(not(test), no_std)]

mod constants;
pub use constants::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod command;
pub use command::*;

pub mod frame;
pub use frame::{build_frame, parse_frame, Frame, FrameScanner, ParsedFrame, Payload};

mod measurement;
pub use measurement::*;

mod session;

mod blocking;
pub use blocking::Laser;

mod asynch;
pub use asynch::AsyncLaser;
