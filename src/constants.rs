use embassy_time::Duration;

// FRAME_START is the byte that marks the beginning of any frame (command or reply).
pub const FRAME_START: u8 = 0xAA;

// FRAME_END is the byte that marks the end of any frame (command or reply).
pub const FRAME_END: u8 = 0xA8;

// CHECKSUM_MASK keeps the additive checksum within 7 bits, so it can never collide
// with either frame marker.
pub const CHECKSUM_MASK: u8 = 0x7F;

// ACK is the first payload byte the module replies with when a command succeeded.
pub const ACK: u8 = 0x01;

// DEFAULT_ADDRESS is the factory slave address of the module.
pub const DEFAULT_ADDRESS: u8 = 0x01;

// DEFAULT_TIMEOUT bounds how long a reply is waited for.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// Smallest possible frame: START, address, command, checksum, END.
pub const MIN_FRAME_LEN: usize = 5;

// Largest frame the scanner accepts before giving up on it.
pub const MAX_FRAME_LEN: usize = 32;

// Largest data section a frame can carry.
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - MIN_FRAME_LEN;

// Measurement replies carrying one of these payloads report a failed reading.
pub const ERR_TOO_BRIGHT: &[u8] = b"ERR256";
pub const ERR_TOO_DIM: &[u8] = b"ERR255";
pub const ERR_BAD_READING: &[u8] = b"ERR204";
