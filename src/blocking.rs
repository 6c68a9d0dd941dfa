use embassy_time::Instant;
use embedded_io::{Read, ReadReady, Write};
use log::{debug, error};

use crate::command::Command;
use crate::config::Config;
use crate::error::Error;
use crate::frame::{Frame, FrameScanner, Payload};
use crate::measurement;
use crate::session::{check_ack, correlate, first_byte, read_outcome, request};

/// Represents an Egismos laser rangefinder driven from blocking code.
///
/// Every operation runs to completion on the calling thread. While waiting for
/// a reply the port is polled one byte at a time and the elapsed time is
/// checked after each attempt, so the port's own read timeout only needs to be
/// short, not exact.
///
/// # Type Parameters
///
/// * `Serial`: The type of the serial interface used to communicate with the module.
///   It must implement `embedded_io::Read`, `embedded_io::Write` and
///   `embedded_io::ReadReady`. The link runs at 9600 baud, 8N1.
pub struct Laser<Serial> {
    serial: Serial,
    config: Config,
}

impl<S> Laser<S>
where
    S: Read + Write + ReadReady,
{
    /// Creates a new `Laser` instance.
    ///
    /// # Arguments
    ///
    /// * `serial`: The serial interface for communication with the module.
    /// * `config`: The slave address and reply timeout to use.
    pub fn new(serial: S, config: Config) -> Self {
        Self { serial, config }
    }

    /// The address commands are currently sent to.
    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gives back the serial interface.
    pub fn release(self) -> S {
        self.serial
    }

    /// Turns the laser pointer on or off.
    ///
    /// # Arguments
    ///
    /// * `on`: If `true`, turn on the laser, turn it off if `false`.
    pub fn set_laser(&mut self, on: bool) -> Result<(), Error<S::Error>> {
        let command = if on {
            Command::LaserOn
        } else {
            Command::LaserOff
        };
        self.send_command_checked(command, &[])
    }

    /// Turns on or off beeps when the module receives commands.
    pub fn set_buzzer(&mut self, on: bool) -> Result<(), Error<S::Error>> {
        self.send_command_checked(Command::BuzzerControl, &[u8::from(on)])
    }

    /// Stops measuring when in continuous mode.
    pub fn stop_measuring(&mut self) -> Result<(), Error<S::Error>> {
        self.send_command_checked(Command::StopContinuousMeasure, &[])
    }

    /// Sets the slave address of the module.
    ///
    /// The request goes to the current address. The new address is only used
    /// for later commands once the module has acknowledged it, so a failed
    /// attempt leaves the driver talking to the old address.
    ///
    /// # Arguments
    ///
    /// * `address`: The address to use, between 1 and 255.
    pub fn set_slave_address(&mut self, address: u8) -> Result<(), Error<S::Error>> {
        self.send_command_checked(Command::SetSlaveAddress, &[address])?;
        self.config.address = address;
        debug!("Slave address updated to {:#04X}", address);
        Ok(())
    }

    /// Makes a single reading.
    ///
    /// # Returns
    ///
    /// * `Ok(u32)` with the distance in millimetres.
    /// * `Err(Error::TooDim)` if the laser spot cannot be seen properly. Use reflective
    ///   tape or a shorter distance.
    /// * `Err(Error::TooBright)` if the spot is too bright (the target may be too close,
    ///   or there is too much ambient light).
    /// * `Err(Error::BadReading)` if the measurement failed, often due to movement.
    /// * `Err(Error::CommandFailed)` if the reply from the module was garbled.
    pub fn measure(&mut self) -> Result<u32, Error<S::Error>> {
        let payload = self.send_and_receive(Command::SingleMeasure, &[], None)?;
        measurement::interpret(&payload)
    }

    /// Makes a single reading and returns the distance in centimetres.
    ///
    /// Fails in the same ways as [`Laser::measure`].
    pub fn distance(&mut self) -> Result<f32, Error<S::Error>> {
        Ok(self.measure()? as f32 / 10.0)
    }

    /// Switches the module to continuous mode and returns its first reading in millimetres.
    ///
    /// Follow up with [`Laser::next_measurement`] and finish with
    /// [`Laser::stop_measuring`].
    pub fn start_measuring(&mut self) -> Result<u32, Error<S::Error>> {
        let payload = self.send_and_receive(Command::ContinuousMeasure, &[], None)?;
        measurement::interpret(&payload)
    }

    /// Waits for the next reading of continuous mode, in millimetres.
    pub fn next_measurement(&mut self) -> Result<u32, Error<S::Error>> {
        let frame = self.read_frame()?;
        let payload = correlate(&frame, Command::ContinuousMeasure, self.config.address)?;
        measurement::interpret(&payload)
    }

    /// Reads the raw software version reply.
    pub fn software_version(&mut self) -> Result<Payload, Error<S::Error>> {
        self.send_and_receive(Command::ReadSwVersion, &[], None)
    }

    /// Reads the raw device type reply.
    pub fn device_type(&mut self) -> Result<Payload, Error<S::Error>> {
        self.send_and_receive(Command::ReadDevType, &[], None)
    }

    /// Asks the module for its slave address. The driver's own address is left alone.
    pub fn read_slave_address(&mut self) -> Result<u8, Error<S::Error>> {
        let payload = self.send_and_receive(Command::ReadSlaveAddress, &[], None)?;
        first_byte(Command::ReadSlaveAddress, &payload)
    }

    /// Reads the module's last error code.
    pub fn device_error(&mut self) -> Result<u8, Error<S::Error>> {
        let payload = self.send_and_receive(Command::ReadDeviceErr, &[], None)?;
        first_byte(Command::ReadDeviceErr, &payload)
    }

    /// Sends a command and fails unless the module acknowledges it.
    pub fn send_command_checked(
        &mut self,
        command: Command,
        data: &[u8],
    ) -> Result<(), Error<S::Error>> {
        let payload = self.send_and_receive(command, data, None)?;
        check_ack(command, &payload)
    }

    /// Sends a command and returns the payload of the matching reply.
    ///
    /// # Arguments
    ///
    /// * `command`: The command to send.
    /// * `data`: Data bytes for the command, possibly empty.
    /// * `address`: Overrides the configured address for this exchange only.
    ///
    /// # Returns
    ///
    /// * `Ok(Payload)` with the data section of the reply.
    /// * `Err(Error::Frame)` if the reply was malformed or failed its checksum.
    /// * `Err(Error::Mismatch)` if the reply was for another command or address.
    /// * `Err(Error::Timeout)` if no complete reply arrived in time.
    /// * `Err(Error::Io)` for serial communication issues.
    pub fn send_and_receive(
        &mut self,
        command: Command,
        data: &[u8],
        address: Option<u8>,
    ) -> Result<Payload, Error<S::Error>> {
        let address = address.unwrap_or(self.config.address);
        let frame = request(command, address, data)?;
        // Not atomic with the write: bytes landing in between still reach read_frame
        self.drain_input()?;
        self.write(&frame)?;
        let reply = self.read_frame()?;
        correlate(&reply, command, address)
    }

    // Drops whatever the port already holds so a stale reply cannot be taken
    // for the answer to the next command.
    fn drain_input(&mut self) -> Result<(), Error<S::Error>> {
        let mut scratch = [0u8; 16];
        let mut discarded = 0;
        while self.serial.read_ready().map_err(Error::Io)? {
            let n = read_outcome(self.serial.read(&mut scratch))?;
            if n == 0 {
                break;
            }
            discarded += n;
        }
        if discarded > 0 {
            debug!("Discarded {} stale bytes", discarded);
        }
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Error<S::Error>> {
        self.serial.write_all(frame).map_err(|e| {
            error!("Serial write error: {:?}", e);
            Error::Io(e)
        })?;
        self.serial.flush().map_err(Error::Io)
    }

    // Scans the port for a frame until the configured timeout runs out.
    //
    // `Read::read` may block until a byte arrives, so the port is only read
    // once it reports input; otherwise a silent module would never time out.
    fn read_frame(&mut self) -> Result<Frame, Error<S::Error>> {
        let deadline = Instant::now() + self.config.timeout;
        let mut scanner = FrameScanner::new();
        let mut byte = [0u8; 1];

        loop {
            if self.serial.read_ready().map_err(Error::Io)? {
                let n = read_outcome(self.serial.read(&mut byte))?;
                if let Some(frame) = scanner.feed_bytes(&byte[..n])? {
                    return Ok(frame);
                }
            } else {
                core::hint::spin_loop();
            }
            if Instant::now() > deadline {
                error!(
                    "Timed out after {} ms waiting for a reply",
                    self.config.timeout.as_millis()
                );
                return Err(Error::Timeout);
            }
        }
    }
}
