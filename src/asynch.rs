use embassy_futures::yield_now;
use embassy_time::with_timeout;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use log::{debug, error};

use crate::command::Command;
use crate::config::Config;
use crate::error::Error;
use crate::frame::{Frame, FrameScanner, Payload};
use crate::measurement;
use crate::session::{check_ack, correlate, first_byte, read_outcome, request};

/// Represents an Egismos laser rangefinder driven from async code.
///
/// Behaves exactly like [`crate::Laser`], but every wait for a byte is an
/// await point, so other tasks keep running while a reply is pending. The
/// reply timeout is applied to the whole scan with
/// [`embassy_time::with_timeout`]; when it fires the in-flight read is dropped
/// and any partial frame is left behind for the next exchange to skip over.
///
/// # Type Parameters
///
/// * `Serial`: The type of the serial interface used to communicate with the module.
///   It must implement `embedded_io_async::Read`, `embedded_io_async::Write` and
///   `embedded_io::ReadReady`.
pub struct AsyncLaser<Serial> {
    serial: Serial,
    config: Config,
}

impl<S> AsyncLaser<S>
where
    S: Read + Write + ReadReady,
{
    /// Creates a new `AsyncLaser` instance.
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
    pub async fn set_laser(&mut self, on: bool) -> Result<(), Error<S::Error>> {
        let command = if on {
            Command::LaserOn
        } else {
            Command::LaserOff
        };
        self.send_command_checked(command, &[]).await
    }

    /// Turns on or off beeps when the module receives commands.
    pub async fn set_buzzer(&mut self, on: bool) -> Result<(), Error<S::Error>> {
        self.send_command_checked(Command::BuzzerControl, &[u8::from(on)])
            .await
    }

    /// Stops measuring when in continuous mode.
    pub async fn stop_measuring(&mut self) -> Result<(), Error<S::Error>> {
        self.send_command_checked(Command::StopContinuousMeasure, &[])
            .await
    }

    /// Sets the slave address of the module.
    ///
    /// See [`crate::Laser::set_slave_address`]; the stored address only
    /// changes after the module acknowledges.
    pub async fn set_slave_address(&mut self, address: u8) -> Result<(), Error<S::Error>> {
        self.send_command_checked(Command::SetSlaveAddress, &[address])
            .await?;
        self.config.address = address;
        debug!("Slave address updated to {:#04X}", address);
        Ok(())
    }

    /// Makes a single reading, in millimetres.
    ///
    /// Fails in the same ways as [`crate::Laser::measure`].
    pub async fn measure(&mut self) -> Result<u32, Error<S::Error>> {
        let payload = self
            .send_and_receive(Command::SingleMeasure, &[], None)
            .await?;
        measurement::interpret(&payload)
    }

    /// Makes a single reading and returns the distance in centimetres.
    pub async fn distance(&mut self) -> Result<f32, Error<S::Error>> {
        Ok(self.measure().await? as f32 / 10.0)
    }

    /// Switches the module to continuous mode and returns its first reading in millimetres.
    pub async fn start_measuring(&mut self) -> Result<u32, Error<S::Error>> {
        let payload = self
            .send_and_receive(Command::ContinuousMeasure, &[], None)
            .await?;
        measurement::interpret(&payload)
    }

    /// Waits for the next reading of continuous mode, in millimetres.
    pub async fn next_measurement(&mut self) -> Result<u32, Error<S::Error>> {
        let frame = self.read_frame().await?;
        let payload = correlate(&frame, Command::ContinuousMeasure, self.config.address)?;
        measurement::interpret(&payload)
    }

    /// Reads the raw software version reply.
    pub async fn software_version(&mut self) -> Result<Payload, Error<S::Error>> {
        self.send_and_receive(Command::ReadSwVersion, &[], None)
            .await
    }

    /// Reads the raw device type reply.
    pub async fn device_type(&mut self) -> Result<Payload, Error<S::Error>> {
        self.send_and_receive(Command::ReadDevType, &[], None).await
    }

    /// Asks the module for its slave address. The driver's own address is left alone.
    pub async fn read_slave_address(&mut self) -> Result<u8, Error<S::Error>> {
        let payload = self
            .send_and_receive(Command::ReadSlaveAddress, &[], None)
            .await?;
        first_byte(Command::ReadSlaveAddress, &payload)
    }

    /// Reads the module's last error code.
    pub async fn device_error(&mut self) -> Result<u8, Error<S::Error>> {
        let payload = self
            .send_and_receive(Command::ReadDeviceErr, &[], None)
            .await?;
        first_byte(Command::ReadDeviceErr, &payload)
    }

    /// Sends a command and fails unless the module acknowledges it.
    pub async fn send_command_checked(
        &mut self,
        command: Command,
        data: &[u8],
    ) -> Result<(), Error<S::Error>> {
        let payload = self.send_and_receive(command, data, None).await?;
        check_ack(command, &payload)
    }

    /// Sends a command and returns the payload of the matching reply.
    ///
    /// `address` overrides the configured address for this exchange only.
    /// Errors are the same as for [`crate::Laser::send_and_receive`].
    pub async fn send_and_receive(
        &mut self,
        command: Command,
        data: &[u8],
        address: Option<u8>,
    ) -> Result<Payload, Error<S::Error>> {
        let address = address.unwrap_or(self.config.address);
        let frame = request(command, address, data)?;
        // Not atomic with the write: bytes landing in between still reach read_frame
        self.drain_input().await?;
        self.write(&frame).await?;
        let reply = self.read_frame().await?;
        correlate(&reply, command, address)
    }

    async fn drain_input(&mut self) -> Result<(), Error<S::Error>> {
        let mut scratch = [0u8; 16];
        let mut discarded = 0;
        while self.serial.read_ready().map_err(Error::Io)? {
            let n = read_outcome(self.serial.read(&mut scratch).await)?;
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

    async fn write(&mut self, frame: &Frame) -> Result<(), Error<S::Error>> {
        self.serial.write_all(frame).await.map_err(|e| {
            error!("Serial write error: {:?}", e);
            Error::Io(e)
        })?;
        self.serial.flush().await.map_err(Error::Io)
    }

    async fn read_frame(&mut self) -> Result<Frame, Error<S::Error>> {
        let timeout = self.config.timeout;
        match with_timeout(timeout, scan(&mut self.serial)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Timed out after {} ms waiting for a reply",
                    timeout.as_millis()
                );
                Err(Error::Timeout)
            }
        }
    }
}

// Reads byte by byte until the scanner yields a frame. Unbounded on its own;
// the caller puts a timeout around it.
async fn scan<S: Read>(serial: &mut S) -> Result<Frame, Error<S::Error>> {
    let mut scanner = FrameScanner::new();
    let mut byte = [0u8; 1];

    loop {
        let n = read_outcome(serial.read(&mut byte).await)?;
        if let Some(frame) = scanner.feed_bytes(&byte[..n])? {
            return Ok(frame);
        }
        if n == 0 {
            // A port that answers empty-handed without suspending would
            // otherwise starve the timer
            yield_now().await;
        }
    }
}
