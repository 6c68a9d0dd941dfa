/// Command opcodes understood by the laser module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    ReadSwVersion = 0x01,
    ReadDevType = 0x02,
    ReadSlaveAddress = 0x04,
    ReadDeviceErr = 0x08,
    SetSlaveAddress = 0x41,
    LaserOn = 0x42,
    LaserOff = 0x43,
    SingleMeasure = 0x44,
    ContinuousMeasure = 0x45,
    StopContinuousMeasure = 0x46,
    BuzzerControl = 0x47,
}

impl Command {
    /// The byte placed in the COMMAND field of a frame.
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.opcode()
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        Ok(match opcode {
            0x01 => Self::ReadSwVersion,
            0x02 => Self::ReadDevType,
            0x04 => Self::ReadSlaveAddress,
            0x08 => Self::ReadDeviceErr,
            0x41 => Self::SetSlaveAddress,
            0x42 => Self::LaserOn,
            0x43 => Self::LaserOff,
            0x44 => Self::SingleMeasure,
            0x45 => Self::ContinuousMeasure,
            0x46 => Self::StopContinuousMeasure,
            0x47 => Self::BuzzerControl,
            other => return Err(other),
        })
    }
}
