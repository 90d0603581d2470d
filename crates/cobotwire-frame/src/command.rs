//! Command codes and protocol marker bytes.
//!
//! Every request carries one command byte and the controller echoes it back
//! in the response frame, which is how a response is matched to its request.

use std::fmt;
use std::str::FromStr;

/// First two bytes of every protocol frame.
pub const HEADER: u8 = 0xFE;

/// Footer byte the controller appends after the payload.
pub const FOOTER: u8 = 0xFA;

/// First two bytes of the unsolicited chatter frames emitted by the controller.
pub const CHATTER_HEADER: u8 = 0xFF;

macro_rules! commands {
    ($($(#[$doc:meta])* $variant:ident = $code:literal => $name:literal,)+) => {
        /// A protocol command code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Command {
            $($(#[$doc])* $variant = $code,)+
        }

        impl Command {
            /// Every known command, in code order.
            pub const ALL: &'static [Command] = &[$(Command::$variant,)+];

            /// Protocol name, e.g. `"GET_ANGLES"`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)+
                }
            }
        }

        impl TryFrom<u8> for Command {
            type Error = UnknownCommand;

            fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Command::$variant),)+
                    other => Err(UnknownCommand::Code(other)),
                }
            }
        }
    };
}

commands! {
    // System status
    Version = 0x00 => "VERSION",

    // Overall status
    PowerOn = 0x10 => "POWER_ON",
    PowerOff = 0x11 => "POWER_OFF",
    IsPowerOn = 0x12 => "IS_POWER_ON",
    ReleaseAllServos = 0x13 => "RELEASE_ALL_SERVOS",
    IsControllerConnected = 0x14 => "IS_CONTROLLER_CONNECTED",
    ReadNextError = 0x15 => "READ_NEXT_ERROR",
    SetFreeMode = 0x1A => "SET_FREE_MODE",
    IsFreeMode = 0x1B => "IS_FREE_MODE",

    // MDI mode and operation
    /// Six joint angles, 0.01° each.
    GetAngles = 0x20 => "GET_ANGLES",
    SendAngle = 0x21 => "SEND_ANGLE",
    SendAngles = 0x22 => "SEND_ANGLES",
    /// Six coordinates: x/y/z in 0.1 mm, rx/ry/rz in 0.01°.
    GetCoords = 0x23 => "GET_COORDS",
    SendCoord = 0x24 => "SEND_COORD",
    SendCoords = 0x25 => "SEND_COORDS",
    Pause = 0x26 => "PAUSE",
    IsPaused = 0x27 => "IS_PAUSED",
    Resume = 0x28 => "RESUME",
    Stop = 0x29 => "STOP",
    IsInPosition = 0x2A => "IS_IN_POSITION",
    IsMoving = 0x2B => "IS_MOVING",

    // Jog mode and operation
    JogAngle = 0x30 => "JOG_ANGLE",
    JogCoord = 0x32 => "JOG_COORD",
    JogStop = 0x34 => "JOG_STOP",
    SetEncoder = 0x3A => "SET_ENCODER",
    GetEncoder = 0x3B => "GET_ENCODER",
    SetEncoders = 0x3C => "SET_ENCODERS",
    GetEncoders = 0x3D => "GET_ENCODERS",

    // Running status and settings
    GetSpeed = 0x40 => "GET_SPEED",
    SetSpeed = 0x41 => "SET_SPEED",
    GetFeedOverride = 0x42 => "GET_FEED_OVERRIDE",
    GetAcceleration = 0x44 => "GET_ACCELERATION",
    GetJointMinAngle = 0x4A => "GET_JOINT_MIN_ANGLE",
    GetJointMaxAngle = 0x4B => "GET_JOINT_MAX_ANGLE",

    // Servo control
    /// Reply body is two bytes; only the second carries the flag.
    IsServoEnable = 0x50 => "IS_SERVO_ENABLE",
    IsAllServoEnable = 0x51 => "IS_ALL_SERVO_ENABLE",
    SetServoData = 0x52 => "SET_SERVO_DATA",
    GetServoData = 0x53 => "GET_SERVO_DATA",
    SetServoCalibration = 0x54 => "SET_SERVO_CALIBRATION",
    ReleaseServo = 0x56 => "RELEASE_SERVO",
    FocusServo = 0x57 => "FOCUS_SERVO",

    // Atom IO
    SetPinMode = 0x60 => "SET_PIN_MODE",
    SetDigitalOutput = 0x61 => "SET_DIGITAL_OUTPUT",
    GetDigitalInput = 0x62 => "GET_DIGITAL_INPUT",
    SetPwmMode = 0x63 => "SET_PWM_MODE",
    SetPwmOutput = 0x64 => "SET_PWM_OUTPUT",
    GetGripperValue = 0x65 => "GET_GRIPPER_VALUE",
    SetGripperState = 0x66 => "SET_GRIPPER_STATE",
    SetGripperValue = 0x67 => "SET_GRIPPER_VALUE",
    SetGripperIni = 0x68 => "SET_GRIPPER_INI",
    IsGripperMoving = 0x69 => "IS_GRIPPER_MOVING",
    SetColor = 0x6A => "SET_COLOR",

    // Basic
    SetBasicOutput = 0xA0 => "SET_BASIC_OUTPUT",
    GetBasicInput = 0xA1 => "GET_BASIC_INPUT",
}

impl Command {
    /// The wire byte for this command.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd.code()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts protocol names (any case, `-` or `_`) and hex codes like `0x20`.
impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            let code = u8::from_str_radix(hex, 16)
                .map_err(|_| UnknownCommand::Name(trimmed.to_string()))?;
            return Command::try_from(code);
        }

        let normalized = trimmed.to_ascii_uppercase().replace('-', "_");
        Command::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.name() == normalized)
            .ok_or_else(|| UnknownCommand::Name(trimmed.to_string()))
    }
}

/// A byte or name that is not in the command table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownCommand {
    #[error("unknown command code 0x{0:02X}")]
    Code(u8),
    #[error("unknown command name {0:?}")]
    Name(String),
}

/// Returns the protocol name for a raw command byte.
pub fn command_name(code: u8) -> &'static str {
    Command::try_from(code).map(Command::name).unwrap_or("UNKNOWN")
}
