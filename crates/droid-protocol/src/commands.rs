//! Commands that can be sent to the droid.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::{decimal_digits_byte, encode_multipurpose, CommandFrame};
use crate::hardware;

/// What to do with a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptAction {
    /// Open the script for writing.
    Open,
    /// Close the open script and stop execution.
    Close,
    /// Run the script.
    Execute,
}

impl ScriptAction {
    /// Wire value of the action.
    pub fn code(self) -> u8 {
        match self {
            ScriptAction::Open => SCRIPT_ACTION_OPEN,
            ScriptAction::Close => SCRIPT_ACTION_CLOSE,
            ScriptAction::Execute => SCRIPT_ACTION_EXECUTE,
        }
    }
}

/// Commands that can be sent to the droid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Keep-alive. Has no visible effect on the droid.
    Heartbeat,

    /// Ask for the firmware information block. Answered by a
    /// [`NOTIFY_FIRMWARE_INFO_RESPONSE`] notification.
    RetrieveFirmwareInformation,

    /// Turn the pairing LED on or off.
    SetPairingLed(bool),

    /// Turn the RGB LED on or off. No shipping droid has one.
    SetRgbLed(bool),

    /// Flash the pairing LED. The payload layout is not decoded.
    FlashPairingLed {
        /// Raw pattern bytes.
        pattern: Vec<u8>,
    },

    /// Open, close or run a script.
    Script {
        /// Script id.
        script_id: u8,
        /// Action to perform.
        action: ScriptAction,
    },

    /// Drive a single motor.
    MotorSpeed {
        /// Direction nibble (0 or 8).
        direction: u8,
        /// Motor id.
        motor: u8,
        /// Target speed.
        speed: u8,
        /// Ramp time.
        ramp: u16,
        /// Delay before starting.
        delay: u16,
    },

    /// Center the R-unit head.
    CenterHead {
        /// Rotation speed.
        speed: u8,
        /// Offset from center.
        offset: u8,
    },

    /// Audio controller command.
    Audio {
        /// Audio command code.
        command: u8,
        /// Single byte argument.
        argument: u8,
    },

    /// Any multipurpose sub-command.
    Multipurpose {
        /// Sub-command id.
        sub_command: u8,
        /// Data following the sub-command.
        data: Vec<u8>,
    },

    /// Arbitrary command id and payload.
    Raw {
        /// Command id.
        command_id: u8,
        /// Payload bytes.
        payload: Vec<u8>,
    },
}

impl Command {
    /// Run a script, refusing ids that are invalid or dangerous.
    pub fn execute_script(script_id: u8) -> Result<Self, ProtocolError> {
        let command = Command::Script {
            script_id,
            action: ScriptAction::Execute,
        };
        command.validate()?;
        Ok(command)
    }

    /// Command id this command is sent with.
    pub fn command_id(&self) -> u8 {
        match self {
            Command::Heartbeat => CMD_CONNECTION_HEARTBEAT,
            Command::RetrieveFirmwareInformation => CMD_RETRIEVE_FIRMWARE_INFO,
            Command::SetPairingLed(_) => CMD_SET_PAIRING_LED,
            Command::SetRgbLed(_) => CMD_SET_RGB_LED,
            Command::FlashPairingLed { .. } => CMD_FLASH_PAIRING_LED,
            Command::Script { .. } => CMD_SCRIPT_ACTION,
            Command::MotorSpeed { .. } => CMD_SET_MOTOR_SPEED,
            Command::CenterHead { .. } | Command::Audio { .. } | Command::Multipurpose { .. } => {
                CMD_MULTIPURPOSE
            }
            Command::Raw { command_id, .. } => *command_id,
        }
    }

    /// Check preconditions without building the frame.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Command::Script { script_id, action } => validate_script(*script_id, *action),
            Command::MotorSpeed {
                direction, motor, ..
            } => {
                if *direction != MOTOR_DIRECTION_FORWARD && *direction != MOTOR_DIRECTION_BACKWARDS {
                    return Err(ProtocolError::InvalidDirection {
                        direction: *direction,
                        motor: *motor,
                    });
                }
                if *motor > MOTOR_HEAD {
                    return Err(ProtocolError::malformed(format!("unknown motor {}", motor)));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Build the frame for this command.
    pub fn to_frame(&self) -> Result<CommandFrame, ProtocolError> {
        self.validate()?;

        match self {
            Command::Heartbeat => Ok(CommandFrame::empty(CMD_CONNECTION_HEARTBEAT)),

            Command::RetrieveFirmwareInformation => Ok(CommandFrame::empty(CMD_RETRIEVE_FIRMWARE_INFO)),

            Command::SetPairingLed(on) => {
                CommandFrame::new(CMD_SET_PAIRING_LED, vec![0x00, led_state(*on)])
            }

            Command::SetRgbLed(on) => CommandFrame::new(CMD_SET_RGB_LED, vec![0x00, led_state(*on)]),

            Command::FlashPairingLed { pattern } => {
                CommandFrame::new(CMD_FLASH_PAIRING_LED, pattern.clone())
            }

            Command::Script { script_id, action } => CommandFrame::new(
                CMD_SCRIPT_ACTION,
                vec![decimal_digits_byte(*script_id)?, decimal_digits_byte(action.code())?],
            ),

            Command::MotorSpeed {
                direction,
                motor,
                speed,
                ramp,
                delay,
            } => {
                let mut payload = vec![(direction << 4) | motor, *speed];
                // Ramp is sent with as few bytes as it needs, delay always
                // takes two.
                payload.extend_from_slice(&minimal_be_bytes(*ramp));
                payload.extend_from_slice(&delay.to_be_bytes());
                CommandFrame::new(CMD_SET_MOTOR_SPEED, payload)
            }

            Command::CenterHead { speed, offset } => {
                encode_multipurpose(SUB_CENTER_RUNIT_HEAD, &[*speed, *offset])
            }

            Command::Audio { command, argument } => {
                encode_multipurpose(SUB_AUDIO_CONTROLLER, &[*command, *argument])
            }

            Command::Multipurpose { sub_command, data } => encode_multipurpose(*sub_command, data),

            Command::Raw {
                command_id,
                payload,
            } => CommandFrame::new(*command_id, payload.clone()),
        }
    }

    /// Encode this command to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        self.to_frame()?.encode()
    }
}

/// Commands that play the shutdown clip for a personality: select the bank,
/// then play from it.
pub fn shutdown_audio_commands(personality_id: u8) -> [Command; 2] {
    let (bank, clip) = hardware::shutdown_track(personality_id);
    [
        Command::Audio {
            command: AUDIO_SET_SELECTED_BANK,
            argument: bank - 1,
        },
        Command::Audio {
            command: AUDIO_PLAY_FROM_SELECTED_GROUP,
            argument: clip - 1,
        },
    ]
}

fn validate_script(script_id: u8, action: ScriptAction) -> Result<(), ProtocolError> {
    if script_id == 0 && action != ScriptAction::Close {
        return Err(ProtocolError::InvalidScriptId(script_id as i32));
    }
    if script_id == SCRIPT_FULL_THROTTLE_TEST {
        return Err(ProtocolError::DangerousScript(script_id));
    }
    if action == ScriptAction::Open && script_id <= MAX_FACTORY_SCRIPT {
        return Err(ProtocolError::ReservedScript(script_id));
    }
    Ok(())
}

fn led_state(on: bool) -> u8 {
    if on {
        0xFF
    } else {
        0x00
    }
}

fn minimal_be_bytes(value: u16) -> Vec<u8> {
    if value > 0xFF {
        value.to_be_bytes().to_vec()
    } else {
        vec![value as u8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_frame() {
        assert_eq!(Command::Heartbeat.encode().unwrap(), vec![0x23, 0x00, 0x0E, 0x40]);
    }

    #[test]
    fn test_firmware_request_frame() {
        assert_eq!(
            Command::RetrieveFirmwareInformation.encode().unwrap(),
            vec![0x23, 0x00, 0x01, 0x40]
        );
    }

    #[test]
    fn test_pairing_led() {
        let frame = Command::SetPairingLed(true).to_frame().unwrap();
        assert_eq!(frame.payload, vec![0x00, 0xFF]);
        let frame = Command::SetRgbLed(false).to_frame().unwrap();
        assert_eq!(frame.payload, vec![0x00, 0x00]);
    }

    #[test]
    fn test_execute_script_payload() {
        let frame = Command::execute_script(11).unwrap().to_frame().unwrap();
        assert_eq!(frame.command_id, CMD_SCRIPT_ACTION);
        assert_eq!(frame.payload, vec![0x11, 0x02]);

        let frame = Command::execute_script(3).unwrap().to_frame().unwrap();
        assert_eq!(frame.payload, vec![0x03, 0x02]);
    }

    #[test]
    fn test_script_preconditions() {
        assert_eq!(Command::execute_script(0), Err(ProtocolError::InvalidScriptId(0)));
        assert_eq!(Command::execute_script(13), Err(ProtocolError::DangerousScript(13)));

        let open_factory = Command::Script {
            script_id: 7,
            action: ScriptAction::Open,
        };
        assert_eq!(open_factory.encode(), Err(ProtocolError::ReservedScript(7)));

        let open_custom = Command::Script {
            script_id: 20,
            action: ScriptAction::Open,
        };
        assert_eq!(open_custom.to_frame().unwrap().payload, vec![0x20, 0x00]);

        let close_all = Command::Script {
            script_id: 0,
            action: ScriptAction::Close,
        };
        assert_eq!(close_all.to_frame().unwrap().payload, vec![0x00, 0x01]);
    }

    #[test]
    fn test_motor_speed_payload() {
        let command = Command::MotorSpeed {
            direction: MOTOR_DIRECTION_RIGHT,
            motor: MOTOR_HEAD,
            speed: 160,
            ramp: 300,
            delay: 0,
        };
        let frame = command.to_frame().unwrap();
        assert_eq!(frame.payload, vec![0x82, 0xA0, 0x01, 0x2C, 0x00, 0x00]);

        let command = Command::MotorSpeed {
            direction: MOTOR_DIRECTION_FORWARD,
            motor: MOTOR_LEFT,
            speed: 100,
            ramp: 200,
            delay: 0x0102,
        };
        let frame = command.to_frame().unwrap();
        assert_eq!(frame.payload, vec![0x00, 0x64, 0xC8, 0x01, 0x02]);
    }

    #[test]
    fn test_motor_invalid_direction() {
        let command = Command::MotorSpeed {
            direction: 4,
            motor: MOTOR_HEAD,
            speed: 160,
            ramp: 300,
            delay: 0,
        };
        assert_eq!(
            command.encode(),
            Err(ProtocolError::InvalidDirection {
                direction: 4,
                motor: MOTOR_HEAD
            })
        );
    }

    #[test]
    fn test_multipurpose_commands() {
        let frame = Command::CenterHead { speed: 255, offset: 0 }.to_frame().unwrap();
        assert_eq!(frame.command_id, CMD_MULTIPURPOSE);
        assert_eq!(frame.payload, vec![0x44, 0x01, 0xFF, 0x00]);

        let frame = Command::Audio {
            command: AUDIO_SET_VOLUME,
            argument: 20,
        }
        .to_frame()
        .unwrap();
        assert_eq!(frame.payload, vec![0x44, 0x00, 0x0E, 0x14]);
    }

    #[test]
    fn test_shutdown_audio_commands() {
        let [select, play] = shutdown_audio_commands(hardware::personality::GRAY);
        assert_eq!(
            select,
            Command::Audio {
                command: AUDIO_SET_SELECTED_BANK,
                argument: 6
            }
        );
        assert_eq!(
            play,
            Command::Audio {
                command: AUDIO_PLAY_FROM_SELECTED_GROUP,
                argument: 3
            }
        );
    }

    #[test]
    fn test_command_ids() {
        assert_eq!(Command::Heartbeat.command_id(), CMD_CONNECTION_HEARTBEAT);
        assert_eq!(
            Command::Raw {
                command_id: 0x33,
                payload: vec![]
            }
            .command_id(),
            0x33
        );
        assert_eq!(Command::CenterHead { speed: 1, offset: 0 }.command_id(), CMD_MULTIPURPOSE);
    }
}
