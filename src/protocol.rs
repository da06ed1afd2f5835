//! SP108E wire protocol
//!
//! Commands are 6-byte frames: `[0x38, b0, b1, b2, command, 0x83]`. Custom
//! preview frames are the raw RGB bytes of the [`FrameBuffer`](crate::types::FrameBuffer)
//! without any framing. Commands that expect a reply get a 10-byte answer
//! whose first byte is [`ACK`].

use crate::{Result, TableError};

/// First byte of every command frame.
pub const FRAME_START: u8 = 0x38;

/// Last byte of every command frame.
pub const FRAME_END: u8 = 0x83;

/// Switch the controller into custom-preview (streaming) mode.
pub const CMD_CUSTOM_PREVIEW: u8 = 0x24;

/// Set the global brightness; the value is repeated in all three argument bytes.
pub const CMD_BRIGHTNESS: u8 = 0x2a;

/// Leading byte of a positive acknowledgement.
pub const ACK: u8 = 0x31;

/// Size of the controller's reply to an acknowledged command.
pub const ACK_LEN: usize = 10;

/// Length of an encoded command frame.
pub const COMMAND_LEN: usize = 6;

/// Build a command frame around a 3-byte argument.
pub fn build_command_packet(command: u8, arg: &[u8]) -> Result<[u8; COMMAND_LEN]> {
    let [b0, b1, b2] = <[u8; 3]>::try_from(arg).map_err(|_| {
        TableError::validation(format!("command argument must be 3 bytes, got {}", arg.len()))
    })?;
    Ok([FRAME_START, b0, b1, b2, command, FRAME_END])
}

/// Brightness command for `value`.
pub fn brightness_packet(value: u8) -> Result<[u8; COMMAND_LEN]> {
    build_command_packet(CMD_BRIGHTNESS, &[value; 3])
}

/// Command that starts custom-preview streaming.
pub fn custom_preview_packet() -> Result<[u8; COMMAND_LEN]> {
    build_command_packet(CMD_CUSTOM_PREVIEW, &[0x00; 3])
}

/// Check a controller reply for the acknowledgement marker.
pub fn check_ack(reply: &[u8]) -> Result<()> {
    match reply.first() {
        Some(&ACK) => Ok(()),
        Some(other) => Err(TableError::protocol(format!(
            "unexpected acknowledgement {other:#04x} (reply {reply:02x?})"
        ))),
        None => Err(TableError::protocol("unexpected acknowledgement: empty reply")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn three_byte_arguments_always_frame(command in any::<u8>(), arg in prop::array::uniform3(any::<u8>())) {
            let packet = build_command_packet(command, &arg).unwrap();
            prop_assert_eq!(packet.len(), COMMAND_LEN);
            prop_assert_eq!(packet[0], FRAME_START);
            prop_assert_eq!(&packet[1..4], &arg[..]);
            prop_assert_eq!(packet[4], command);
            prop_assert_eq!(packet[5], FRAME_END);
        }

        #[test]
        fn other_lengths_are_rejected(command in any::<u8>(), arg in prop::collection::vec(any::<u8>(), 0..16)) {
            prop_assume!(arg.len() != 3);
            let err = build_command_packet(command, &arg).unwrap_err();
            prop_assert!(matches!(err, TableError::Validation { .. }), "expected Validation error, got {:?}", err);
        }
    }

    #[test]
    fn helper_packets_use_the_command_frame() {
        assert_eq!(brightness_packet(7).unwrap(), [0x38, 7, 7, 7, 0x2a, 0x83]);
        assert_eq!(brightness_packet(0xff).unwrap(), [0x38, 0xff, 0xff, 0xff, 0x2a, 0x83]);
        assert_eq!(custom_preview_packet().unwrap(), [0x38, 0, 0, 0, 0x24, 0x83]);
    }

    #[test]
    fn ack_checking() {
        assert!(check_ack(&[ACK, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_ok());
        assert!(matches!(check_ack(&[0x30]).unwrap_err(), TableError::Protocol { .. }));
        assert!(matches!(check_ack(&[]).unwrap_err(), TableError::Protocol { .. }));
    }
}
