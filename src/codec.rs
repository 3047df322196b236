//! # Payload Codec
//!
//! Conversion between typed values and the data section of Modbus frames.
//!
//! ## Read responses
//!
//! Data starts at byte 9 of the ADU (after MBAP, function code and byte count).
//!
//! | Function | Layout |
//! |----------|--------|
//! | FC01/FC02 | packed bits, LSB of the first byte is the first coil |
//! | FC03/FC04 | big-endian 16-bit registers |
//!
//! ## Write payloads
//!
//! A write payload is everything after the function code:
//!
//! | Values | Layout |
//! |--------|--------|
//! | 1 coil | address, `0xFF00` or `0x0000` |
//! | 1 register | address, value |
//! | N coils | address, N, ceil(N/8), packed bits |
//! | N registers | address, N, 2N, values |

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{
    COIL_OFF, COIL_ON, MAX_WRITE_COILS, MAX_WRITE_REGISTERS, OFFSET_READ_DATA,
};
use crate::error::{ModbusError, ModbusResult};

/// Pack coils into bytes, LSB-first, zero-padding the last byte
pub fn pack_bits(values: &[bool]) -> Vec<u8> {
    let mut packed = vec![0u8; values.len().div_ceil(8)];
    for (i, &on) in values.iter().enumerate() {
        if on {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    packed
}

/// Expand the first `count` bits of `bytes`, LSB-first
pub fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect()
}

/// Decode `count` coils or discrete inputs from a validated read response.
///
/// Only the first `count` bits are returned; padding bits in the last byte
/// are ignored.
pub fn decode_bits(response: &[u8], count: usize) -> ModbusResult<Vec<bool>> {
    let needed = OFFSET_READ_DATA + count.div_ceil(8);
    if response.len() < needed {
        return Err(ModbusError::FrameTooShort {
            expected: needed,
            actual: response.len(),
        });
    }
    Ok(unpack_bits(&response[OFFSET_READ_DATA..needed], count))
}

/// Decode `count` big-endian registers from a validated read response
pub fn decode_registers(response: &[u8], count: usize) -> ModbusResult<Vec<u16>> {
    let needed = OFFSET_READ_DATA + count * 2;
    if response.len() < needed {
        return Err(ModbusError::FrameTooShort {
            expected: needed,
            actual: response.len(),
        });
    }
    Ok(response[OFFSET_READ_DATA..needed]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Flatten registers into their big-endian wire bytes
pub fn registers_to_bytes(registers: &[u16]) -> Vec<u8> {
    registers.iter().flat_map(|r| r.to_be_bytes()).collect()
}

/// Build the payload for a coil write.
///
/// One value produces the FC05 form; anything longer the FC15 form.
pub fn encode_bit_payload(address: u16, values: &[bool]) -> ModbusResult<Bytes> {
    match values {
        [] => Err(ModbusError::invalid_data("No coils to write")),
        [single] => {
            let mut buf = BytesMut::with_capacity(4);
            buf.put_u16(address);
            buf.put_u16(if *single { COIL_ON } else { COIL_OFF });
            Ok(buf.freeze())
        }
        _ if values.len() > MAX_WRITE_COILS => Err(ModbusError::invalid_data(format!(
            "Too many coils: {} (max {})",
            values.len(),
            MAX_WRITE_COILS
        ))),
        _ => {
            let packed = pack_bits(values);
            let mut buf = BytesMut::with_capacity(5 + packed.len());
            buf.put_u16(address);
            buf.put_u16(values.len() as u16);
            buf.put_u8(packed.len() as u8);
            buf.put_slice(&packed);
            Ok(buf.freeze())
        }
    }
}

/// Build the payload for a register write.
///
/// One value produces the FC06 form; anything longer the FC16 form.
pub fn encode_register_payload(address: u16, values: &[u16]) -> ModbusResult<Bytes> {
    match values {
        [] => Err(ModbusError::invalid_data("No registers to write")),
        [single] => {
            let mut buf = BytesMut::with_capacity(4);
            buf.put_u16(address);
            buf.put_u16(*single);
            Ok(buf.freeze())
        }
        _ if values.len() > MAX_WRITE_REGISTERS => Err(ModbusError::invalid_data(format!(
            "Too many registers: {} (max {})",
            values.len(),
            MAX_WRITE_REGISTERS
        ))),
        _ => {
            let mut buf = BytesMut::with_capacity(5 + values.len() * 2);
            buf.put_u16(address);
            buf.put_u16(values.len() as u16);
            buf.put_u8((values.len() * 2) as u8);
            for &value in values {
                buf.put_u16(value);
            }
            Ok(buf.freeze())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read_frame(data: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x00, 0x01, 0x00, 0x00, 0x00, 3 + data.len() as u8, 0x01, 0x03];
        // byte count
        frame.push(data.len() as u8);
        frame.extend_from_slice(data);
        frame
    }

    #[test]
    fn test_pack_bits_lsb_first() {
        let mut coils = vec![true; 8];
        coils.extend([false, true]);
        assert_eq!(pack_bits(&coils), vec![0xFF, 0x02]);
        assert_eq!(pack_bits(&[true, false, true]), vec![0x05]);
        assert!(pack_bits(&[]).is_empty());
    }

    #[test]
    fn test_decode_bits_ignores_padding() {
        let frame = read_frame(&[0xCD, 0x01]);
        let bits = decode_bits(&frame, 10).unwrap();
        assert_eq!(
            bits,
            vec![true, false, true, true, false, false, true, true, true, false]
        );
    }

    #[test]
    fn test_decode_registers_big_endian() {
        let frame = read_frame(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x03]);
        assert_eq!(decode_registers(&frame, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_short_frame() {
        let frame = read_frame(&[0x00, 0x01]);
        assert_eq!(
            decode_registers(&frame, 2),
            Err(ModbusError::FrameTooShort {
                expected: 13,
                actual: 11
            })
        );
        assert!(decode_bits(&frame[..9], 1).is_err());
    }

    #[test]
    fn test_single_value_payloads() {
        assert_eq!(
            encode_bit_payload(0x00AC, &[true]).unwrap().as_ref(),
            &[0x00, 0xAC, 0xFF, 0x00]
        );
        assert_eq!(
            encode_bit_payload(0x00AC, &[false]).unwrap().as_ref(),
            &[0x00, 0xAC, 0x00, 0x00]
        );
        assert_eq!(
            encode_register_payload(0x0001, &[0x0003]).unwrap().as_ref(),
            &[0x00, 0x01, 0x00, 0x03]
        );
    }

    #[test]
    fn test_multiple_coil_payload() {
        let mut coils = vec![true; 8];
        coils.extend([false, true]);
        let payload = encode_bit_payload(0x0013, &coils).unwrap();
        assert_eq!(
            payload.as_ref(),
            &[0x00, 0x13, 0x00, 0x0A, 0x02, 0xFF, 0x02]
        );
    }

    #[test]
    fn test_multiple_register_payload() {
        let payload = encode_register_payload(0x0001, &[0x000A, 0x0102]).unwrap();
        assert_eq!(
            payload.as_ref(),
            &[0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
    }

    #[test]
    fn test_payload_limits() {
        assert!(matches!(
            encode_bit_payload(0, &[]),
            Err(ModbusError::InvalidData { .. })
        ));
        assert!(encode_register_payload(0, &[]).is_err());
        assert!(encode_bit_payload(0, &vec![true; MAX_WRITE_COILS]).is_ok());
        assert!(encode_bit_payload(0, &vec![true; MAX_WRITE_COILS + 1]).is_err());
        assert!(encode_register_payload(0, &vec![1; MAX_WRITE_REGISTERS]).is_ok());
        assert!(encode_register_payload(0, &vec![1; MAX_WRITE_REGISTERS + 1]).is_err());
    }

    proptest! {
        #[test]
        fn prop_bits_roundtrip(bits in proptest::collection::vec(any::<bool>(), 1..=2000)) {
            let frame = read_frame_unchecked(&pack_bits(&bits));
            prop_assert_eq!(decode_bits(&frame, bits.len()).unwrap(), bits);
        }

        #[test]
        fn prop_registers_roundtrip(regs in proptest::collection::vec(any::<u16>(), 1..=125)) {
            let frame = read_frame_unchecked(&registers_to_bytes(&regs));
            prop_assert_eq!(decode_registers(&frame, regs.len()).unwrap(), regs);
        }
    }

    // Byte count may exceed u8 for large bit vectors; decoding only looks at
    // the data section so the header bytes are placeholders.
    fn read_frame_unchecked(data: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; OFFSET_READ_DATA];
        frame.extend_from_slice(data);
        frame
    }
}
