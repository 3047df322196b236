//! Encoded write payloads always fit in a frame and carry a consistent count.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modbus_tcp_master::codec::{encode_bit_payload, encode_register_payload, unpack_bits};
use modbus_tcp_master::{FrameCodec, ModbusFunction, MAX_PDU_SIZE};

#[derive(Debug, Arbitrary)]
enum Input {
    Coils { address: u16, values: Vec<bool> },
    Registers { address: u16, values: Vec<u16> },
}

fuzz_target!(|input: Input| {
    let mut codec = FrameCodec::new();
    match input {
        Input::Coils { address, values } => {
            let Ok(payload) = encode_bit_payload(address, &values) else {
                return;
            };
            assert!(payload.len() < MAX_PDU_SIZE);
            if values.len() > 1 {
                let packed = &payload[5..];
                assert_eq!(unpack_bits(packed, values.len()), values);
            }
            let function = if values.len() == 1 {
                ModbusFunction::WriteSingleCoil
            } else {
                ModbusFunction::WriteMultipleCoils
            };
            assert!(codec.build_write_request(1, function, &payload).is_ok());
        }
        Input::Registers { address, values } => {
            let Ok(payload) = encode_register_payload(address, &values) else {
                return;
            };
            assert!(payload.len() < MAX_PDU_SIZE);
            let function = if values.len() == 1 {
                ModbusFunction::WriteSingleRegister
            } else {
                ModbusFunction::WriteMultipleRegisters
            };
            assert!(codec.build_write_request(1, function, &payload).is_ok());
        }
    }
});
