//! Arbitrary bytes fed to response validation and decoding must never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modbus_tcp_master::codec::{decode_bits, decode_registers};
use modbus_tcp_master::{FrameCodec, ModbusFunction};

#[derive(Debug, Arbitrary)]
struct Input {
    function: u8,
    quantity: u16,
    response: Vec<u8>,
    sent_payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let Ok(function) = ModbusFunction::from_u8(input.function) else {
        return;
    };

    let mut codec = FrameCodec::new();
    if function.is_read_function() {
        codec.build_read_request(1, function, 0, input.quantity);
        if codec.try_validate_read_response(&input.response, function).is_ok() {
            let count = usize::from(input.quantity);
            let _ = if function.is_bit_function() {
                decode_bits(&input.response, count).map(|v| v.len())
            } else {
                decode_registers(&input.response, count).map(|v| v.len())
            };
        }
    } else if codec
        .build_write_request(1, function, &input.sent_payload)
        .is_ok()
    {
        let _ = codec.try_validate_write_response(&input.response, function, &input.sent_payload);
    }
});
