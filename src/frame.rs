//! MBAP frame construction and response validation
//!
//! A [`FrameCodec`] belongs to exactly one client. It stamps each request with
//! the next transaction id and checks that the response answers *that*
//! request, so a late reply to an earlier, timed-out request is rejected
//! rather than decoded.
//!
//! Read responses are checked in a fixed order and the first failure wins:
//!
//! 1. at least 9 bytes (MBAP + function code + byte count)
//! 2. transaction id equals the last one issued
//! 3. function code is the request code (or its `| 0x80` exception form)
//! 4. byte count + 9 equals the frame length

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::constants::{
    EXCEPTION_FLAG, MBAP_HEADER_LEN, MODBUS_PROTOCOL_ID, OFFSET_FUNCTION, OFFSET_PDU_DATA,
    OFFSET_TRANSACTION_ID, READ_REQUEST_LEN, READ_REQUEST_MBAP_LENGTH, READ_RESPONSE_HEADER_LEN,
    WRITE_ECHO_LEN,
};
use crate::error::{ModbusError, ModbusResult};
use crate::pdu::{ModbusPdu, PduBuilder};
use crate::protocol::{ModbusFunction, SlaveId, TransactionId};

/// How far behind the current transaction id a reply may be and still count as stale
const STALE_WINDOW: u16 = 0x7FFF;

/// Builds request frames and validates their responses
#[derive(Debug, Default)]
pub struct FrameCodec {
    transaction_id: TransactionId,
}

impl FrameCodec {
    /// A fresh codec; its first request carries transaction id 1
    pub fn new() -> Self {
        Self { transaction_id: 0 }
    }

    /// Id stamped on the most recently built request
    #[inline]
    pub fn current_transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Whether `response` answers a request issued before the current one.
    ///
    /// Ids are compared modulo 2^16: anything up to half the id space behind
    /// the current id counts as stale. Such a frame is a late reply to a
    /// timed-out or cancelled request and can be dropped without failing the
    /// current exchange.
    pub fn is_stale_response(&self, response: &[u8]) -> bool {
        if response.len() < OFFSET_TRANSACTION_ID + 2 {
            return false;
        }
        let tid = u16::from_be_bytes([
            response[OFFSET_TRANSACTION_ID],
            response[OFFSET_TRANSACTION_ID + 1],
        ]);
        let behind = self.transaction_id.wrapping_sub(tid);
        behind != 0 && behind <= STALE_WINDOW
    }

    fn next_transaction_id(&mut self) -> TransactionId {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }

    /// Build the 12-byte request for FC01-FC04.
    ///
    /// `quantity` is not range-checked; devices answer out-of-range reads
    /// with an illegal-data-value exception.
    pub fn build_read_request(
        &mut self,
        unit_id: SlaveId,
        function: ModbusFunction,
        start_address: u16,
        quantity: u16,
    ) -> Bytes {
        let tid = self.next_transaction_id();
        let mut frame = BytesMut::with_capacity(READ_REQUEST_LEN);
        frame.put_u16(tid);
        frame.put_u16(MODBUS_PROTOCOL_ID);
        frame.put_u16(READ_REQUEST_MBAP_LENGTH);
        frame.put_u8(unit_id);
        frame.put_u8(function.to_u8());
        frame.put_u16(start_address);
        frame.put_u16(quantity);

        debug!(
            "Built read request: tid={}, unit={}, fc=0x{:02X}, start={}, qty={}",
            tid,
            unit_id,
            function.to_u8(),
            start_address,
            quantity
        );
        frame.freeze()
    }

    /// Wrap a pre-encoded write payload (see [`crate::codec`]) in a frame.
    ///
    /// Fails without consuming a transaction id when the PDU would exceed
    /// 253 bytes.
    pub fn build_write_request(
        &mut self,
        unit_id: SlaveId,
        function: ModbusFunction,
        payload: &[u8],
    ) -> ModbusResult<Bytes> {
        let pdu = PduBuilder::new()
            .function_code(function.to_u8())?
            .data(payload)?
            .build();

        let tid = self.next_transaction_id();
        let frame = Self::wrap(tid, unit_id, &pdu);
        debug!(
            "Built write request: tid={}, unit={}, fc=0x{:02X}, payload_len={}",
            tid,
            unit_id,
            function.to_u8(),
            payload.len()
        );
        Ok(frame)
    }

    fn wrap(tid: TransactionId, unit_id: SlaveId, pdu: &ModbusPdu) -> Bytes {
        let mut frame = BytesMut::with_capacity(MBAP_HEADER_LEN + 1 + pdu.len());
        frame.put_u16(tid);
        frame.put_u16(MODBUS_PROTOCOL_ID);
        frame.put_u16((1 + pdu.len()) as u16);
        frame.put_u8(unit_id);
        frame.put_slice(pdu.as_slice());
        frame.freeze()
    }

    /// Validate a response to the last read request
    pub fn try_validate_read_response(
        &self,
        response: &[u8],
        expected: ModbusFunction,
    ) -> ModbusResult<()> {
        self.check_header(response, expected)?;

        let byte_count = response[OFFSET_PDU_DATA] as usize;
        let implied = READ_RESPONSE_HEADER_LEN + byte_count;
        if implied != response.len() {
            warn!(
                "Byte count {} implies {} bytes, frame has {}",
                byte_count,
                implied,
                response.len()
            );
            return Err(ModbusError::LengthByteCountMismatch {
                expected: implied,
                actual: response.len(),
            });
        }
        Ok(())
    }

    /// Validate a response to the last write request.
    ///
    /// FC05/FC06 must echo the sent address and value; FC15/FC16 must echo
    /// the address and count. `sent_payload` is the payload given to
    /// [`build_write_request`](Self::build_write_request).
    pub fn try_validate_write_response(
        &self,
        response: &[u8],
        function: ModbusFunction,
        sent_payload: &[u8],
    ) -> ModbusResult<()> {
        self.check_header(response, function)?;

        let echo_end = OFFSET_PDU_DATA + WRITE_ECHO_LEN;
        if response.len() < echo_end {
            return Err(ModbusError::FrameTooShort {
                expected: echo_end,
                actual: response.len(),
            });
        }

        let echoed = &response[OFFSET_PDU_DATA..echo_end];
        let expected = &sent_payload[..WRITE_ECHO_LEN.min(sent_payload.len())];
        if echoed != expected {
            warn!(
                "Write echo mismatch for fc=0x{:02X}: sent {:02X?}, echoed {:02X?}",
                function.to_u8(),
                expected,
                echoed
            );
            return Err(ModbusError::WriteEchoMismatch {
                function: function.to_u8(),
                expected: expected.to_vec(),
                actual: echoed.to_vec(),
            });
        }
        Ok(())
    }

    /// Length, transaction id and function code checks shared by reads and writes
    fn check_header(&self, response: &[u8], expected: ModbusFunction) -> ModbusResult<()> {
        if response.len() < READ_RESPONSE_HEADER_LEN {
            return Err(ModbusError::FrameTooShort {
                expected: READ_RESPONSE_HEADER_LEN,
                actual: response.len(),
            });
        }

        let tid = u16::from_be_bytes([
            response[OFFSET_TRANSACTION_ID],
            response[OFFSET_TRANSACTION_ID + 1],
        ]);
        if tid != self.transaction_id {
            warn!(
                "Transaction id mismatch: expected {}, got {}",
                self.transaction_id, tid
            );
            return Err(ModbusError::TransactionMismatch {
                expected: self.transaction_id,
                actual: tid,
            });
        }

        let fc = response[OFFSET_FUNCTION];
        if fc == expected.to_u8() | EXCEPTION_FLAG {
            let code = response[OFFSET_PDU_DATA];
            debug!(
                "Device exception: fc=0x{:02X}, code=0x{:02X}",
                expected.to_u8(),
                code
            );
            return Err(ModbusError::DeviceException {
                function: expected.to_u8(),
                code,
            });
        }
        if fc != expected.to_u8() {
            return Err(ModbusError::FunctionCodeMismatch {
                expected: expected.to_u8(),
                actual: fc,
            });
        }
        Ok(())
    }
}
