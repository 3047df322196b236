//! Packet tracing helpers
//!
//! The crate only emits `tracing` events; installing a subscriber is left to
//! the application.

use tracing::info;

/// Format bytes as space-separated uppercase hex
pub fn format_hex_packet(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emit one raw frame at info level
pub fn log_packet(direction: &str, data: &[u8], unit_id: Option<u8>) {
    let hex = format_hex_packet(data);
    match unit_id {
        Some(id) => info!("[MODBUS-TCP] {} unit:{} {}", direction, id, hex),
        None => info!("[MODBUS-TCP] {} {}", direction, hex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex_packet() {
        assert_eq!(format_hex_packet(&[0x00, 0x01, 0xAB, 0xFF]), "00 01 AB FF");
        assert_eq!(format_hex_packet(&[]), "");
    }
}
