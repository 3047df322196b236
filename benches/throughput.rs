//! Frame codec and payload decoding throughput
//!
//! Run with: cargo bench --bench throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modbus_tcp_master::codec::{decode_bits, decode_registers, encode_bit_payload, encode_register_payload};
use modbus_tcp_master::{
    ByteOrder, ConverterRegistry, FieldConverter, FieldFormat, FrameCodec, ModbusFunction,
    TypeConverter,
};

/// Read response for the codec's last request carrying `data`
fn read_response(codec: &FrameCodec, function: ModbusFunction, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(9 + data.len());
    frame.extend_from_slice(&codec.current_transaction_id().to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.extend_from_slice(&((3 + data.len()) as u16).to_be_bytes());
    frame.push(0x01);
    frame.push(function.to_u8());
    frame.push(data.len() as u8);
    frame.extend_from_slice(data);
    frame
}

fn bench_build_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_request");
    let mut codec = FrameCodec::new();

    group.bench_function("read_holding_registers", |b| {
        b.iter(|| {
            codec.build_read_request(
                black_box(1),
                ModbusFunction::ReadHoldingRegisters,
                black_box(100),
                black_box(10),
            )
        })
    });

    let payload = encode_register_payload(0, &[0xABCD; 100]).unwrap();
    group.bench_function("write_100_registers", |b| {
        b.iter(|| {
            codec
                .build_write_request(black_box(1), ModbusFunction::WriteMultipleRegisters, &payload)
                .unwrap()
        })
    });

    group.finish();
}

fn bench_validate_and_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_decode");
    let mut codec = FrameCodec::new();
    codec.build_read_request(1, ModbusFunction::ReadHoldingRegisters, 0, 125);

    for count in [1usize, 10, 125] {
        let data: Vec<u8> = (0..count * 2).map(|i| i as u8).collect();
        let response = read_response(&codec, ModbusFunction::ReadHoldingRegisters, &data);
        group.throughput(Throughput::Bytes(response.len() as u64));
        group.bench_with_input(BenchmarkId::new("registers", count), &response, |b, resp| {
            b.iter(|| {
                codec
                    .try_validate_read_response(black_box(resp), ModbusFunction::ReadHoldingRegisters)
                    .unwrap();
                decode_registers(resp, count).unwrap()
            })
        });
    }

    let bits = vec![0xA5u8; 250];
    let response = read_response(&codec, ModbusFunction::ReadCoils, &bits);
    group.bench_function("coils_2000", |b| {
        b.iter(|| {
            codec
                .try_validate_read_response(black_box(&response), ModbusFunction::ReadCoils)
                .unwrap();
            decode_bits(&response, 2000).unwrap()
        })
    });

    group.finish();
}

fn bench_encode_payloads(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_payload");
    let coils: Vec<bool> = (0..1968).map(|i| i % 3 == 0).collect();
    let registers: Vec<u16> = (0..123).collect();

    group.bench_function("coils_1968", |b| {
        b.iter(|| encode_bit_payload(black_box(0), black_box(&coils)).unwrap())
    });
    group.bench_function("registers_123", |b| {
        b.iter(|| encode_register_payload(black_box(0), black_box(&registers)).unwrap())
    });

    group.finish();
}

#[derive(Default)]
struct Sample {
    voltage: f32,
    current: f32,
    energy: u64,
}

fn bench_structured_decode(c: &mut Criterion) {
    let mut registry = ConverterRegistry::new();
    registry.register(
        TypeConverter::<Sample>::new()
            .with_field(FieldConverter::new("voltage", 0, 4, FieldFormat::F32, |s: &mut Sample, v| {
                s.voltage = v.as_f64().unwrap_or_default() as f32
            }))
            .with_field(
                FieldConverter::new("current", 4, 4, FieldFormat::F32, |s: &mut Sample, v| {
                    s.current = v.as_f64().unwrap_or_default() as f32
                })
                .with_byte_order(ByteOrder::BigEndianSwap),
            )
            .with_field(FieldConverter::new("energy", 8, 8, FieldFormat::U64, |s: &mut Sample, v| {
                s.energy = v.as_i64().unwrap_or_default() as u64
            })),
    );
    let payload: Vec<u8> = (0..16).collect();

    c.bench_function("convert_sample", |b| {
        b.iter(|| registry.convert::<Sample>(black_box(&payload)))
    });
}

criterion_group!(
    benches,
    bench_build_requests,
    bench_validate_and_decode,
    bench_encode_payloads,
    bench_structured_decode
);
criterion_main!(benches);
