//! Integration tests for serimux.
//!
//! These drive two [`Link`]s over crossed in-memory queues — one "device"
//! and one "host" end of a cable — and exercise the full paths: framing,
//! CRC, interleaved generic data, wrap-around, and error recovery.

use serde::{Deserialize, Serialize};
use serimux::{
    ByteQueue, Link, LinkConfig, MemoryPort, OverwritePolicy, ReadError, SendError, WireObject,
};

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct Reading {
    id: i32,
    value: f32,
}

impl WireObject for Reading {
    const OBJECT_ID: i16 = 1;
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct NamedEvent {
    uuid: i32,
    name: String,
}

impl WireObject for NamedEvent {
    const OBJECT_ID: i16 = 2;
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct CalibrationReport {
    scale: f32,
    offsets: Vec<i32>,
    axes: [f64; 3],
}

impl WireObject for CalibrationReport {
    const OBJECT_ID: i16 = 3;
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct DeviceManifest {
    uuid: String,
    names: Vec<String>,
    channels: [Vec<i32>; 3],
}

impl WireObject for DeviceManifest {
    const OBJECT_ID: i16 = 4;
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct ManifestBundle {
    id: u16,
    manifests: Vec<DeviceManifest>,
    events: [NamedEvent; 3],
}

impl WireObject for ManifestBundle {
    const OBJECT_ID: i16 = 5;
}

/// Two links over crossed queues, plus the raw queues so tests can
/// corrupt, truncate, or inspect bytes in flight.
struct Harness {
    device: Link<MemoryPort>,
    host: Link<MemoryPort>,
    /// Bytes the device wrote, not yet ingested by the host.
    device_to_host: ByteQueue,
    /// Bytes the host wrote, not yet ingested by the device.
    #[allow(dead_code)]
    host_to_device: ByteQueue,
}

fn harness(buffer_capacity: usize, scratch_capacity: usize) -> Harness {
    let device_to_host = MemoryPort::queue();
    let host_to_device = MemoryPort::queue();
    let config = LinkConfig {
        buffer_capacity,
        scratch_capacity,
    };
    Harness {
        device: Link::with_config(
            MemoryPort::new(host_to_device.clone(), device_to_host.clone()),
            config.clone(),
        ),
        host: Link::with_config(
            MemoryPort::new(device_to_host.clone(), host_to_device.clone()),
            config,
        ),
        device_to_host,
        host_to_device,
    }
}

fn sample_manifest() -> DeviceManifest {
    DeviceManifest {
        uuid: "uuid-123".into(),
        names: vec!["name1".into(), "name2".into()],
        channels: [vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]],
    }
}

/// S1: a simple record crosses the link intact.
#[test]
fn test_simple_record_roundtrip() {
    let mut h = harness(256, 256);

    assert!(!h.host.has_object());
    assert_eq!(h.host.object_id(), None);

    h.device
        .send_object(&Reading { id: 42, value: 3.14 })
        .unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);

    assert!(h.host.has_object());
    assert_eq!(h.host.object_id(), Some(1));

    let reading: Reading = h.host.read_object().unwrap();
    assert_eq!(reading.id, 42);
    assert!((reading.value - 3.14).abs() < f32::EPSILON);

    assert!(!h.host.has_object());
    assert_eq!(h.host.object_id(), None);
}

/// S2: generic bytes queued ahead of a frame come out first.
#[test]
fn test_generic_byte_before_object() {
    let mut h = harness(256, 256);

    h.host.port().inject(b"A");
    h.device
        .send_object(&Reading { id: 7, value: 1.0 })
        .unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);

    assert_eq!(h.host.available(), 1);
    let mut byte = [0u8; 1];
    assert_eq!(h.host.read(&mut byte), 1);
    assert_eq!(byte[0], b'A');

    assert!(h.host.has_object());
    let reading: Reading = h.host.read_object().unwrap();
    assert_eq!(reading, Reading { id: 7, value: 1.0 });
}

/// Generic bytes arriving after a frame stay shadowed until the frame is
/// read.
#[test]
fn test_object_at_head_shadows_trailing_generic_data() {
    let mut h = harness(256, 256);

    h.device
        .send_object(&Reading { id: 47, value: 0.707 })
        .unwrap();
    h.host.port().inject(&[17]);
    h.host.ingest(OverwritePolicy::Overwrite);

    assert_eq!(h.host.available(), 0);
    assert!(h.host.has_object());
    let _: Reading = h.host.read_object().unwrap();
    assert_eq!(h.host.available(), 1);
}

/// S3 (full sequence): generic data, a corrupted frame, trailing junk.
/// The CRC error is reported exactly once and the junk is recoverable.
#[test]
fn test_crc_error_with_interleaved_generic_data() {
    let mut h = harness(128, 64);

    let generic: Vec<u8> = (b'A'..=b'Z').collect();
    h.host.port().inject(&generic);
    h.host.ingest(OverwritePolicy::Overwrite);
    assert_eq!(h.host.available(), 26);

    h.device
        .send_object(&CalibrationReport {
            scale: 3.14159,
            offsets: vec![1, 2, 3],
            axes: [4.0, 5.0, 6.0],
        })
        .unwrap();

    // Flip one payload byte in flight. The generic bytes were already
    // drained into the host buffer, so the queue holds only the frame and
    // its midpoint lands inside the payload.
    {
        let mut wire = h.device_to_host.lock().unwrap();
        let mid = wire.len() / 2;
        wire[mid] ^= 0x42;
    }
    h.host.port().inject(b"TE");
    h.host.ingest(OverwritePolicy::Overwrite);

    let mut drained = vec![0u8; 26];
    assert_eq!(h.host.read(&mut drained), 26);
    assert_eq!(drained, generic);

    assert!(h.host.has_object());
    assert_eq!(
        h.host.read_object::<CalibrationReport>().unwrap_err(),
        ReadError::CrcError
    );

    // The corrupt frame is gone; only the junk remains.
    assert!(!h.host.has_object());
    assert_eq!(h.host.available(), 2);
    let mut junk = [0u8; 2];
    h.host.read(&mut junk);
    assert_eq!(&junk, b"TE");
    assert_eq!(h.host.skip(16), 0);
}

/// S4: an ID mismatch retains the frame for the right reader.
#[test]
fn test_id_mismatch_leaves_frame_intact() {
    let mut h = harness(256, 256);

    h.device
        .send_object(&Reading { id: 1, value: 2.0 })
        .unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);

    assert_eq!(
        h.host.read_object::<NamedEvent>().unwrap_err(),
        ReadError::ObjectIdMismatch
    );

    // Caller can inspect the ID and dispatch correctly.
    assert_eq!(h.host.object_id(), Some(Reading::OBJECT_ID));
    let reading: Reading = h.host.read_object().unwrap();
    assert_eq!(reading, Reading { id: 1, value: 2.0 });
}

/// An unknown ID can be skipped without a type binding.
#[test]
fn test_skip_object_discards_unknown_frame() {
    let mut h = harness(256, 256);

    h.device
        .send_object(&NamedEvent {
            uuid: 9,
            name: "nobody expects it".into(),
        })
        .unwrap();
    h.device
        .send_object(&Reading { id: 3, value: 0.5 })
        .unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);

    assert_eq!(h.host.object_id(), Some(NamedEvent::OBJECT_ID));
    h.host.skip_object().unwrap();

    let reading: Reading = h.host.read_object().unwrap();
    assert_eq!(reading, Reading { id: 3, value: 0.5 });
}

/// S5: frames that straddle the ring wrap decode like contiguous ones.
#[test]
fn test_wrap_crossing_frame_decodes() {
    // A Reading frame is 16 bytes; pre-filling 25..=31 bytes of noise into
    // a 32-byte ring walks every header field across the wrap boundary.
    for prefill in 25..=31 {
        let mut h = harness(32, 32);

        h.host.port().inject(&vec![0xFF; prefill]);
        h.host.ingest(OverwritePolicy::Overwrite);
        assert!(h.host.available() > 0);

        h.device
            .send_object(&Reading {
                id: 43,
                value: 2.71,
            })
            .unwrap();
        h.host.ingest(OverwritePolicy::Overwrite);

        // Drain the noise (possibly in two passes once the ring filled).
        while !h.host.has_object() {
            assert!(h.host.skip_all() > 0, "prefill {prefill}: no progress");
        }

        let reading: Reading = h.host.read_object().unwrap();
        assert_eq!(
            reading,
            Reading {
                id: 43,
                value: 2.71
            },
            "prefill {prefill}"
        );
    }
}

/// Zero-length reads are a no-op even with data pending.
#[test]
fn test_zero_length_read() {
    let mut h = harness(32, 32);
    h.host.port().inject(&[0xFF; 10]);
    h.host.ingest(OverwritePolicy::Overwrite);

    let mut empty = [0u8; 0];
    assert_eq!(h.host.read(&mut empty), 0);
    assert_eq!(h.host.available(), 10);
}

/// Four buffers of noise ahead of one frame, skipped in a loop.
#[test]
fn test_skip_loop_through_heavy_noise() {
    let mut h = harness(32, 32);

    h.host.port().inject(&[0xFF; 96]);
    h.host.ingest(OverwritePolicy::Overwrite);
    h.device
        .send_object(&Reading {
            id: 46,
            value: 0.618,
        })
        .unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);

    for _ in 0..3 {
        assert!(!h.host.has_object());
        h.host.skip_all();
    }
    assert!(h.host.has_object());
    let reading: Reading = h.host.read_object().unwrap();
    assert_eq!(reading.id, 46);
}

/// S6: a frame that cannot fit the scratch buffer is rejected before any
/// byte reaches the port.
#[test]
fn test_too_large_object_rejected() {
    let mut h = harness(512, 128);

    let oversized = CalibrationReport {
        scale: 1.0,
        offsets: (0..40).collect(),
        axes: [0.0; 3],
    };
    assert_eq!(
        h.device.send_object(&oversized).unwrap_err(),
        SendError::ObjectTooLarge
    );
    assert_eq!(h.device_to_host.lock().unwrap().len(), 0);

    // The same link still sends frames that fit.
    h.device
        .send_object(&Reading { id: 1, value: 1.0 })
        .unwrap();
    assert!(!h.device_to_host.lock().unwrap().is_empty());
}

/// A port-level write failure surfaces as `WriteError` and is not fatal
/// to the link.
#[test]
fn test_write_failure_is_reported() {
    let mut h = harness(256, 256);

    h.device.port().set_fail_writes(true);
    assert_eq!(
        h.device
            .send_object(&Reading { id: 1, value: 1.0 })
            .unwrap_err(),
        SendError::WriteFailed
    );

    h.device.port().set_fail_writes(false);
    h.device
        .send_object(&Reading { id: 1, value: 1.0 })
        .unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);
    assert!(h.host.read_object::<Reading>().is_ok());
}

/// A truncated frame reports `NotEnoughData` until the missing byte
/// arrives; a wrong final byte then fails the CRC.
#[test]
fn test_truncated_then_patched_frame() {
    let mut h = harness(128, 128);

    h.device
        .send_object(&CalibrationReport {
            scale: 3.14159,
            offsets: vec![1, 2, 3],
            axes: [4.0, 5.0, 6.0],
        })
        .unwrap();

    // Drop the frame's last byte in flight.
    let dropped = h.device_to_host.lock().unwrap().pop_back().unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);

    assert!(h.host.has_object());
    assert_eq!(
        h.host.read_object::<CalibrationReport>().unwrap_err(),
        ReadError::NotEnoughData
    );

    // Supply a wrong last byte: the frame completes but the CRC fails.
    h.host.port().inject(&[dropped ^ 0xFF]);
    assert_eq!(
        h.host.read_object::<CalibrationReport>().unwrap_err(),
        ReadError::CrcError
    );
    assert!(!h.host.has_object());
}

/// Plain noise is never mistaken for an object.
#[test]
fn test_noise_is_generic_data() {
    let mut h = harness(128, 128);

    h.host.port().inject(&[0x01, 0x02, 0x03, 0x04]);
    h.host.ingest(OverwritePolicy::Overwrite);

    assert!(!h.host.has_object());
    assert_eq!(
        h.host.read_object::<Reading>().unwrap_err(),
        ReadError::NoObjectAvailable
    );
    assert_eq!(h.host.skip(4), 4);
    assert_eq!(h.host.available(), 0);
}

/// Frames sent in order arrive in order, interleaved types included.
#[test]
fn test_ordering_across_types() {
    let mut h = harness(1024, 512);

    for i in 0..5i32 {
        h.device
            .send_object(&Reading {
                id: i,
                value: i as f32,
            })
            .unwrap();
        h.device
            .send_object(&NamedEvent {
                uuid: i,
                name: format!("event-{i}"),
            })
            .unwrap();
    }
    h.host.ingest(OverwritePolicy::Overwrite);

    for i in 0..5i32 {
        let reading: Reading = h.host.read_object().unwrap();
        assert_eq!(reading.id, i);
        let event: NamedEvent = h.host.read_object().unwrap();
        assert_eq!(event.uuid, i);
        assert_eq!(event.name, format!("event-{i}"));
    }
    assert!(!h.host.has_object());
}

/// Records with strings, sequences, and nesting survive the link.
#[test]
fn test_structured_records_roundtrip() {
    let mut h = harness(1024, 512);

    let event = NamedEvent {
        uuid: 123,
        name: "TestName".into(),
    };
    h.device.send_object(&event).unwrap();

    let report = CalibrationReport {
        scale: 3.14159,
        offsets: vec![1, 2, 3],
        axes: [4.0, 5.0, 6.0],
    };
    h.device.send_object(&report).unwrap();

    let manifest = sample_manifest();
    h.device.send_object(&manifest).unwrap();

    h.host.ingest(OverwritePolicy::Overwrite);
    assert_eq!(h.host.read_object::<NamedEvent>().unwrap(), event);
    assert_eq!(h.host.read_object::<CalibrationReport>().unwrap(), report);
    assert_eq!(h.host.read_object::<DeviceManifest>().unwrap(), manifest);
}

/// Deeply nested records: sequences of records holding fixed arrays of
/// records holding sequences.
#[test]
fn test_nested_record_bundle_roundtrip() {
    let mut h = harness(2048, 1024);

    let bundle = ManifestBundle {
        id: 456,
        manifests: vec![
            DeviceManifest {
                uuid: "uuid-456".into(),
                names: vec!["nameA".into(), "nameB".into()],
                channels: [vec![10, 11], vec![12, 13], vec![14, 15]],
            },
            DeviceManifest {
                uuid: "uuid-789".into(),
                names: vec!["nameC".into()],
                channels: [vec![16, 17, 18], vec![], vec![]],
            },
        ],
        events: [
            NamedEvent {
                uuid: 789,
                name: "Object1".into(),
            },
            NamedEvent {
                uuid: 101112,
                name: "Object2".into(),
            },
            NamedEvent {
                uuid: 131415,
                name: "Object3".into(),
            },
        ],
    };

    h.device.send_object(&bundle).unwrap();
    h.host.ingest(OverwritePolicy::Overwrite);
    assert_eq!(h.host.read_object::<ManifestBundle>().unwrap(), bundle);
    assert!(!h.host.has_object());
}

/// The emitted wire bytes match the specified layout exactly.
#[test]
fn test_wire_layout_of_sent_frame() {
    use serimux::protocol::{crc16, FRAME_OVERHEAD, HEADER_SIZE};

    let mut h = harness(256, 256);
    h.device
        .send_object(&Reading { id: 42, value: 3.14 })
        .unwrap();

    let wire: Vec<u8> = h.device_to_host.lock().unwrap().iter().copied().collect();

    // Marker, ID (LE), payload length (LE).
    assert_eq!(wire[0], 0x02);
    assert_eq!(wire[1], 0x42);
    assert_eq!(
        i16::from_le_bytes([wire[2], wire[3]]),
        Reading::OBJECT_ID
    );
    let payload_len = u16::from_le_bytes([wire[4], wire[5]]) as usize;
    assert_eq!(payload_len, 8);
    assert_eq!(wire.len(), FRAME_OVERHEAD + payload_len);

    // Payload: i32 then f32, little-endian.
    assert_eq!(&wire[6..10], &42i32.to_le_bytes());
    assert_eq!(&wire[10..14], &3.14f32.to_le_bytes());

    // Trailer: CRC-16 over everything before it.
    let crc_offset = HEADER_SIZE + payload_len;
    let stored = u16::from_le_bytes([wire[crc_offset], wire[crc_offset + 1]]);
    assert_eq!(stored, crc16(&wire[..crc_offset]));
}

/// Buffer bookkeeping stays within bounds across a mixed workload.
#[test]
fn test_buffer_invariants_under_mixed_traffic() {
    let mut h = harness(64, 64);

    for round in 0..8 {
        h.host.port().inject(&vec![b'x'; 7]);
        h.device
            .send_object(&Reading {
                id: round,
                value: 0.0,
            })
            .unwrap();
        h.host.ingest(OverwritePolicy::Overwrite);

        assert!(h.host.buffered_len() <= h.host.capacity());
        if h.host.has_object() {
            assert_eq!(h.host.available(), 0);
        }

        let mut sink = [0u8; 16];
        while h.host.available() > 0 {
            h.host.read(&mut sink);
        }
        while h.host.has_object() {
            let _: Reading = h.host.read_object().unwrap();
        }
        assert!(h.host.buffered_len() <= h.host.capacity());
    }
    assert_eq!(h.host.buffered_len(), 0);
}
