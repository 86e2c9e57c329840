//! Loopback demo: one "device" and one "host" sharing an in-memory cable.
//!
//! The device interleaves human-readable log text with typed status
//! frames, the way embedded firmware mixes `printf` debugging with
//! structured telemetry on the same UART. The host pulls both apart.
//!
//! Run with: `cargo run --example loopback`

use serde::{Deserialize, Serialize};
use serimux::{Link, MemoryPort, OverwritePolicy, ReadError, SerialPort, WireObject};

#[derive(Serialize, Deserialize, Debug)]
struct Status {
    uptime_ms: u64,
    rssi: f32,
    errors: u16,
}

impl WireObject for Status {
    const OBJECT_ID: i16 = 1;
}

#[derive(Serialize, Deserialize, Debug)]
struct Sample {
    channel: u8,
    values: Vec<i16>,
}

impl WireObject for Sample {
    const OBJECT_ID: i16 = 2;
}

fn main() {
    let (device_port, host_port) = MemoryPort::pair();
    let mut device = Link::new(device_port);
    let mut host = Link::new(host_port);

    // Device side: free-form log lines mixed with framed objects.
    device.port_mut().write(b"boot: radio up\n");
    device
        .send_object(&Status {
            uptime_ms: 1378,
            rssi: -71.5,
            errors: 0,
        })
        .unwrap();
    device.port_mut().write(b"calibrating...\n");
    device
        .send_object(&Sample {
            channel: 3,
            values: vec![108, 112, 97],
        })
        .unwrap();
    device.port_mut().write(b"ready\n");

    // Host side: a typical poll loop.
    let mut text = Vec::new();
    loop {
        host.ingest(OverwritePolicy::Overwrite);

        let mut chunk = [0u8; 64];
        loop {
            let n = host.read(&mut chunk);
            if n == 0 {
                break;
            }
            text.extend_from_slice(&chunk[..n]);
        }

        while host.has_object() {
            match host.object_id() {
                Some(Status::OBJECT_ID) => match host.read_object::<Status>() {
                    Ok(status) => println!("status: {status:?}"),
                    Err(ReadError::NotEnoughData) => break,
                    Err(err) => println!("status frame rejected: {err}"),
                },
                Some(Sample::OBJECT_ID) => match host.read_object::<Sample>() {
                    Ok(sample) => println!("sample: {sample:?}"),
                    Err(ReadError::NotEnoughData) => break,
                    Err(err) => println!("sample frame rejected: {err}"),
                },
                _ => {
                    // Unknown ID: drop the frame rather than wedge on it.
                    let _ = host.skip_object();
                }
            }
        }

        if host.port().bytes_available() == 0 && host.buffered_len() == 0 {
            break;
        }
    }

    print!("device log:\n{}", String::from_utf8_lossy(&text));
}
