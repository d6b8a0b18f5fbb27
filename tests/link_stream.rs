//! End-to-end exercises of the serial link over an in-memory duplex
//! stream standing in for the MCU side of the wire.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use roverlink::protocol::{FrameParser, encode_frame};
use roverlink::{
    DataPacket, LinkConfig, LinkIo, Msg, ProtocolVersion, SerialLink, Tlv, TransportError,
    VariableRegistry, VariableType, VariableValue,
};

#[derive(Default)]
struct Pipe {
    buf: Mutex<VecDeque<u8>>,
    ready: Condvar,
}

impl Pipe {
    fn write(&self, bytes: &[u8]) {
        let mut guard = self.buf.lock().unwrap();
        guard.extend(bytes);
        self.ready.notify_all();
    }

    fn read(&self, out: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let mut guard = self.buf.lock().unwrap();
        if guard.is_empty() {
            let (next, _) = self.ready.wait_timeout(guard, timeout).unwrap();
            guard = next;
        }
        if guard.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        let n = out.len().min(guard.len());
        for slot in out.iter_mut().take(n) {
            *slot = guard.pop_front().unwrap();
        }
        Ok(n)
    }

    fn drain(&self) -> Vec<u8> {
        self.buf.lock().unwrap().drain(..).collect()
    }
}

/// One end of an in-memory duplex byte stream.
struct MemIo {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
}

impl LinkIo for MemIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.rx.read(buf, Duration::from_millis(10))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.tx.write(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn try_clone_io(&self) -> io::Result<Box<dyn LinkIo>> {
        Ok(Box::new(MemIo {
            rx: Arc::clone(&self.rx),
            tx: Arc::clone(&self.tx),
        }))
    }
}

/// Test-side handle onto the MCU end of the wire.
struct McuSide {
    to_host: Arc<Pipe>,
    from_host: Arc<Pipe>,
}

impl McuSide {
    fn inject(&self, bytes: &[u8]) {
        self.to_host.write(bytes);
    }

    fn sent_by_host(&self) -> Vec<u8> {
        self.from_host.drain()
    }
}

fn duplex() -> (Box<dyn LinkIo>, McuSide) {
    let to_host = Arc::new(Pipe::default());
    let from_host = Arc::new(Pipe::default());
    let host = MemIo {
        rx: Arc::clone(&to_host),
        tx: Arc::clone(&from_host),
    };
    (Box::new(host), McuSide { to_host, from_host })
}

fn registry() -> Arc<VariableRegistry> {
    Arc::new(
        VariableRegistry::build(
            &[
                ("arm_position", VariableType::U8),
                ("battery_mv", VariableType::U16Le),
                ("heading", VariableType::F32Le),
            ],
            ProtocolVersion::new(20250831120000),
        )
        .unwrap(),
    )
}

fn running_link() -> (SerialLink, McuSide, Arc<VariableRegistry>) {
    let registry = registry();
    let mut link = SerialLink::new(Arc::clone(&registry), LinkConfig::default());
    let (host_io, mcu) = duplex();
    link.attach(host_io).unwrap();
    link.start_receiving().unwrap();
    (link, mcu, registry)
}

fn telemetry_frame(registry: &VariableRegistry, name: &str, value: &[u8], seq: u8) -> Vec<u8> {
    let var = registry.get(name).unwrap();
    let mut packet = DataPacket::new(Msg::McuToPc, registry.version().short());
    packet.push(Tlv::new(var.id, value.to_vec()).unwrap());
    encode_frame(&packet.encode(), seq).unwrap()
}

#[test]
fn telemetry_reaches_waiter() {
    let (mut link, mcu, registry) = running_link();

    mcu.inject(&telemetry_frame(&registry, "battery_mv", &[0x10, 0x27], 0));

    let value = link
        .wait_for_value("battery_mv", Duration::from_secs(2))
        .unwrap();
    assert_eq!(value, VariableValue::Int(10_000));

    let latest = link.latest_frame().unwrap();
    assert!(!latest.raw_frame.is_empty());
    assert_eq!(latest.decoded.unwrap().msg, Msg::McuToPc);
    link.close();
}

#[test]
fn fragmented_delivery_matches_whole() {
    let (mut link, mcu, registry) = running_link();

    let frame = telemetry_frame(&registry, "arm_position", &[42], 3);
    for byte in &frame {
        mcu.inject(std::slice::from_ref(byte));
    }

    let value = link
        .wait_for_value("arm_position", Duration::from_secs(2))
        .unwrap();
    assert_eq!(value, VariableValue::Int(42));
    link.close();
}

#[test]
fn send_kv_produces_one_frame_per_call() {
    let (mut link, mcu, registry) = running_link();

    link.send_kv([
        ("arm_position", VariableValue::Int(5)),
        ("heading", VariableValue::Float(1.5)),
    ])
    .unwrap();

    // Give the pipe a moment; writes are synchronous but cheap to wait on.
    let deadline = Instant::now() + Duration::from_secs(1);
    let mut wire = Vec::new();
    while wire.is_empty() && Instant::now() < deadline {
        wire = mcu.sent_by_host();
        std::thread::sleep(Duration::from_millis(5));
    }

    let mut parser = FrameParser::new();
    parser.push(&wire);
    let frame = parser.next_frame().expect("host sent a complete frame");
    assert!(parser.next_frame().is_none());

    let packet = DataPacket::decode(&frame.data).unwrap();
    assert_eq!(packet.msg, Msg::PcToMcu);
    assert_eq!(packet.ver, registry.version().short());
    assert_eq!(packet.tlvs.len(), 2);

    let arm = registry.get("arm_position").unwrap();
    assert_eq!(packet.find(arm.id).unwrap().value, vec![5]);
    let heading = registry.get("heading").unwrap();
    assert_eq!(
        packet.find(heading.id).unwrap().value,
        1.5f32.to_le_bytes().to_vec()
    );
    link.close();
}

#[test]
fn corrupted_frame_does_not_break_the_link() {
    let (mut link, mcu, registry) = running_link();

    mcu.inject(&telemetry_frame(&registry, "arm_position", &[1], 0));
    link.wait_for_value("arm_position", Duration::from_secs(2))
        .unwrap();

    let mut corrupt = telemetry_frame(&registry, "arm_position", &[2], 1);
    corrupt[6] ^= 0xFF;
    mcu.inject(&corrupt);
    mcu.inject(&telemetry_frame(&registry, "arm_position", &[3], 2));

    link.wait_for_ack(
        "arm_position",
        &VariableValue::Int(3),
        Some(Duration::from_secs(2)),
    )
    .unwrap();
    link.close();
}

#[test]
fn stale_value_is_not_an_ack() {
    let (mut link, mcu, registry) = running_link();

    mcu.inject(&telemetry_frame(&registry, "arm_position", &[7], 0));
    link.wait_for_value("arm_position", Duration::from_secs(2))
        .unwrap();

    // The expected value was already in the slot before the "request";
    // no new update arrives, so the ack must time out.
    let result = link.wait_for_ack(
        "arm_position",
        &VariableValue::Int(7),
        Some(Duration::from_millis(200)),
    );
    assert!(matches!(result, Err(TransportError::Timeout)));
    link.close();
}

#[test]
fn chunk_tap_sees_unframed_bytes() {
    let registry = registry();
    let mut link = SerialLink::new(Arc::clone(&registry), LinkConfig::default());
    let (host_io, mcu) = duplex();
    link.attach(host_io).unwrap();

    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    link.set_chunk_tap(move |chunk| sink.lock().unwrap().extend_from_slice(chunk));
    link.start_receiving().unwrap();

    let garbage = [0xDE, 0xAD, 0xBE, 0xEF];
    mcu.inject(&garbage);

    let deadline = Instant::now() + Duration::from_secs(2);
    while seen.lock().unwrap().len() < garbage.len() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(*seen.lock().unwrap(), garbage.to_vec());
    link.close();
}

#[test]
fn stop_and_close_are_bounded() {
    let (mut link, _mcu, _registry) = running_link();
    assert!(link.is_receiving());

    let started = Instant::now();
    link.stop_receiving();
    assert!(!link.is_receiving());
    assert!(started.elapsed() < Duration::from_secs(2));

    link.close();
    assert!(matches!(
        link.send_kv([("arm_position", VariableValue::Int(1))]),
        Err(TransportError::NotConnected)
    ));
}

#[test]
fn lifecycle_misuse_is_reported() {
    let registry = registry();
    let mut link = SerialLink::new(registry, LinkConfig::default());

    assert!(matches!(
        link.start_receiving(),
        Err(TransportError::NotConnected)
    ));
    assert!(matches!(
        link.send_raw(&[0x00]),
        Err(TransportError::NotConnected)
    ));

    let (host_io, _mcu) = duplex();
    link.attach(host_io).unwrap();
    link.start_receiving().unwrap();
    assert!(matches!(
        link.start_receiving(),
        Err(TransportError::ReceiverAlreadyRunning)
    ));
    link.close();
}

#[test]
fn unknown_variable_is_rejected() {
    let (mut link, _mcu, _registry) = running_link();
    assert!(matches!(
        link.send_kv([("no_such_var", VariableValue::Int(1))]),
        Err(TransportError::UnknownVariable { .. })
    ));
    assert!(matches!(
        link.wait_for_value("no_such_var", Duration::from_millis(10)),
        Err(TransportError::UnknownVariable { .. })
    ));
    link.close();
}
