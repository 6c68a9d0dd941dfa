mod common;

use std::time::Instant;

use common::{frame, MockSerial};
use egismos_nostd_rs::{Config, Error, Failure, FrameError, Laser, Mismatch};
use embassy_time::Duration;
use embedded_io::ErrorKind;

fn laser(serial: MockSerial) -> Laser<MockSerial> {
    Laser::new(serial, Config::default().timeout(Duration::from_millis(50)))
}

#[test]
fn measure_returns_millimetres() {
    let mut laser = laser(MockSerial::new().reply(&frame(0x44, 0x01, b"1234")));
    assert_eq!(laser.measure(), Ok(1234));

    let serial = laser.release();
    assert_eq!(serial.written, [0xAA, 0x01, 0x44, 0x45, 0xA8]);
}

#[test]
fn distance_is_in_centimetres() {
    let mut laser = laser(MockSerial::new().reply(&frame(0x44, 0x01, b"1234")));
    let distance = laser.distance().unwrap();
    assert!((distance - 123.4).abs() < 1e-4);
}

#[test]
fn measurement_error_codes() {
    let cases: [(&[u8], Error<ErrorKind>); 4] = [
        (b"ERR256", Error::TooBright),
        (b"ERR255", Error::TooDim),
        (b"ERR204", Error::BadReading),
        (b"12O4", Error::CommandFailed(Failure::Garbled)),
    ];
    for (payload, expected) in cases {
        let mut laser = laser(MockSerial::new().reply(&frame(0x44, 0x01, payload)));
        assert_eq!(laser.measure(), Err(expected));
    }
}

#[test]
fn acknowledged_commands_succeed() {
    let serial = MockSerial::new()
        .reply(&frame(0x42, 0x01, &[0x01]))
        .reply(&frame(0x43, 0x01, &[0x01]))
        .reply(&frame(0x47, 0x01, &[0x01]))
        .reply(&frame(0x46, 0x01, &[0x01]));
    let mut laser = laser(serial);

    laser.set_laser(true).unwrap();
    laser.set_laser(false).unwrap();
    laser.set_buzzer(true).unwrap();
    laser.stop_measuring().unwrap();

    let written = laser.release().written;
    assert_eq!(&written[..5], &[0xAA, 0x01, 0x42, 0x43, 0xA8]);
    assert_eq!(&written[5..10], &[0xAA, 0x01, 0x43, 0x44, 0xA8]);
    assert_eq!(&written[10..16], &[0xAA, 0x01, 0x47, 0x01, 0x49, 0xA8]);
}

#[test]
fn missing_ack_is_command_failure() {
    let serial = MockSerial::new()
        .reply(&frame(0x42, 0x01, &[0x00]))
        .reply(&frame(0x42, 0x01, &[]));
    let mut laser = laser(serial);

    let failed = Err(Error::CommandFailed(Failure::NotAcknowledged(0x42)));
    assert_eq!(laser.set_laser(true), failed);
    assert_eq!(laser.set_laser(true), failed);
}

#[test]
fn slave_address_changes_only_after_ack() {
    let serial = MockSerial::new()
        .reply(&frame(0x41, 0x01, &[0x00]))
        .reply(&frame(0x41, 0x01, &[0x01]))
        .reply(&frame(0x44, 0x05, b"250"));
    let mut laser = laser(serial);

    assert!(laser.set_slave_address(0x05).is_err());
    assert_eq!(laser.address(), 0x01);

    laser.set_slave_address(0x05).unwrap();
    assert_eq!(laser.address(), 0x05);

    assert_eq!(laser.measure(), Ok(250));
    let written = laser.release().written;
    // Both address requests go to the old address, the measurement to the new one
    assert_eq!(&written[..6], &[0xAA, 0x01, 0x41, 0x05, 0x47, 0xA8]);
    assert_eq!(&written[6..12], &[0xAA, 0x01, 0x41, 0x05, 0x47, 0xA8]);
    assert_eq!(&written[12..], &[0xAA, 0x05, 0x44, 0x49, 0xA8]);
}

#[test]
fn reply_for_other_command_is_mismatch() {
    let mut laser = laser(MockSerial::new().reply(&frame(0x42, 0x01, &[0x01])));
    assert_eq!(
        laser.measure(),
        Err(Error::Mismatch(Mismatch::Command { sent: 0x44, received: 0x42 }))
    );
}

#[test]
fn reply_from_other_address_is_mismatch() {
    let mut laser = laser(MockSerial::new().reply(&frame(0x44, 0x02, b"10")));
    assert_eq!(
        laser.measure(),
        Err(Error::Mismatch(Mismatch::Address { sent: 0x01, received: 0x02 }))
    );
}

#[test]
fn address_override_applies_to_one_exchange() {
    let mut laser = laser(MockSerial::new().reply(&frame(0x04, 0x09, &[0x09])));
    let payload = laser
        .send_and_receive(egismos_nostd_rs::Command::ReadSlaveAddress, &[], Some(0x09))
        .unwrap();
    assert_eq!(payload.as_slice(), &[0x09]);
    assert_eq!(laser.address(), 0x01);
}

#[test]
fn corrupted_checksum_is_reported() {
    let mut reply = frame(0x44, 0x01, b"1234");
    let idx = reply.len() - 2;
    reply[idx] ^= 0x04;
    let mut laser = laser(MockSerial::new().reply(&reply));

    let err = laser.measure().unwrap_err();
    assert!(err.is_checksum());
}

#[test]
fn noise_before_reply_is_skipped() {
    let mut reply = vec![0x00, 0x7F, 0xA8];
    reply.extend(frame(0x44, 0x01, b"987"));
    let mut laser = laser(MockSerial::new().reply(&reply));
    assert_eq!(laser.measure(), Ok(987));
}

#[test]
fn stale_input_is_discarded_before_sending() {
    let serial = MockSerial::new()
        .pending(&frame(0x44, 0x01, b"1111"))
        .reply(&frame(0x44, 0x01, b"2222"));
    let mut laser = laser(serial);
    assert_eq!(laser.measure(), Ok(2222));
}

#[test]
fn runaway_frame_is_rejected() {
    let mut reply = vec![0xAA];
    reply.extend([0x30; 40]);
    let mut laser = laser(MockSerial::new().reply(&reply));
    assert_eq!(laser.measure(), Err(Error::Frame(FrameError::Overflow)));
}

#[test]
fn silence_times_out() {
    let mut laser = laser(MockSerial::new());
    let started = Instant::now();

    assert_eq!(laser.measure(), Err(Error::Timeout));

    let elapsed = started.elapsed();
    assert!(elapsed >= std::time::Duration::from_millis(50));
    assert!(elapsed < std::time::Duration::from_secs(2));
}

#[test]
fn silent_port_is_not_read() {
    let serial = MockSerial::new().stalling(std::time::Duration::from_secs(5));
    let mut laser = laser(serial);
    let started = Instant::now();

    assert_eq!(laser.measure(), Err(Error::Timeout));
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}

#[test]
fn reply_from_address_a8_is_received() {
    let serial = MockSerial::new().reply(&frame(0x44, 0xA8, b"77"));
    let mut laser = Laser::new(
        serial,
        Config::default()
            .address(0xA8)
            .timeout(Duration::from_millis(50)),
    );

    assert_eq!(laser.measure(), Ok(77));
}

#[test]
fn unterminated_frame_times_out() {
    let mut laser = laser(MockSerial::new().reply(&[0xAA, 0x01, 0x44, b'1']));
    assert_eq!(laser.measure(), Err(Error::Timeout));
}

#[test]
fn continuous_mode_streams_readings() {
    let mut replies = frame(0x45, 0x01, b"1000");
    replies.extend(frame(0x45, 0x01, b"1010"));
    let serial = MockSerial::new()
        .reply(&replies)
        .reply(&frame(0x46, 0x01, &[0x01]));
    let mut laser = laser(serial);

    assert_eq!(laser.start_measuring(), Ok(1000));
    assert_eq!(laser.next_measurement(), Ok(1010));
    laser.stop_measuring().unwrap();
}

#[test]
fn device_queries_return_raw_answers() {
    let serial = MockSerial::new()
        .reply(&frame(0x01, 0x01, b"V2.1"))
        .reply(&frame(0x02, 0x01, &[0x10, 0x02]))
        .reply(&frame(0x04, 0x01, &[0x01]))
        .reply(&frame(0x08, 0x01, &[0x00]))
        .reply(&frame(0x08, 0x01, &[]));
    let mut laser = laser(serial);

    assert_eq!(laser.software_version().unwrap().as_slice(), b"V2.1");
    assert_eq!(laser.device_type().unwrap().as_slice(), &[0x10, 0x02]);
    assert_eq!(laser.read_slave_address(), Ok(0x01));
    assert_eq!(laser.device_error(), Ok(0x00));
    assert_eq!(
        laser.device_error(),
        Err(Error::CommandFailed(Failure::Garbled))
    );
}
