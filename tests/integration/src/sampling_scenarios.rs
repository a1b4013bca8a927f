//! Sampling loop scenarios
//!
//! Each scenario drives a full [`SamplingLoop`] against scripted devices, a
//! recording transport and a recording clock, and checks what reached the
//! wire.

use crate::test_utils::{init_test_logging, motion, temp_humidity, RecordingTransport, ScriptedDevice};
use fieldlink_core::{
    Channel, ChannelValue, DeliveryChannel, DeliveryReport, RecordingClock, StopSignal, SystemClock,
};
use fieldlink_sensors::{DeviceHandle, SensorKind, SensorRegistry};
use fieldlink_telemetry::{read_channel, SamplingLoop, SamplingSettings, TELEMETRY_FRAME_MODE};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Sleeps per cycle: three read pauses and the cycle interval.
const SLEEPS_PER_CYCLE: usize = 4;

fn sampling_loop(
    devices: Vec<Box<dyn DeviceHandle>>,
    transport: &RecordingTransport,
    clock: RecordingClock,
) -> SamplingLoop {
    SamplingLoop::new(
        SensorRegistry::with_devices(devices),
        DeliveryChannel::new(transport.clone()),
        Arc::new(clock),
        SamplingSettings::default(),
    )
}

#[test]
fn test_temperature_change_reaches_wire() {
    init_test_logging();
    let transport = RecordingTransport::accepting();
    let stop = StopSignal::new();
    let clock = RecordingClock::stopping_after(3 * SLEEPS_PER_CYCLE, stop.clone());

    let device = ScriptedDevice::present(SensorKind::TempHumidity).reads(vec![
        Some(temp_humidity(20.0, 50.0)),
        Some(temp_humidity(21.5, 50.4)),
        Some(temp_humidity(21.6, 50.9)),
    ]);
    let sampler = sampling_loop(vec![device.boxed()], &transport, clock.clone())
        .with_stop_signal(stop)
        .run();

    assert_eq!(sampler.cycle_counter(), 3);
    let frames = transport.frames();
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|(mode, _)| *mode == TELEMETRY_FRAME_MODE));
    assert_eq!(frames[0].1.to_json().unwrap(), r#"{"3":20.0,"4":50.0}"#);
    assert_eq!(frames[1].1.to_json().unwrap(), r#"{"3":21.5}"#);

    let total: Duration = clock.sleeps().iter().sum();
    assert_eq!(total, Duration::from_millis(3 * (300 + 1000)));
}

#[test]
fn test_accel_reported_against_last_reported_vector() {
    let transport = RecordingTransport::accepting();
    let device = ScriptedDevice::present(SensorKind::Motion).reads(vec![
        Some(motion([0.0, 0.0, 0.0], [0.0, 0.0, 0.0])),
        Some(motion([0.3, 0.3, 0.0], [0.0, 0.0, 0.0])),
        Some(motion([0.1, 0.1, 0.1], [0.0, 0.0, 0.0])),
    ]);
    let mut sampler = sampling_loop(vec![device.boxed()], &transport, RecordingClock::new());

    let first = sampler.run_cycle();
    assert_eq!(first.frame.channels(), vec![Channel::Gyro, Channel::Accel]);

    let second = sampler.run_cycle();
    assert_eq!(second.frame.channels(), vec![Channel::Accel]);
    assert_eq!(
        second.frame.to_json().unwrap(),
        r#"{"10":{"1":0.3,"2":0.3,"3":0.0}}"#
    );

    let third = sampler.run_cycle();
    assert!(third.frame.is_empty());
    assert_eq!(transport.frames().len(), 2);
}

#[test]
fn test_unplugged_sensor_isolated_and_recovered() {
    init_test_logging();
    let transport = RecordingTransport::accepting();
    let pressure = ScriptedDevice::present(SensorKind::PressureTemp)
        .then_probes(&[false, true])
        .reads(vec![
            Some(fieldlink_sensors::Reading::PressureTemp {
                pressure: 1000.0,
                temperature: 20.0,
            }),
            None,
            Some(fieldlink_sensors::Reading::PressureTemp {
                pressure: 1005.0,
                temperature: 20.0,
            }),
        ]);
    let pressure_reads = pressure.read_counter();
    let climate = ScriptedDevice::present(SensorKind::TempHumidity)
        .then_steady(temp_humidity(22.0, 40.0));

    let mut sampler = sampling_loop(
        vec![pressure.boxed(), climate.boxed()],
        &transport,
        RecordingClock::new(),
    );

    sampler.run_cycle();
    let faulted = sampler.run_cycle();
    assert_eq!(faulted.read_failures, vec![SensorKind::PressureTemp]);
    assert!(sampler.registry().is_available(SensorKind::TempHumidity));

    // No hardware access while unplugged, the failed probe at cycle 30 included
    for _ in 2..60 {
        let report = sampler.run_cycle();
        assert!(report.reconnected.is_empty());
    }
    assert_eq!(pressure_reads.load(Ordering::SeqCst), 2);

    let recovered = sampler.run_cycle();
    assert_eq!(recovered.cycle, 60);
    assert_eq!(recovered.reconnected, vec![SensorKind::PressureTemp]);
    assert_eq!(recovered.frame.get(Channel::Pressure), Some(&ChannelValue::Scalar(1005.0)));
    assert!(!recovered.frame.contains(Channel::PressureTemperature));
    assert_eq!(pressure_reads.load(Ordering::SeqCst), 3);
}

#[test]
fn test_exhausted_frame_is_resent_in_full() {
    let transport = RecordingTransport::scripted(&[false, false, false, true]);
    let device = ScriptedDevice::present(SensorKind::TempHumidity).then_steady(temp_humidity(20.0, 40.0));
    let mut sampler = sampling_loop(vec![device.boxed()], &transport, RecordingClock::new());

    let failed = sampler.run_cycle();
    assert_eq!(failed.delivery, Some(DeliveryReport::Exhausted { attempts: 3 }));
    assert!(sampler.filter().is_reset());

    let resent = sampler.run_cycle();
    assert_eq!(resent.delivery, Some(DeliveryReport::Delivered { attempts: 1 }));
    assert_eq!(resent.frame.len(), 2);

    let quiet = sampler.run_cycle();
    assert_eq!(quiet.delivery, None);
    assert_eq!(transport.frames().len(), 4);
}

#[test]
fn test_no_sensors_means_no_traffic() {
    let transport = RecordingTransport::accepting();
    let absent: Vec<Box<dyn DeviceHandle>> = SensorKind::ALL
        .iter()
        .map(|kind| ScriptedDevice::absent(*kind).boxed())
        .collect();
    let mut sampler = sampling_loop(absent, &transport, RecordingClock::new());

    for _ in 0..5 {
        let report = sampler.run_cycle();
        assert!(report.frame.is_empty());
        assert!(report.read_failures.is_empty());
    }
    assert!(transport.frames().is_empty());
}

#[test]
fn test_on_demand_read_served_by_running_loop() {
    init_test_logging();
    let transport = RecordingTransport::accepting();
    let stop = StopSignal::new();
    let (handle, requests) = read_channel(4);

    let climate = ScriptedDevice::present(SensorKind::TempHumidity).then_steady(temp_humidity(18.256, 61.0));
    let settings = SamplingSettings {
        cycle_interval: Duration::from_millis(2),
        read_pause: Duration::ZERO,
        ..SamplingSettings::default()
    };
    let sampler = SamplingLoop::new(
        SensorRegistry::with_devices(vec![climate.boxed()]),
        DeliveryChannel::new(transport.clone()),
        Arc::new(SystemClock),
        settings,
    )
    .with_read_requests(requests)
    .with_stop_signal(stop.clone());
    let worker = sampler.spawn().unwrap();

    let frame = handle.request_ids(&[3, 4, 10, 99]).unwrap();
    stop.raise();
    worker.join().unwrap();

    assert_eq!(frame.to_json().unwrap(), r#"{"3":18.26,"4":61.0}"#);
    // The periodic frame went out once; the on-demand read did not publish
    assert_eq!(transport.frames().len(), 1);
}

#[test]
fn test_nan_reading_does_not_become_baseline() {
    let transport = RecordingTransport::accepting();
    let device = ScriptedDevice::present(SensorKind::TempHumidity)
        .then_probes(&[true])
        .reads(vec![Some(temp_humidity(f64::NAN, 40.0)), Some(temp_humidity(25.0, 40.0))]);
    let mut sampler = SamplingLoop::new(
        SensorRegistry::with_devices(vec![device.boxed()]),
        DeliveryChannel::new(transport.clone()),
        Arc::new(RecordingClock::new()),
        SamplingSettings {
            reconnect_period: 1,
            ..SamplingSettings::default()
        },
    );

    let faulted = sampler.run_cycle();
    assert_eq!(faulted.read_failures, vec![SensorKind::TempHumidity]);
    assert!(faulted.frame.is_empty());

    let recovered = sampler.run_cycle();
    assert_eq!(recovered.reconnected, vec![SensorKind::TempHumidity]);
    assert_eq!(
        recovered.frame.get(Channel::Temperature),
        Some(&ChannelValue::Scalar(25.0))
    );
    assert_eq!(transport.frames().len(), 1);
}
