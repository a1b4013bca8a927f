//! Both workers publishing through one delivery channel

use crate::test_utils::{init_test_logging, temp_humidity, RecordingTransport, ScriptedDevice};
use fieldlink_core::{DeliveryChannel, StopSignal, SystemClock};
use fieldlink_location::{LocationReporter, LocationSettings, LocationSource};
use fieldlink_sensors::{SensorKind, SensorRegistry};
use fieldlink_telemetry::{SamplingLoop, SamplingSettings};
use std::sync::Arc;
use std::time::Duration;

struct AlwaysFix;

impl LocationSource for AlwaysFix {
    fn get_fix(&mut self) -> Option<String> {
        Some("$LBS,460,0,1,2,20,0*69;".to_string())
    }
}

#[test]
fn test_publishes_never_overlap() {
    init_test_logging();
    let transport = RecordingTransport::accepting().with_publish_delay(Duration::from_millis(1));
    let delivery = DeliveryChannel::new(transport.clone());
    let stop = StopSignal::new();
    let clock = Arc::new(SystemClock);

    // Alternating temperature so every cycle has something to send
    let readings = (0..500)
        .map(|i| Some(temp_humidity(if i % 2 == 0 { 20.0 } else { 25.0 }, 40.0)))
        .collect();
    let climate = ScriptedDevice::present(SensorKind::TempHumidity)
        .reads(readings)
        .then_steady(temp_humidity(20.0, 40.0));

    let sampling = SamplingLoop::new(
        SensorRegistry::with_devices(vec![climate.boxed()]),
        delivery.clone(),
        clock.clone(),
        SamplingSettings {
            cycle_interval: Duration::from_millis(1),
            read_pause: Duration::ZERO,
            ..SamplingSettings::default()
        },
    )
    .with_stop_signal(stop.clone());

    let location = LocationReporter::new(
        Box::new(AlwaysFix),
        delivery,
        clock,
        LocationSettings {
            retry_interval: Duration::from_millis(1),
            report_interval: Duration::from_millis(1),
        },
    )
    .with_stop_signal(stop.clone());

    let workers = vec![sampling.spawn().unwrap(), location.spawn().unwrap()];
    std::thread::sleep(Duration::from_millis(150));
    stop.raise();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(transport.overlaps(), 0);
    assert!(!transport.frames().is_empty());
    assert!(!transport.locations().is_empty());
}
