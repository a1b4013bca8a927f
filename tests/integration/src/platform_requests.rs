//! Platform-initiated requests against running workers
//!
//! Both loops run on the wall clock with long pauses; property reads and
//! location reports must still be answered right away, and shutdown must
//! not wait for the pauses to run out.

use crate::test_utils::{init_test_logging, temp_humidity, RecordingTransport, ScriptedDevice};
use fieldlink_core::{DeliveryChannel, StopSignal, SystemClock};
use fieldlink_location::{CellInfo, CellInfoProvider, LbsSource, LocationReporter, LocationSettings, ReportOutcome};
use fieldlink_sensors::{SensorKind, SensorRegistry};
use fieldlink_telemetry::{SamplingLoop, SamplingSettings};
use std::sync::Arc;
use std::time::{Duration, Instant};

const LONG_PAUSE: Duration = Duration::from_secs(600);

struct FixedCell;

impl CellInfoProvider for FixedCell {
    fn serving_cell(&mut self) -> Option<CellInfo> {
        Some(CellInfo {
            cell_id: 88_001,
            mcc: 262,
            mnc: 2,
            tac: 1_201,
            signal: 18,
        })
    }
}

#[test]
fn test_platform_requests_answered_while_workers_pause() {
    init_test_logging();
    let transport = RecordingTransport::accepting();
    let delivery = DeliveryChannel::new(transport.clone());
    let sampling_stop = StopSignal::new();
    let location_stop = StopSignal::new();

    let climate = ScriptedDevice::present(SensorKind::TempHumidity).then_steady(temp_humidity(23.5, 48.0));
    let (sampler, reads) = SamplingLoop::new(
        SensorRegistry::with_devices(vec![climate.boxed()]),
        delivery.clone(),
        Arc::new(SystemClock),
        SamplingSettings {
            cycle_interval: LONG_PAUSE,
            read_pause: Duration::ZERO,
            ..SamplingSettings::default()
        },
    )
    .with_stop_signal(sampling_stop.clone())
    .with_request_queue(4);

    let (reporter, location) = LocationReporter::new(
        Box::new(LbsSource::new(FixedCell)),
        delivery,
        Arc::new(SystemClock),
        LocationSettings {
            retry_interval: LONG_PAUSE,
            report_interval: LONG_PAUSE,
        },
    )
    .with_stop_signal(location_stop.clone())
    .with_request_queue(4);

    let workers = [sampler.spawn().unwrap(), reporter.spawn().unwrap()];

    // Let both workers settle into their long pauses
    while transport.frames().is_empty() || transport.locations().is_empty() {
        std::thread::sleep(Duration::from_millis(5));
    }

    let asked_at = Instant::now();
    let frame = reads.request_ids(&[3, 4]).unwrap();
    assert_eq!(frame.to_json().unwrap(), r#"{"3":23.5,"4":48.0}"#);
    assert_eq!(location.request(), Ok(ReportOutcome::Delivered { attempts: 1 }));
    assert!(asked_at.elapsed() < Duration::from_secs(10));

    let locations = transport.locations();
    assert_eq!(locations.len(), 2);
    assert!(locations.iter().all(|data| data.starts_with("$LBS,")));
    // The property read answers the platform directly and publishes nothing
    assert_eq!(transport.frames().len(), 1);

    let stopped_at = Instant::now();
    sampling_stop.raise();
    location_stop.raise();
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(stopped_at.elapsed() < Duration::from_secs(10));
    assert_eq!(transport.overlaps(), 0);
}
