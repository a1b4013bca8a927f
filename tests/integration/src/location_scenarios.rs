//! Location reporting scenarios

use crate::test_utils::RecordingTransport;
use fieldlink_core::{DeliveryChannel, RecordingClock, StopSignal};
use fieldlink_location::{
    CellInfo, CellInfoProvider, FallbackSource, GnssSource, LbsSource, LocationReporter, LocationSettings,
    NmeaProvider, ReportOutcome,
};
use std::sync::Arc;
use std::time::Duration;

const GGA: &str = "$GNGGA,101530.000,3150.7816,N,11712.0034,E,1,10,0.8,35.2,M,-2.1,M,,*4B";

struct Cell(Option<CellInfo>);

impl CellInfoProvider for Cell {
    fn serving_cell(&mut self) -> Option<CellInfo> {
        self.0
    }
}

struct Receiver {
    running: bool,
    nmea: Option<String>,
}

impl NmeaProvider for Receiver {
    fn is_running(&mut self) -> bool {
        self.running
    }

    fn read_nmea(&mut self) -> Option<String> {
        self.nmea.clone()
    }
}

fn serving_cell() -> CellInfo {
    CellInfo {
        cell_id: 103_844_865,
        mcc: 460,
        mnc: 1,
        tac: 41_011,
        signal: 24,
    }
}

fn reporter(
    receiver: Receiver,
    cell: Option<CellInfo>,
    transport: &RecordingTransport,
    clock: RecordingClock,
) -> LocationReporter {
    LocationReporter::new(
        Box::new(FallbackSource::new(GnssSource::new(receiver), LbsSource::new(Cell(cell)))),
        DeliveryChannel::new(transport.clone()),
        Arc::new(clock),
        LocationSettings::default(),
    )
}

#[test]
fn test_gnss_fix_preferred() {
    let transport = RecordingTransport::accepting();
    let clock = RecordingClock::new();
    let receiver = Receiver {
        running: true,
        nmea: Some(format!("$GNGSV,3,1,12\r\n{GGA}\r\n$GNRMC,101530.000,A")),
    };
    let mut reporter = reporter(receiver, Some(serving_cell()), &transport, clock.clone());

    assert_eq!(reporter.run_iteration(), ReportOutcome::Delivered { attempts: 1 });
    assert_eq!(transport.locations(), vec![GGA.to_string()]);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1800)]);
}

#[test]
fn test_lbs_used_when_receiver_idle() {
    let transport = RecordingTransport::accepting();
    let receiver = Receiver {
        running: false,
        nmea: Some(GGA.to_string()),
    };
    let mut reporter = reporter(receiver, Some(serving_cell()), &transport, RecordingClock::new());

    assert_eq!(reporter.report_once(), ReportOutcome::Delivered { attempts: 1 });
    assert_eq!(
        transport.locations(),
        vec!["$LBS,460,1,41011,103844865,24,0*69;".to_string()]
    );
}

#[test]
fn test_no_fix_anywhere_retries_every_two_seconds() {
    let transport = RecordingTransport::accepting();
    let stop = StopSignal::new();
    let clock = RecordingClock::stopping_after(4, stop.clone());
    let receiver = Receiver {
        running: true,
        nmea: Some(GGA.replace(",E,1,", ",E,0,")),
    };

    reporter(receiver, None, &transport, clock.clone())
        .with_stop_signal(stop)
        .run();

    assert_eq!(clock.sleeps(), vec![Duration::from_secs(2); 4]);
    assert!(transport.locations().is_empty());
}

#[test]
fn test_rejected_fix_retried_after_short_pause() {
    let transport = RecordingTransport::scripted(&[false, false, false, false, true]);
    let clock = RecordingClock::new();
    let receiver = Receiver {
        running: false,
        nmea: None,
    };
    let mut reporter = reporter(receiver, Some(serving_cell()), &transport, clock.clone());

    assert_eq!(reporter.run_iteration(), ReportOutcome::GaveUp { attempts: 3 });
    assert_eq!(reporter.run_iteration(), ReportOutcome::Delivered { attempts: 2 });
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(2), Duration::from_secs(1800)]
    );
    assert_eq!(transport.locations().len(), 5);
}

#[test]
fn test_on_demand_report_is_single_shot() {
    let transport = RecordingTransport::rejecting();
    let clock = RecordingClock::new();
    let receiver = Receiver {
        running: true,
        nmea: Some(GGA.to_string()),
    };
    let mut reporter = reporter(receiver, None, &transport, clock.clone());

    assert_eq!(reporter.report_once(), ReportOutcome::GaveUp { attempts: 3 });
    assert_eq!(transport.locations().len(), 3);
    assert!(clock.sleeps().is_empty());

    let mut idle = self::reporter(
        Receiver {
            running: true,
            nmea: None,
        },
        None,
        &transport,
        clock.clone(),
    );
    assert_eq!(idle.report_once(), ReportOutcome::NoFix);
    assert_eq!(transport.locations().len(), 3);
}
