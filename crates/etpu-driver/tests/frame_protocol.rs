//! Frame protocol tests
//!
//! Drive whole frames through the recording bus and check the exact bus
//! sequence the free-running accelerator sees.

use etpu_driver::chip::Window;
use etpu_driver::{
    BusEvent, DriverConfig, FrameDriver, Matrix, ReadoutSpan, RecordingBus, RegisterBus,
};

fn run(weights: &Matrix, input: &Matrix) -> Vec<BusEvent> {
    let mut driver = FrameDriver::reference(RecordingBus::new());
    driver.run_frame(weights, input).expect("frame");
    driver.into_bus().take_events()
}

fn located(events: &[BusEvent]) -> Vec<(char, Window, usize, u32)> {
    events
        .iter()
        .map(|e| {
            let (window, slot) = e.location().expect("access outside windows");
            (if e.is_write() { 'W' } else { 'R' }, window, slot, e.value())
        })
        .collect()
}

#[test]
fn reference_frame_exact_sequence() {
    let events = run(&Matrix::reference_weights(), &Matrix::reference_input());
    let seq = located(&events);
    assert_eq!(seq.len(), 9 + 5 + 25 + 1);

    let weights: Vec<_> = seq[..9].to_vec();
    let expected_weights: Vec<_> = [1, 5, 6, 4, 8, 7, 5, 9, 11]
        .iter()
        .enumerate()
        .map(|(slot, &v)| ('W', Window::Weight, slot, v))
        .collect();
    assert_eq!(weights, expected_weights);

    assert_eq!(
        seq[9..14],
        [
            ('W', Window::Stream, 0, 0x0000_0001),
            ('W', Window::Stream, 1, 0x0000_0505),
            ('W', Window::Stream, 2, 0x0106_090C),
            ('W', Window::Stream, 3, 0x020B_0000),
            ('W', Window::Stream, 4, 0x0313_0000),
        ]
    );

    for (i, &(dir, window, slot, _)) in seq[14..39].iter().enumerate() {
        assert_eq!((dir, window, slot), ('R', Window::Readout, 5 + i));
    }

    assert_eq!(seq[39], ('W', Window::Stream, 4, 0x0400_0000));
}

#[test]
fn terminal_tag_follows_every_readout_read() {
    let events = run(&Matrix::reference_weights(), &Matrix::reference_input());
    let terminal = events
        .iter()
        .position(|e| e.is_write() && e.value() == 0x0400_0000)
        .expect("terminal word written");
    let last_read = events
        .iter()
        .rposition(|e| !e.is_write())
        .expect("readout reads issued");
    assert!(last_read < terminal);
    assert_eq!(terminal, events.len() - 1);
    assert_eq!(events[..terminal].iter().filter(|e| !e.is_write()).count(), 25);
}

#[test]
fn all_zero_matrices() {
    let events = run(&Matrix::zeros(3), &Matrix::zeros(3));
    let seq = located(&events);
    assert!(seq[..9].iter().all(|&(_, w, _, v)| w == Window::Weight && v == 0));
    let stream: Vec<u32> = seq[9..14].iter().map(|&(_, _, _, v)| v).collect();
    assert_eq!(stream, [0, 0, 0x0100_0000, 0x0200_0000, 0x0300_0000]);
    assert_eq!(seq[39].3, 0x0400_0000);
}

#[test]
fn weight_count_independent_of_content() {
    for fill in [0u8, 1, 0x80, 0xFF] {
        let w = Matrix::from_rows(&[[fill; 3]; 3]);
        let events = run(&w, &Matrix::reference_input());
        let weight_writes = events
            .iter()
            .filter(|e| e.is_write() && matches!(e.location(), Some((Window::Weight, _))))
            .count();
        assert_eq!(weight_writes, 9, "fill {fill:#x}");
    }
}

#[test]
fn frames_are_idempotent() {
    let mut driver = FrameDriver::reference(RecordingBus::new());
    driver.run_reference_frame().unwrap();
    let mut bus = driver.into_bus();
    let first = bus.take_events();

    let mut driver = FrameDriver::reference(bus);
    driver.run_reference_frame().unwrap();
    let second = driver.into_bus().take_events();

    let writes = |events: &[BusEvent]| -> Vec<BusEvent> {
        events.iter().filter(|e| e.is_write()).copied().collect()
    };
    assert_eq!(writes(&first), writes(&second));
    assert_eq!(first.len(), second.len());
}

#[test]
fn back_to_back_frames_repeat_sequence() {
    let mut driver = FrameDriver::reference(RecordingBus::new());
    driver.run_reference_frame().unwrap();
    driver.run_reference_frame().unwrap();
    let events = driver.into_bus().take_events();
    let (a, b) = events.split_at(events.len() / 2);
    let addrs = |e: &[BusEvent]| e.iter().map(|x| (x.is_write(), x.addr())).collect::<Vec<_>>();
    assert_eq!(addrs(a), addrs(b));
}

#[test]
fn scripted_readout_is_reported() {
    let script: Vec<u32> = (100..125).collect();
    let bus = RecordingBus::new().with_readout(script.clone());
    let mut driver = FrameDriver::reference(bus);
    let report = driver.run_reference_frame().unwrap();
    assert_eq!(report.readout, script);
}

#[test]
fn custom_readout_span_changes_drain_only() {
    let cfg = DriverConfig::new().with_readout(ReadoutSpan::new(0, 10).unwrap());
    let mut driver = FrameDriver::new(RecordingBus::new(), &cfg).unwrap();
    let report = driver.run_reference_frame().unwrap();
    assert_eq!(report.readout.len(), 10);
    let bus = driver.into_bus();
    assert_eq!(bus.writes().count(), 15);
    assert_eq!(
        bus.reads().next().and_then(BusEvent::location),
        Some((Window::Readout, 0))
    );
}

#[test]
fn two_by_two_frame() {
    let cfg = DriverConfig::new().with_dimension(2);
    let mut driver = FrameDriver::new(RecordingBus::new(), &cfg).unwrap();
    let w = Matrix::from_rows(&[[1, 2], [3, 4]]);
    let report = driver.run_frame(&w, &w).unwrap();
    assert_eq!(report.weight_words, 4);
    assert_eq!(report.stream_words, 4);
    let bus = driver.into_bus();
    let last = bus.events().last().copied().unwrap();
    assert_eq!(last.location(), Some((Window::Stream, 2)));
    assert_eq!(last.value(), 0x0300_0000);
}

#[test]
fn boxed_bus_drives_frames() {
    let bus: Box<dyn RegisterBus> = Box::new(RecordingBus::new());
    let mut driver = FrameDriver::reference(bus);
    assert_eq!(driver.run_reference_frame().unwrap().readout.len(), 25);
}
