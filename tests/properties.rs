//! Property tests for clock rescheduling, transmission progress and
//! capability negotiation.

use linkflow::contract::validate;
use linkflow::prelude::*;
use proptest::prelude::*;

struct Idle;

impl PacketProducer for Idle {
    fn handle_packet_processed(&mut self, _packet: &Packet, _success: bool) {}

    fn handle_can_push_again(&mut self) {}
}

fn capabilities() -> impl Strategy<Value = Capabilities> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(pushing, pulling, passing, streaming)| Capabilities {
            pushing,
            pulling,
            passing,
            streaming,
            sending: false,
        },
    )
}

proptest! {
    #[test]
    fn drift_change_preserves_logical_deadlines(
        deadlines_ms in prop::collection::vec(1i64..100_000, 1..20),
        advance_ms in 0i64..100_000,
        ppm in -500_000.0f64..500_000.0,
    ) {
        let mut sched = Scheduler::new();
        let mut clock = LogicalClock::ideal();
        let timers: Vec<_> = deadlines_ms
            .iter()
            .map(|&ms| {
                let timer = sched.create_timer("t");
                clock.schedule(&mut sched, ClockTime::from_millis(ms), timer).unwrap();
                (timer, ClockTime::from_millis(ms))
            })
            .collect();

        let earliest = sched.next_event_time().unwrap();
        sched.advance_to(SimTime::from_millis(advance_ms).min(earliest)).unwrap();
        let now = sched.now();
        clock.set_drift_rate(&mut sched, ppm / 1e6).unwrap();

        for &(timer, deadline) in &timers {
            prop_assert_eq!(clock.arrival_time(&sched, timer), Ok(deadline));
            prop_assert!(sched.deadline(timer).unwrap() >= now);
        }

        // Timers fire in logical-deadline order, none lost.
        let mut previous = ClockTime::ZERO;
        let mut fired = 0;
        while let Some(event) = sched.pop() {
            let deadline = timers
                .iter()
                .find(|(timer, _)| *timer == event.timer)
                .map(|(_, deadline)| *deadline)
                .unwrap();
            prop_assert!(deadline >= previous);
            previous = deadline;
            fired += 1;
        }
        prop_assert_eq!(fired, timers.len());
    }

    #[test]
    fn clock_jump_never_fires_in_the_past(
        deadlines_ms in prop::collection::vec(1i64..10_000, 1..20),
        jump_at_ms in 0i64..10_000,
        jump_to_ms in 0i64..20_000,
    ) {
        let mut sched = Scheduler::new();
        let mut clock = LogicalClock::ideal();
        for &ms in &deadlines_ms {
            let timer = sched.create_timer("t");
            clock.schedule(&mut sched, ClockTime::from_millis(ms), timer).unwrap();
        }

        let earliest = sched.next_event_time().unwrap();
        sched.advance_to(SimTime::from_millis(jump_at_ms).min(earliest)).unwrap();
        let jump_time = sched.now();
        clock.set_clock_time(&mut sched, ClockTime::from_millis(jump_to_ms)).unwrap();

        let mut fired = 0;
        while let Some(event) = sched.pop() {
            prop_assert!(event.time >= jump_time);
            fired += 1;
        }
        prop_assert_eq!(fired, deadlines_ms.len());
    }

    #[test]
    fn transmitted_length_is_monotonic_and_bounded(
        bits in 1u64..1_000_000,
        bps in 1u64..1_000_000_000,
        mut samples_us in prop::collection::vec(0i64..5_000_000, 1..32),
    ) {
        let config = LinkConfig {
            transmitter: TransmitterConfig::default().with_datarate_bps(bps),
            ..Default::default()
        };
        let mut link = Link::new(&config, Idle, PacketQueue::unbounded("sink")).unwrap();
        link.start().unwrap();
        link.push(Packet::with_bit_length("unit", bits)).unwrap();

        samples_us.sort_unstable();
        let mut previous = 0;
        for us in samples_us {
            let length = link
                .transmitter()
                .transmitted_length(ClockTime::from_picos(us * 1_000_000));
            prop_assert!(length >= previous);
            prop_assert!(length <= bits);
            previous = length;
        }
    }

    #[test]
    fn negotiation_requires_both_dimensions(a in capabilities(), b in capabilities()) {
        let start = Endpoint::new("a", Port::Output(0), a);
        let end = Endpoint::new("b", Port::Input, b);

        let flow = (a.pushing && b.pushing) || (a.pulling && b.pulling);
        let granularity = (a.passing && b.passing) || (a.streaming && b.streaming);
        prop_assert_eq!(validate(Some(&start), Some(&end)).is_ok(), flow && granularity);
    }
}

#[test]
fn push_only_never_meets_pull_only() {
    let push_pull = EndpointKind::PushSink
        .capabilities()
        .union(EndpointKind::PullSink.capabilities());

    for (start, end, ok) in [
        (EndpointKind::PushSource.capabilities(), EndpointKind::PullSink.capabilities(), false),
        (EndpointKind::PullSource.capabilities(), EndpointKind::PushSink.capabilities(), false),
        (EndpointKind::PushSource.capabilities(), push_pull, true),
        (EndpointKind::PullSource.capabilities(), push_pull, true),
        (push_pull, EndpointKind::PushSink.capabilities(), true),
        (push_pull, EndpointKind::PullSink.capabilities(), true),
    ] {
        let start = Endpoint::new("start", Port::Output(0), start);
        let end = Endpoint::new("end", Port::Input, end);
        assert_eq!(validate(Some(&start), Some(&end)).is_ok(), ok);
    }
}
