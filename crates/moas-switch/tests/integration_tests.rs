//! Integration tests for the MOAS switch engine
//!
//! These tests drive the switch through its host link and transmit/receive
//! entry point and check what it writes back and drives:
//! - Command parsing and error replies
//! - Antenna assignment, conflicts, and the commit events
//! - Shared antenna systems and wait mode
//! - Relay and inhibit outputs
//! - Determinism and table symmetry under arbitrary input

use moas_protocol::{Antenna, Relay, RelaySet, Station, StationSet, STATIONS};
use moas_switch::{Switch, SwitchConfig, SwitchEvent, SwitchOutput};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub fn station(n: u8) -> Station {
        Station::from_number(n).unwrap()
    }

    pub fn antenna(i: usize) -> Antenna {
        Antenna::new(i).unwrap()
    }

    pub fn relays(indices: &[usize]) -> RelaySet {
        indices.iter().filter_map(|&i| Relay::new(i)).collect()
    }

    /// Operating switch with antenna events on and the buffer drained
    pub fn operating() -> Switch {
        let mut switch = Switch::new();
        switch.feed(b"*A1;");
        switch.drain_events();
        switch
    }

    /// Everything written to the host since the last drain
    pub fn host_text(switch: &mut Switch) -> String {
        let mut out = String::new();
        switch.flush_to(&mut out);
        out
    }

    /// Run the resolver without changing anything it looks at
    pub fn rerun_resolver(switch: &mut Switch) {
        switch.set_transmit(6, false).unwrap();
    }

    pub fn antenna_updates(events: &[SwitchEvent]) -> Vec<([Antenna; STATIONS], [Antenna; STATIONS])> {
        events
            .iter()
            .filter_map(|e| match e {
                SwitchEvent::AntennaUpdate { tx, rx } => Some((*tx, *rx)),
                _ => None,
            })
            .collect()
    }

    pub fn last_relay_update(events: &[SwitchEvent]) -> Option<(RelaySet, StationSet)> {
        events.iter().rev().find_map(|e| match e {
            SwitchEvent::RelayUpdate { relays, inhibits } => Some((*relays, *inhibits)),
            _ => None,
        })
    }
}

use helpers::*;

// ============================================================================
// Parser and error replies
// ============================================================================

mod parser_tests {
    use super::*;

    #[test]
    fn control_bytes_are_ignored() {
        let mut switch = Switch::new();
        switch.drain_events();
        switch.feed(b"'\r\n;");
        assert_eq!(host_text(&mut switch), ".;");
    }

    #[test]
    fn cancel_discards_partial_command() {
        let mut switch = operating();
        switch.feed(b"!1T5$';");
        assert_eq!(host_text(&mut switch), "';");
        assert!(switch.state().tx_pending.is_empty());
    }

    #[test]
    fn unknown_command_changes_nothing() {
        let mut switch = operating();
        let before = switch.state().clone();
        switch.feed(b"Q12;");
        assert_eq!(host_text(&mut switch), "?U;");
        assert_eq!(switch.state(), &before);
    }

    #[test]
    fn out_of_range_station_is_rejected_once() {
        let mut switch = operating();
        let before = switch.state().clone();
        switch.feed(b"!7T5;");
        assert_eq!(host_text(&mut switch), "?A;");
        assert_eq!(switch.state(), &before);
    }

    #[test]
    fn bad_relay_symbol_rejects_whole_command() {
        let mut switch = operating();
        let before = switch.state().clone();
        switch.feed(b"!1T5A|;");
        assert_eq!(host_text(&mut switch), "?A;");
        assert_eq!(switch.state(), &before);
    }

    #[test]
    fn bad_station_list_rejects_whole_command() {
        let mut switch = operating();
        switch.feed(b"(128;");
        assert_eq!(host_text(&mut switch), "?A;");
        assert!(switch.state().manual_inhibits.is_empty());
    }

    #[test]
    fn selector_errors() {
        let mut switch = operating();
        switch.feed(b"%X56;&Z;");
        assert_eq!(host_text(&mut switch), "?a;?a;");
        switch.feed(b"^X1;=Q2;/Z1;_Q;\"Z;");
        assert_eq!(host_text(&mut switch), "?A;?A;?A;?A;?A;");
    }

    #[test]
    fn operate_flag_ends_set_state() {
        let mut switch = Switch::new();
        switch.feed(b"*1A;");
        assert!(switch.is_operating());
        assert!(!switch.state().events.antenna);
        switch.drain_events();

        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "");
        assert_eq!(switch.actual_tx_antennas()[0], antenna(5));

        switch.feed(b"*A;!2T6;");
        assert_eq!(host_text(&mut switch), "!2S6;");
    }

    #[test]
    fn high_bytes_are_line_noise() {
        let mut switch = operating();
        switch.feed(b"!1T\xC05;\x80';");
        assert_eq!(host_text(&mut switch), "!1S5;';");
    }

    #[test]
    fn self_reference_rejected() {
        let mut switch = operating();
        switch.feed(b"~11;@22;");
        assert_eq!(host_text(&mut switch), "?A;?A;");
    }

    #[test]
    fn overlong_command_reports_once() {
        let mut switch = Switch::with_config(SwitchConfig {
            command_buffer_len: 16,
            ..SwitchConfig::default()
        });
        switch.feed(b"*1;");
        switch.drain_events();

        let mut input = vec![b'#'; 40];
        input.extend_from_slice(b";';");
        switch.feed(&input);
        assert_eq!(host_text(&mut switch), "?A;';");
    }

    #[test]
    fn accepted_commands_without_replies() {
        let mut switch = operating();
        switch.feed(b"[10;\\5;]3;#vendor;");
        assert_eq!(host_text(&mut switch), "");
    }
}

// ============================================================================
// Antenna assignment and conflicts
// ============================================================================

mod antenna_tests {
    use super::*;

    #[test]
    fn transmit_antenna_without_conflicts() {
        let mut switch = operating();
        switch.feed(b"!1T5;");

        let events = switch.drain_events();
        let text: String = events.iter().filter_map(SwitchEvent::wire_text).collect();
        assert_eq!(text, "!1S5;");

        let updates = antenna_updates(&events);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0[0], antenna(5));
        assert_eq!(switch.actual_tx_antennas()[0], antenna(5));
    }

    #[test]
    fn conflict_with_transmitting_station() {
        let mut switch = operating();
        switch.feed(b"%C56;!2T6;");
        switch.set_transmit(2, true).unwrap();
        switch.drain_events();

        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "!1C5;");
        assert_eq!(switch.state().station(station(1)).current_tx.antenna, Antenna::LAST);
        assert!(switch.state().tx_pending.contains(station(1)));
    }

    #[test]
    fn conflict_commits_once_blocker_moves() {
        let mut switch = operating();
        switch.feed(b"%C56;!2T6;!1T5;");
        assert_eq!(host_text(&mut switch), "!2S6;!1C5;");

        switch.feed(b"!2T7;");
        // Both commit together, reported in station order
        assert_eq!(host_text(&mut switch), "!1S5;!2S7;");
        assert!(switch.state().tx_pending.is_empty());
    }

    #[test]
    fn mutually_conflicting_requests_favor_higher_station() {
        let mut switch = Switch::new();
        // Collected while not operating, resolved together afterwards
        switch.feed(b"%C56;!1T5;!2T6;*A1;");
        switch.drain_events();

        rerun_resolver(&mut switch);
        assert_eq!(host_text(&mut switch), "!1C5;!2C6;!2S6;");
        assert_eq!(switch.actual_tx_antennas()[1], antenna(6));
        assert_eq!(switch.state().tx_pending, StationSet::only(station(1)));

        // Station 1 stays pending and is not reported again
        rerun_resolver(&mut switch);
        rerun_resolver(&mut switch);
        assert_eq!(host_text(&mut switch), "");
        assert_eq!(switch.state().tx_pending, StationSet::only(station(1)));
    }

    #[test]
    fn identical_resend_is_idempotent() {
        let mut switch = operating();
        switch.feed(b"%C56;!2T6;!1T5;");
        switch.drain_events();
        let before = switch.state().clone();

        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "");
        assert_eq!(switch.state(), &before);
    }

    #[test]
    fn new_pending_antenna_reports_again() {
        let mut switch = operating();
        switch.feed(b"%C56;%C76;!2T6;!1T5;");
        assert_eq!(host_text(&mut switch), "!2S6;!1C5;");

        switch.feed(b"!1T7;");
        assert_eq!(host_text(&mut switch), "!1C7;");
    }

    #[test]
    fn receive_follows_transmit_unless_fast() {
        let mut switch = operating();
        switch.feed(b"!1T5;!1R9;");
        assert_eq!(host_text(&mut switch), "!1S5;!1s9;");
        assert_eq!(switch.actual_rx_antennas()[0], antenna(5));

        switch.feed(b"&F59;!2T5;!2R9;");
        assert_eq!(host_text(&mut switch), "!2S5;!2f9;");
        assert_eq!(switch.actual_rx_antennas()[1], antenna(9));
    }

    #[test]
    fn both_role_sets_transmit_and_receive() {
        let mut switch = operating();
        switch.feed(b"!4BaXY;");
        assert_eq!(host_text(&mut switch), "!4Sa;!4sa;");
        let s = switch.state().station(station(4));
        assert_eq!(s.current_tx.antenna, antenna(36));
        assert_eq!(s.current_rx.relays, relays(&[33, 34]));
    }

    #[test]
    fn antenna_events_disabled() {
        let mut switch = Switch::new();
        switch.feed(b"*1;%C56;!2T6;!1T5;");
        let events = switch.drain_events();
        assert!(events.iter().all(|e| e.wire_text().is_none()));
        assert_eq!(switch.actual_tx_antennas()[1], antenna(6));
    }

    #[test]
    fn not_operating_keeps_requests_pending() {
        let mut switch = Switch::new();
        switch.drain_events();
        switch.feed(b"!1T5;");
        let events = switch.drain_events();
        assert_eq!(last_relay_update(&events), Some((RelaySet::EMPTY, StationSet::ALL)));
        assert!(antenna_updates(&events).is_empty());
        assert!(switch.state().tx_pending.contains(station(1)));
    }
}

// ============================================================================
// Shared systems and wait mode
// ============================================================================

mod system_tests {
    use super::*;

    #[test]
    fn shared_system_waits_for_transmitting_dependency() {
        let mut switch = operating();
        switch.feed(b"_SA1B1;!2TB;");
        assert_eq!(host_text(&mut switch), "!2SB;");

        switch.set_transmit(2, true).unwrap();
        switch.feed(b"!1TA;");
        assert_eq!(host_text(&mut switch), "");
        assert!(switch.state().tx_pending.contains(station(1)));

        switch.set_transmit(2, false).unwrap();
        assert_eq!(host_text(&mut switch), "!1SA;");
    }

    #[test]
    fn standalone_antenna_ignores_other_transmitters() {
        let mut switch = operating();
        switch.set_transmit(2, true).unwrap();
        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "!1S5;");
    }

    #[test]
    fn wait_mode_holds_transmitting_station() {
        let mut switch = operating();
        switch.set_transmit(1, true).unwrap();
        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "");

        switch.set_transmit(1, false).unwrap();
        assert_eq!(host_text(&mut switch), "!1S5;");
    }

    #[test]
    fn inhibit_mode_switches_on_the_air() {
        let mut switch = operating();
        switch.feed(b"/I1;");
        switch.set_transmit(1, true).unwrap();
        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "!1S5;");
    }

    #[test]
    fn system_receive_change_waits() {
        let mut switch = operating();
        switch.feed(b"_S51;!2T5;");
        switch.set_transmit(2, true).unwrap();
        switch.drain_events();

        switch.feed(b"!1R5;");
        assert_eq!(host_text(&mut switch), "");
        switch.set_transmit(2, false).unwrap();
        assert_eq!(host_text(&mut switch), "!1s5;");
    }
}

// ============================================================================
// Relay and inhibit outputs
// ============================================================================

mod output_tests {
    use super::*;

    #[test]
    fn relay_status_empty() {
        let mut switch = operating();
        switch.feed(b"|;");
        assert_eq!(host_text(&mut switch), "|00000000000;");
    }

    #[test]
    fn relay_status_reflects_receive_relays() {
        let mut switch = operating();
        switch.feed(b"!1T5AB;");
        switch.drain_events();
        switch.feed(b"|;");
        assert_eq!(host_text(&mut switch), "|0m000000000;");
    }

    #[test]
    fn transmit_relays_while_keyed() {
        let mut switch = operating();
        switch.feed(b"!1T51;!1R62;&F56;");
        // Fast pair only takes effect on the next commit
        switch.feed(b"!1R62;");
        switch.drain_events();
        assert_eq!(switch.actual_relays(), relays(&[2]));

        switch.set_transmit(1, true).unwrap();
        assert_eq!(switch.actual_relays(), relays(&[1]));
    }

    #[test]
    fn global_relays_from_station_zero() {
        let mut switch = operating();
        switch.feed(b"!0T0123;|;");
        assert_eq!(host_text(&mut switch), "|E0000000000;");
    }

    #[test]
    fn inhibited_station_shows_in_board_status() {
        let mut switch = operating();
        switch.feed(b"(3;\"B;");
        let expected = format!("\"BRRIRRR{};", "}".repeat(3 * STATIONS));
        assert_eq!(host_text(&mut switch), expected);
        assert!(switch.inhibits().contains(station(3)));

        switch.feed(b")3;");
        assert!(!switch.inhibits().contains(station(3)));
    }

    #[test]
    fn board_status_shows_antennas_and_transmitters() {
        let mut switch = operating();
        switch.feed(b"!1T5;!2A7;");
        switch.set_transmit(1, true).unwrap();
        switch.drain_events();
        switch.feed(b"\"B;");
        assert_eq!(
            host_text(&mut switch),
            "\"BTRRRRR5}}}}}5}}}}}}7}}}};"
        );
    }

    #[test]
    fn cross_inhibit_while_transmitting() {
        let mut switch = operating();
        switch.feed(b"~123;");
        switch.set_transmit(1, true).unwrap();
        let (_, inhibits) = last_relay_update(&switch.drain_events()).unwrap();
        assert_eq!(inhibits, [station(2), station(3)].into_iter().collect());

        switch.set_transmit(1, false).unwrap();
        assert!(switch.inhibits().is_empty());
    }

    #[test]
    fn transmit_only_inhibit_type() {
        let mut switch = operating();
        switch.feed(b"=T2;(2;");
        assert!(switch.inhibits().contains(station(2)));

        switch.set_transmit(2, true).unwrap();
        assert!(!switch.inhibits().contains(station(2)));
    }

    #[test]
    fn inhibit_polarity_query() {
        let mut switch = operating();
        switch.feed(b"^E24;\"I;");
        assert_eq!(host_text(&mut switch), "\"I24;");
        switch.feed(b"^I2;\"I;^1;\"I;^0;\"I;");
        assert_eq!(host_text(&mut switch), "\"I4;\"I123456;\"I;");
    }

    #[test]
    fn latches_fire_on_transmit() {
        let mut switch = operating();
        switch.feed(b"!1S0W;!2C0W;");
        switch.set_transmit(1, true).unwrap();
        assert!(switch.actual_relays().contains(Relay::new(32).unwrap()));

        switch.set_transmit(1, false).unwrap();
        assert!(switch.actual_relays().contains(Relay::new(32).unwrap()));

        switch.set_transmit(2, true).unwrap();
        assert!(!switch.actual_relays().contains(Relay::new(32).unwrap()));
    }

    #[test]
    fn alternate_antenna_reported_and_driven() {
        let mut switch = operating();
        switch.feed(b"@12;!2A7B;");
        assert_eq!(host_text(&mut switch), "");

        switch.feed(b"!1T5;");
        assert_eq!(host_text(&mut switch), "!1S5;!2A7;");

        switch.set_transmit(1, true).unwrap();
        assert!(switch.actual_relays().contains(Relay::new(11).unwrap()));
    }

    #[test]
    fn conflicting_alternate_drives_no_relays() {
        let mut switch = operating();
        switch.feed(b"%C57;@12;!2A7B;!1T5;");
        assert_eq!(host_text(&mut switch), "!1S5;!2a7;");

        switch.set_transmit(1, true).unwrap();
        assert!(switch.actual_relays().is_empty());
    }

    #[test]
    fn extra_relays_commit_in_receive() {
        let mut switch = Switch::new();
        switch.feed(b"*X1;");
        switch.set_transmit(1, true).unwrap();
        switch.drain_events();

        switch.feed(b"!1X5C;");
        assert_eq!(host_text(&mut switch), "");

        switch.set_transmit(1, false).unwrap();
        assert_eq!(host_text(&mut switch), "!1X;");
        assert_eq!(switch.state().station(station(1)).actual_tx.relays, relays(&[12]));
    }

    #[test]
    fn transmit_receive_events() {
        let mut switch = Switch::new();
        switch.feed(b"*T1;");
        switch.drain_events();
        switch.set_transmit(3, true).unwrap();
        switch.set_transmit(3, false).unwrap();
        assert_eq!(host_text(&mut switch), "<3};>3};");
    }

    #[test]
    fn unit_id_reply() {
        let mut switch = operating();
        switch.feed(b":42;:;:4x;:;");
        assert_eq!(host_text(&mut switch), ":10142;:10142;?A;:10142;");
    }

    #[test]
    fn reset_returns_to_power_on() {
        let mut switch = operating();
        switch.feed(b"!1T5;(2;");
        switch.drain_events();

        switch.feed(b"*0;");
        let events = switch.drain_events();
        assert_eq!(
            events,
            vec![SwitchEvent::RelayUpdate {
                relays: RelaySet::EMPTY,
                inhibits: StationSet::ALL,
            }]
        );
        assert_eq!(switch.state(), Switch::new().state());
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SwitchOutput for Recorder {
        fn write(&mut self, text: &str) {
            self.calls.push(format!("write {text}"));
        }

        fn relay_update(&mut self, relays: RelaySet, inhibits: StationSet) {
            self.calls
                .push(format!("relays {:x} inhibits {:06b}", relays.bits(), inhibits.bits()));
        }

        fn antenna_update(&mut self, tx: &[Antenna; STATIONS], _rx: &[Antenna; STATIONS]) {
            self.calls.push(format!("antennas tx1={}", tx[0]));
        }
    }

    #[test]
    fn callbacks_delivered_in_order() {
        let mut switch = operating();
        switch.feed(b"!1T5;");
        let mut recorder = Recorder::default();
        switch.flush_to(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                "write !1S5;".to_string(),
                "antennas tx1=5".to_string(),
                "relays 0 inhibits 000000".to_string(),
            ]
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    const COMMAND_BYTES: &[u8] = b"!\"%&'()~^=/*:_@|#$;0123456789ABCFTRSXcfsWIEa{}";

    fn command_stream() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(proptest::sample::select(COMMAND_BYTES.to_vec()), 0..300)
    }

    fn keying() -> impl Strategy<Value = Vec<(u8, bool)>> {
        proptest::collection::vec((1u8..=6, any::<bool>()), 0..8)
    }

    fn run(input: &[u8], keys: &[(u8, bool)]) -> (Switch, Vec<SwitchEvent>) {
        let mut switch = Switch::new();
        switch.feed(b"*AXT1;");
        let chunk = input.len() / (keys.len() + 1) + 1;
        for (i, part) in input.chunks(chunk).enumerate() {
            switch.feed(part);
            if let Some(&(station, active)) = keys.get(i) {
                switch.set_transmit(station, active).unwrap();
            }
        }
        let events = switch.drain_events();
        (switch, events)
    }

    proptest! {
        #[test]
        fn tables_stay_symmetric(input in command_stream()) {
            let (switch, _) = run(&input, &[]);
            let state = switch.state();
            for a in 0..64 {
                for b in 0..64 {
                    prop_assert_eq!(
                        state.conflicts.contains(antenna(a), antenna(b)),
                        state.conflicts.contains(antenna(b), antenna(a))
                    );
                    prop_assert_eq!(
                        state.fast.contains(antenna(a), antenna(b)),
                        state.fast.contains(antenna(b), antenna(a))
                    );
                }
            }
        }

        #[test]
        fn same_input_same_output(input in command_stream(), keys in keying()) {
            let (first, first_events) = run(&input, &keys);
            let (second, second_events) = run(&input, &keys);
            prop_assert_eq!(first_events, second_events);
            prop_assert_eq!(first.state(), second.state());
        }

        #[test]
        fn actual_transmit_follows_current(input in command_stream(), keys in keying()) {
            let (switch, _) = run(&input, &keys);
            for s in &switch.state().stations {
                prop_assert_eq!(s.actual_tx.antenna, s.current_tx.antenna);
                prop_assert_eq!(s.actual_tx.relays, s.current_tx.relays | s.current_extra);
            }
        }

        #[test]
        fn every_reply_is_terminated(input in command_stream()) {
            let (_, events) = run(&input, &[]);
            for text in events.iter().filter_map(SwitchEvent::wire_text) {
                prop_assert!(text.ends_with(';'));
                prop_assert_eq!(text.matches(';').count(), 1);
            }
        }
    }
}
