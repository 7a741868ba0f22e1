// End-to-end exposure scenarios against the simulated register file.

use isi_sensor::chip::ChipId;
use isi_sensor::chips;
use isi_sensor::error::IsiError;
use isi_sensor::hdr_distributor::RatioPolicy;
use isi_sensor::mode::ExposureChannel;
use isi_sensor::register_port::reg;
use isi_sensor::simulated_port::SimulatedPort;
use isi_sensor::streaming::{SensorSession, StreamingState};

fn configured(chip: ChipId, mode: usize) -> SensorSession<SimulatedPort> {
    let mut session = SensorSession::create(chips::descriptor(chip), SimulatedPort::new());
    session.set_mode(mode).unwrap();
    session.port_mut().clear_log();
    session
}

#[test]
fn linear_integration_time() {
    let mut s = configured(ChipId::Os08a20, 0);
    let first = s.exposure_control(1.0, 0.01, &[]).unwrap();
    assert!((first.integration_time - 278.0 * 0.000_036).abs() < 1e-7);
    assert_eq!(first.frames_to_skip, 1);
    // 278 lines in the two exposure registers.
    assert_eq!(s.port().register(0x3501), 0x01);
    assert_eq!(s.port().register(0x3502), 0x16);

    let writes = s.port().write_count();
    let repeat = s.exposure_control(1.0, 0.01, &[]).unwrap();
    assert_eq!(repeat.frames_to_skip, 0);
    assert_eq!(repeat.integration_time, first.integration_time);
    assert_eq!(s.port().write_count(), writes);
}

#[test]
fn two_channel_stitch_over_budget() {
    let mut s = configured(ChipId::Os08a20, 1);
    let budget = 1240.0 * 0.000_063_06;
    let result = s.exposure_control(1.0, 0.02, &[16.0]).unwrap();

    let long_time = s.get_integration_time(ExposureChannel::Long).unwrap();
    let short_time = s.get_integration_time(ExposureChannel::Short).unwrap();
    assert!((long_time - budget * 16.0 / 17.0).abs() <= 0.000_063_06);
    assert!((short_time - budget / 17.0).abs() <= 0.000_063_06);
    assert!(long_time + short_time <= budget * (1.0 + 1e-5));

    let long_gain = s.get_gain(ExposureChannel::Long).unwrap();
    let short_gain = s.get_gain(ExposureChannel::Short).unwrap();
    assert!((long_gain - 4.35).abs() < 0.02, "long gain {}", long_gain);
    assert!((short_gain - 4.35).abs() < 0.02, "short gain {}", short_gain);

    // The reported values are the short (reference) channel's.
    assert_eq!(result.gain, short_gain);
    assert_eq!(result.integration_time, short_time);
}

#[test]
fn very_short_cap_absorbed_as_gain() {
    let mut s = configured(ChipId::Ov10652, 0);
    let result = s.exposure_control(1.0, 0.001, &[4.0, 4.0]).unwrap();
    let cap = 8.0 * 0.000_029_2;
    assert_eq!(result.integration_time, cap);
    assert!(result.gain > 4.0, "very short gain {}", result.gain);
    let applied = result.gain * result.integration_time;
    assert!((applied - 0.001).abs() < 0.001 * 0.01, "applied exposure {}", applied);

    // Long and short windows still carry their exposure as time.
    let long = s.get_integration_time(ExposureChannel::Long).unwrap();
    assert!((long - 0.016).abs() <= 0.000_029_2);
    assert_eq!(s.get_gain(ExposureChannel::Long).unwrap(), 1.0);
}

#[test]
fn gain_rounding_onto_next_rung() {
    let mut s = configured(ChipId::Os08a20, 0);
    assert_eq!(s.set_gain(ExposureChannel::Linear, 1.9997).unwrap(), 2.0);
    assert_eq!(s.port().register(0x3508), 0x01);
    assert_eq!(s.port().register(0x350a), 0x04);
    assert_eq!(s.port().register(0x350b), 0x00);
    assert_eq!(s.set_gain(ExposureChannel::Linear, 3.9995).unwrap(), 4.0);
    assert_eq!(s.port().register(0x3508), 0x03);
    assert_eq!(s.port().register(0x350a), 0x04);
}

#[test]
fn gain_below_unity_floors() {
    let mut s = configured(ChipId::Os02k10, 0);
    assert_eq!(s.set_gain(ExposureChannel::Linear, 0.5).unwrap(), 1.0);
    assert_eq!(s.get_gain(ExposureChannel::Linear).unwrap(), 1.0);
    let writes = s.port().write_count();
    assert_eq!(s.set_gain(ExposureChannel::Linear, 1.0).unwrap(), 1.0);
    assert_eq!(s.port().write_count(), writes);
}

#[test]
fn set_mode_rejected_while_streaming() {
    let mut s = configured(ChipId::Ov2775, 0);
    s.set_streaming(true).unwrap();
    s.port_mut().clear_log();
    assert_eq!(s.set_mode(2).unwrap_err(), IsiError::WrongState(StreamingState::Streaming));
    assert_eq!(s.port().write_count(), 0);
    assert_eq!(s.state(), StreamingState::Streaming);
}

#[test]
fn set_mode_allowed_again_after_stream_off() {
    let mut s = configured(ChipId::Ov2775, 0);
    s.set_streaming(true).unwrap();
    s.set_streaming(false).unwrap();
    assert_eq!(s.set_mode(2).unwrap().index, 2);
    assert!(s.set_gain(ExposureChannel::Hcg, 2.0).is_err());
    assert_eq!(s.set_gain(ExposureChannel::Linear, 2.0).unwrap(), 2.0);
}

#[test]
fn three_channel_stitch() {
    let mut s = configured(ChipId::Ar0820, 2);
    let result = s.exposure_control(1.0, 0.000_1, &[4.0, 8.0]).unwrap();
    let line = 0.000_014_8;
    assert_eq!(s.get_integration_time(ExposureChannel::Long).unwrap(), 216.0 * line);
    assert_eq!(s.get_integration_time(ExposureChannel::Short).unwrap(), 54.0 * line);
    assert_eq!(result.integration_time, 7.0 * line);
    assert_eq!(result.gain, 1.0);
    assert_eq!(result.frames_to_skip, 2);
    assert_eq!(s.cur_hdr_ratio().unwrap(), vec![4.0, 8.0]);
}

#[test]
fn native_dual_conversion_gain() {
    let mut s = configured(ChipId::Ov2775, 0);
    s.exposure_control(1.0, 0.000_5, &[4.0, 16.0]).unwrap();
    let hcg = s.get_integration_time(ExposureChannel::Hcg).unwrap();
    let lcg = s.get_integration_time(ExposureChannel::Lcg).unwrap();
    assert_eq!(hcg, lcg);
    assert_eq!(s.get_gain(ExposureChannel::Hcg).unwrap(), 4.0);
    assert_eq!(s.get_gain(ExposureChannel::Lcg).unwrap(), 1.0);

    let info = s.ae_base_info().unwrap();
    assert!(info.native_mode);
    assert!(!info.stitching_mode);
    assert!((info.native_hdr_ratio[0] - 4.0).abs() < 1e-4);
}

#[test]
fn zero_ratio_substitutes_default() {
    let mut s = configured(ChipId::Os08a20, 1);
    s.exposure_control(1.0, 0.001, &[0.0]).unwrap();
    assert_eq!(s.cur_hdr_ratio().unwrap(), vec![16.0]);
}

#[test]
fn reject_policy_refuses_bad_ratio() {
    let mut s = SensorSession::with_ratio_policy(
        chips::descriptor(ChipId::Os08a20), SimulatedPort::new(), RatioPolicy::Reject);
    s.set_mode(1).unwrap();
    s.port_mut().clear_log();
    assert!(matches!(s.exposure_control(1.0, 0.001, &[-2.0]),
                     Err(IsiError::InvalidArgument(_))));
    assert_eq!(s.port().write_count(), 0);
    assert!(s.exposure_control(1.0, 0.001, &[8.0]).is_ok());
}

#[test]
fn failed_write_aborts_call() {
    let mut s = configured(ChipId::Os08a20, 0);
    s.exposure_control(2.0, 0.005, &[]).unwrap();
    let gain = s.get_gain(ExposureChannel::Linear).unwrap();
    // Group hold begin and the two exposure bytes go out, coarse gain fails.
    s.port_mut().fail_after_writes(3);
    let err = s.exposure_control(4.0, 0.01, &[]).unwrap_err();
    assert!(matches!(err, IsiError::RegisterAccess(ref e) if e.addr == 0x3508));
    assert_eq!(s.get_integration_time(ExposureChannel::Linear).unwrap(), 278.0 * 0.000_036);
    assert_eq!(s.get_gain(ExposureChannel::Linear).unwrap(), gain);

    // The failed gain is retried by the next identical request.
    s.port_mut().heal();
    s.port_mut().clear_log();
    let result = s.exposure_control(4.0, 0.01, &[]).unwrap();
    assert_eq!(result.gain, 4.0);
    assert_eq!(result.frames_to_skip, 0);
    assert_eq!(s.port().writes()[1], reg(0x3508, 0x03));
}

#[test]
fn sony_shutter_counts_from_frame_end() {
    let mut s = configured(ChipId::Imx334, 0);
    let (time, skip) = s.set_integration_time(ExposureChannel::Linear, 0.01).unwrap();
    assert_eq!(time, 676.0 * 0.000_014_8);
    assert_eq!(skip, 2);
    // SHR0 = 2250 - 676 = 0x0626, least significant byte first.
    assert_eq!(s.port().writes(), &[reg(0x3001, 0x01), reg(0x3058, 0x26),
                                    reg(0x3059, 0x06), reg(0x305a, 0x00),
                                    reg(0x3001, 0x00)]);
}

#[test]
fn very_short_fractional_lines() {
    let mut s = configured(ChipId::Ov10652, 0);
    let (time, _) = s.set_integration_time(
        ExposureChannel::VeryShort, 2.25 * 0.000_029_2).unwrap();
    assert_eq!(time, 72.0 * 0.000_029_2 / 32.0);
    assert_eq!(s.port().register(0x30ea), 0x00);
    assert_eq!(s.port().register(0x30eb), 72);
}

#[test]
fn release_forces_stream_off() {
    let mut s = configured(ChipId::Ar0820, 0);
    s.set_streaming(true).unwrap();
    s.release().unwrap();
    assert_eq!(s.port().writes().last(), Some(&reg(0x301a, 0x0058)));
    assert_eq!(s.get_gain(ExposureChannel::Linear).unwrap_err(), IsiError::WrongHandle);
    assert_eq!(s.set_streaming(true).unwrap_err(), IsiError::WrongHandle);
}

#[test]
fn drop_while_streaming_stops_sensor() {
    let mut port = SimulatedPort::new();
    {
        let mut s = SensorSession::create(chips::descriptor(ChipId::Imx681), &mut port);
        s.set_mode(1).unwrap();
        s.set_streaming(true).unwrap();
    }
    assert_eq!(port.writes().last(), Some(&reg(0x0100, 0x00)));
}

#[test]
fn every_chip_runs_every_mode() {
    for chip in chips::all() {
        for mode in chip.modes.iter() {
            let mut s = SensorSession::create(chip, SimulatedPort::new());
            s.set_mode(mode.index).unwrap();
            s.set_streaming(true).unwrap();
            for (gain, time) in [(1.0, 0.001), (3.0, 0.02), (64.0, 1.0), (0.5, 0.0)] {
                let result = s.exposure_control(gain, time, &[8.0, 4.0]).unwrap();
                assert!(result.gain >= 1.0, "{} {}", chip.id, mode);
                assert!(result.integration_time > 0.0, "{} {}", chip.id, mode);
            }
            assert_eq!(s.ae_base_info().unwrap().channels.len(), mode.channels.len());
        }
    }
}
