use log::{debug, info};

use canonical_error::{CanonicalError, failed_precondition_error, not_found_error};

use crate::chip::{ChipDescriptor, ChipId};
use crate::chips;
use crate::hdr_distributor::RatioPolicy;
use crate::register_port::{read_field, RegisterPort};
use crate::sensor_driver::SensorDriver;
use crate::streaming::SensorSession;

// Returns a driver for the sensor chip named `chip` (e.g. "imx334", case
// insensitive) talking over `port`. The connection is not checked; call
// check_connection() on the result when real hardware is attached.
pub fn select_sensor<P>(chip: &str, port: P, policy: RatioPolicy)
                        -> Result<Box<dyn SensorDriver + Send>, CanonicalError>
where P: RegisterPort + Send + 'static
{
    let id: ChipId = chip.parse().map_err(|e: String| not_found_error(&e))?;
    let descriptor = chips::descriptor(id);
    debug!("Selected {} for '{}'", descriptor.model, chip);
    Ok(Box::new(SensorSession::with_ratio_policy(descriptor, port, policy)))
}

// Probes the chip id register of every supported sensor type on `port` and
// returns a driver for the first one that answers with its expected id.
pub fn detect_sensor<P>(mut port: P, policy: RatioPolicy)
                        -> Result<Box<dyn SensorDriver + Send>, CanonicalError>
where P: RegisterPort + Send + 'static
{
    let mut found: Option<&'static ChipDescriptor> = None;
    for chip in chips::all() {
        let value = read_field(&mut port, &chip.chip_id_field)
            .map_err(|e| failed_precondition_error(&e.to_string()))?;
        if value == chip.chip_id_value {
            found = Some(chip);
            break;
        }
    }
    match found {
        None => Err(not_found_error("No supported sensor found")),
        Some(chip) => {
            info!("Detected {}", chip.model);
            Ok(Box::new(SensorSession::with_ratio_policy(chip, port, policy)))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ExposureChannel;
    use crate::simulated_port::SimulatedPort;

    #[test]
    fn select_by_name() {
        let mut sensor = select_sensor("IMX334", SimulatedPort::new(),
                                       RatioPolicy::default()).unwrap();
        assert_eq!(sensor.chip(), ChipId::Imx334);
        assert_eq!(sensor.model(), "Sony IMX334");
        sensor.set_mode(0).unwrap();
        assert!(sensor.set_gain(ExposureChannel::Linear, 2.0).unwrap() > 1.9);
    }

    #[test]
    fn unknown_chip_not_found() {
        assert!(select_sensor("imx999", SimulatedPort::new(), RatioPolicy::default()).is_err());
    }

    #[test]
    fn detect_by_chip_id() {
        let port = SimulatedPort::with_registers(&[(0x0016, 0x06), (0x0017, 0x81)]);
        let sensor = detect_sensor(port, RatioPolicy::default()).unwrap();
        assert_eq!(sensor.chip(), ChipId::Imx681);
        assert!(detect_sensor(SimulatedPort::new(), RatioPolicy::default()).is_err());
    }

    #[test]
    fn wrong_state_is_failed_precondition() {
        let mut sensor = select_sensor("ar0820", SimulatedPort::new(),
                                       RatioPolicy::default()).unwrap();
        assert!(sensor.exposure_control(1.0, 0.01, &[]).is_err());
    }
}
