// INA219 register decode, kept separate from the bus protocol so the scaling
// can be checked on the host.

/// Shunt voltage register: 16 bit twos complement, LSB = 10uV.
pub fn shunt_volts(reg: u16) -> f32 {
    (reg as i16) as f32 * 10e-6
}

/// Bus voltage register: 13 bit value left aligned by 3 bits, LSB = 4mV.
pub fn bus_volts(reg: u16) -> f32 {
    (reg >> 3) as f32 * 4e-3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shunt_zero() {
        assert_eq!(shunt_volts(0x0000), 0.0);
    }

    #[test]
    fn shunt_positive() {
        // 10_000 counts * 10uV = 100mV
        assert!((shunt_volts(10_000) - 0.1).abs() < 1e-7);
    }

    #[test]
    fn shunt_negative_twos_complement() {
        // -10_000 counts = -100mV
        let reg = (-10_000i16) as u16;
        assert!((shunt_volts(reg) + 0.1).abs() < 1e-7);

        assert_eq!(shunt_volts(0xFFFF), -10e-6);
    }

    #[test]
    fn bus_right_shifts_and_scales() {
        // 3000 counts * 4mV = 12V
        let reg = 3000u16 << 3;
        assert!((bus_volts(reg) - 12.0).abs() < 1e-5);

        // the three low bits are not voltage data
        assert_eq!(bus_volts(0x0007), 0.0);
    }
}
