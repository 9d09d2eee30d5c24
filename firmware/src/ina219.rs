// Interface over i2c to the INA219 current shunt monitor

use bitfield::bitfield;
use embedded_hal::i2c::I2c;

use shared::ina219::{bus_volts, shunt_volts};

const ADDRESS: u8 = 0x40;

pub fn configure<T: I2c>(i2c: &mut T) -> Result<(), T::Error> {
    let mut config = Config(0x0000);
    config.set_bus_range(false); // 16V bus range
    config.set_pg(0b11); // /8 shunt gain, +/-320mV
    config.set_badc(0b0011); // 12 bit bus conversions
    config.set_sadc(0b0011); // 12 bit shunt conversions
    config.set_mode(0b111); // continuous shunt and bus
    write_reg(i2c, Register::Config, config.0)?;

    // current and power registers stay uncalibrated, inductor current is
    // derived from the shunt reading instead
    write_reg(i2c, Register::Calibration, 0x0000)
}

pub fn shunt_voltage<T: I2c>(i2c: &mut T) -> Result<f32, T::Error> {
    Ok(shunt_volts(read_reg(i2c, Register::ShuntVoltage)?))
}

pub fn bus_voltage<T: I2c>(i2c: &mut T) -> Result<f32, T::Error> {
    Ok(bus_volts(read_reg(i2c, Register::BusVoltage)?))
}

fn write_reg<T: I2c>(i2c: &mut T, register: Register, value: u16) -> Result<(), T::Error> {
    let bytes = value.to_be_bytes();
    i2c.write(ADDRESS, &[register as u8, bytes[0], bytes[1]])
}

fn read_reg<T: I2c>(i2c: &mut T, register: Register) -> Result<u16, T::Error> {
    let mut buffer = [0u8; 2];
    i2c.write_read(ADDRESS, &[register as u8], &mut buffer)?;
    Ok(u16::from_be_bytes(buffer))
}

#[repr(u8)]
#[allow(dead_code)]
enum Register {
    Config = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
}

bitfield! {
    struct Config(u16);
    impl Debug;
    reset, set_reset: 15;
    bus_range, set_bus_range: 13;
    pg, set_pg: 12, 11;
    badc, set_badc: 10, 7;
    sadc, set_sadc: 6, 3;
    mode, set_mode: 2, 0;
}
