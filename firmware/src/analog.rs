// One-shot ADC acquisition of the two rail dividers and the reference pot

use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO0, GPIO1, GPIO2};
use esp_hal::Blocking;

pub struct Analog<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    va: AdcPin<GPIO0<'d>, ADC1<'d>>,
    vb: AdcPin<GPIO1<'d>, ADC1<'d>>,
    vpot: AdcPin<GPIO2<'d>, ADC1<'d>>,
}

impl<'d> Analog<'d> {
    pub fn new(adc: ADC1<'d>, va: GPIO0<'d>, vb: GPIO1<'d>, vpot: GPIO2<'d>) -> Self {
        let mut config = AdcConfig::new();
        let va = config.enable_pin(va, Attenuation::_11dB);
        let vb = config.enable_pin(vb, Attenuation::_11dB);
        let vpot = config.enable_pin(vpot, Attenuation::_11dB);

        Self {
            adc: Adc::new(adc, config),
            va,
            vb,
            vpot,
        }
    }

    pub fn read_va(&mut self) -> u16 {
        scale(nb::block!(self.adc.read_oneshot(&mut self.va)).unwrap())
    }

    pub fn read_vb(&mut self) -> u16 {
        scale(nb::block!(self.adc.read_oneshot(&mut self.vb)).unwrap())
    }

    pub fn read_vpot(&mut self) -> u16 {
        scale(nb::block!(self.adc.read_oneshot(&mut self.vpot)).unwrap())
    }
}

// the SAR gives 12 bits, the control math runs on full-scale 16 bit counts
fn scale(raw: u16) -> u16 {
    raw << 4
}
