// LEDC-backed PWM output stage

use esp_hal::ledc::channel::{Channel, ChannelHW};
use esp_hal::ledc::LowSpeed;

use shared::control::PWM_FULL_SCALE;

/// Timer resolution configured in main. 8 bits is what the LEDC can divide
/// down to at the 100kHz switching frequency.
pub const DUTY_BITS: u32 = 8;

pub struct Pwm<'d> {
    channel: Channel<'d, LowSpeed>,
}

impl<'d> Pwm<'d> {
    pub fn new(channel: Channel<'d, LowSpeed>) -> Self {
        Self { channel }
    }

    /// Write a duty value in counts out of 65536, rescaled to the timer
    /// resolution. 65536 counts (duty command 0 after inversion) pins the
    /// output at the top of the range.
    pub fn write_duty(&mut self, counts: u32) {
        let max_duty = (1u32 << DUTY_BITS) - 1;
        let duty = (counts.min(PWM_FULL_SCALE) * max_duty) / PWM_FULL_SCALE;
        self.channel.set_duty_hw(duty);
    }
}
