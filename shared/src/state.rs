use zerocopy::{Immutable, IntoBytes, KnownLayout, TryFromBytes};

use crate::control::Config;
use crate::filter::MovingAverage;
use crate::pi::{self, Pi};

/// Depth of the reference pot filter: 100 samples at 1kHz is a 100ms window.
pub const POT_FILTER_DEPTH: usize = 100;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, TryFromBytes, Immutable, Default)]
pub enum Mode {
    #[default]
    OpenLoop,
    ClosedLoop,
}

/// Converter state that survives between ticks. Owned by the control loop,
/// mutated exactly once per serviced tick.
#[derive(Debug, Clone, Copy)]
pub struct State {
    pub tick: u32,
    pub mode: Mode,

    pub filter: MovingAverage<POT_FILTER_DEPTH>,
    pub i_ctrl: Pi,

    /// Last commanded duty, before the hardware polarity inversion.
    pub duty: u16,
    /// Diagnostic only, never gates the control law.
    pub over_current: bool,
}

impl State {
    pub fn new(cfg: &Config) -> Self {
        Self {
            tick: 0,
            mode: Mode::OpenLoop,
            filter: MovingAverage::new(),
            i_ctrl: Pi::new(pi::Config {
                kp: cfg.kp,
                ki: cfg.ki,
                integral_limit: cfg.integral_limit,
                output_min: cfg.min_pwm as f32,
                output_max: cfg.max_pwm as f32,
            }),
            duty: cfg.min_pwm,
            over_current: false,
        }
    }
}

/// Per-cycle record, streamed raw out the console channel each serviced tick.
#[derive(Debug, Clone, Copy, IntoBytes, TryFromBytes, Immutable, KnownLayout, Default)]
pub struct Telemetry {
    pub tick: u32,
    pub mode: Mode,

    pub va: f32,
    pub vb: f32,
    pub vpot: f32,

    pub i_l: f32,
    pub i_ref: f32,
    pub i_err: f32,
    pub i_int: f32,
    pub pi_out: f32,

    pub pwm_ref: u16,
    pub duty: u16,
    pub hardware_duty: u32,

    pub over_current: bool,
    pub integral_clamped: bool,
    pub cl: bool,
    pub bu: bool,
}
