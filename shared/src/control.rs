// Per-tick control law for one bidirectional buck/boost channel. The loop
// passes raw samples in, the law updates State and reports everything it
// computed in a Telemetry record.

use crate::state::{Mode, State, Telemetry};

pub const ADC_FULL_SCALE: f32 = 65536.0;
pub const PWM_FULL_SCALE: u32 = 65536;

/// Calibration and tuning constants, fixed for the life of the process.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Per-channel gain trim for the two rail dividers and the pot.
    pub va_cal: f32,
    pub vb_cal: f32,
    pub vpot_cal: f32,

    /// Rail sense potential divider ratio. The pot has no divider.
    pub divider_ratio: f32,
    /// ADC reference voltage.
    pub v_ref: f32,

    pub shunt_ohms: f32,

    pub kp: f32,
    pub ki: f32,
    pub integral_limit: f32,

    /// Duty bounds, in counts out of 65536, before inversion.
    pub min_pwm: u16,
    pub max_pwm: u16,

    /// Open-loop soft limiter trips outside +/- this current.
    pub current_limit_a: f32,
    /// Counts walked per cycle while the soft limiter is active.
    pub soft_step: u16,

    /// Pot voltage at this offset maps to zero amps of current reference.
    pub i_ref_offset_v: f32,
    pub i_ref_max_a: f32,

    /// The drive stage inverts: a duty command of 0 is 65536 counts at the
    /// pin. Wiring fact on this board, not a tunable.
    pub invert_pwm: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            va_cal: 1.017,
            vb_cal: 1.015,
            vpot_cal: 1.026,
            divider_ratio: 12_490.0 / 2_490.0,
            v_ref: 3.3,
            shunt_ohms: 0.10,
            kp: 100.0,
            ki: 300.0,
            integral_limit: 10_000.0,
            min_pwm: 0,
            max_pwm: 64_536,
            current_limit_a: 2.0,
            soft_step: 10,
            i_ref_offset_v: 1.66,
            i_ref_max_a: 1.5,
            invert_pwm: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Zero or negative shunt resistance, the current derivation would divide
    /// through it.
    ShuntResistance,
    DutyBounds,
}

impl Config {
    /// Startup gate: a configuration that fails here must never reach the
    /// loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.shunt_ohms > 0.0) {
            return Err(ConfigError::ShuntResistance);
        }
        if self.min_pwm >= self.max_pwm {
            return Err(ConfigError::DutyBounds);
        }
        Ok(())
    }
}

/// Everything sampled fresh for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inputs {
    pub va_raw: u16,
    pub vb_raw: u16,
    pub vpot_raw: u16,

    /// Closed-loop enable input.
    pub cl: bool,
    /// Buck/boost select input. Read every cycle, reported in telemetry,
    /// does not alter the control law.
    pub bu: bool,

    /// Shunt voltage from the current monitor, in volts.
    pub v_shunt: f32,
}

/// Run one control cycle.
pub fn run(s: &mut State, cfg: &Config, inp: &Inputs) -> Telemetry {
    s.tick = s.tick.wrapping_add(1);

    // calibration factor * divider ratio * reference voltage * fraction of full scale
    let va = cfg.va_cal * cfg.divider_ratio * cfg.v_ref * (inp.va_raw as f32 / ADC_FULL_SCALE);
    let vb = cfg.vb_cal * cfg.divider_ratio * cfg.v_ref * (inp.vb_raw as f32 / ADC_FULL_SCALE);

    // the pot is noisy, the loop runs on the filtered value
    let vpot = s
        .filter
        .update(cfg.vpot_cal * cfg.v_ref * (inp.vpot_raw as f32 / ADC_FULL_SCALE));

    let i_l = inp.v_shunt / cfg.shunt_ohms;

    s.mode = if inp.cl { Mode::ClosedLoop } else { Mode::OpenLoop };
    let pwm_ref = regulate(s, cfg, vpot, i_l, inp.cl);

    Telemetry {
        tick: s.tick,
        mode: s.mode,
        va,
        vb,
        vpot,
        i_l,
        i_ref: s.i_ctrl.target,
        i_err: s.i_ctrl.error,
        i_int: s.i_ctrl.i,
        pi_out: s.i_ctrl.output,
        pwm_ref,
        duty: s.duty,
        hardware_duty: hardware_duty(cfg, s.duty),
        over_current: s.over_current,
        integral_clamped: s.i_ctrl.i >= cfg.integral_limit || s.i_ctrl.i <= -cfg.integral_limit,
        cl: inp.cl,
        bu: inp.bu,
    }
}

/// The two-state control law. Takes the already-filtered reference and the
/// measured inductor current, leaves the new duty in `s.duty` and returns the
/// pot position as inverted duty counts (computed in both modes so telemetry
/// always carries it).
pub fn regulate(s: &mut State, cfg: &Config, vpot: f32, i_l: f32, closed_loop: bool) -> u16 {
    // truncation, not rounding, matches the hardware counts convention
    let pwm_ref = (PWM_FULL_SCALE as i32 - ((vpot / cfg.v_ref) * ADC_FULL_SCALE) as i32)
        .clamp(cfg.min_pwm as i32, cfg.max_pwm as i32) as u16;

    if closed_loop {
        let i_ref = (vpot - cfg.i_ref_offset_v).clamp(-cfg.i_ref_max_a, cfg.i_ref_max_a);
        s.duty = s.i_ctrl.update(i_l, i_ref) as u16;
    } else {
        // keep windup from carrying into a later closed-loop entry
        s.i_ctrl.reset();

        // strict comparisons: exactly +/- the limit still passes through
        if i_l > cfg.current_limit_a {
            // too much current, walk the duty down
            s.duty = s
                .duty
                .saturating_sub(cfg.soft_step)
                .clamp(cfg.min_pwm, pwm_ref);
            s.over_current = true;
        } else if i_l < -cfg.current_limit_a {
            s.duty = s
                .duty
                .saturating_add(cfg.soft_step)
                .clamp(pwm_ref, cfg.max_pwm);
            s.over_current = true;
        } else {
            s.duty = pwm_ref;
            s.over_current = false;
        }
    }

    pwm_ref
}

/// Output-stage polarity convention, applied after all saturation. Duty 0
/// maps to 65536 counts, hence the u32.
pub fn hardware_duty(cfg: &Config, duty: u16) -> u32 {
    if cfg.invert_pwm {
        PWM_FULL_SCALE - duty as u32
    } else {
        duty as u32
    }
}
