#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub kp: f32,
    pub ki: f32,
    pub integral_limit: f32,
    pub output_min: f32,
    pub output_max: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pi {
    pub config: Config,

    pub target: f32,
    pub error: f32,
    pub i: f32,

    pub output: f32,
}

impl Pi {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn update(&mut self, measured: f32, target: f32) -> f32 {
        self.target = target;

        self.error = self.target - measured;
        let cfg = &self.config;

        // accumulator error, not error * dt - gains are tuned for the fixed tick rate
        let i = self.i + self.error;
        self.i = i.clamp(-cfg.integral_limit, cfg.integral_limit);

        self.output = (cfg.kp * self.error + cfg.ki * self.i).clamp(cfg.output_min, cfg.output_max);
        self.output
    }

    pub fn reset(&mut self) {
        self.target = 0.0;
        self.error = 0.0;
        self.i = 0.0;

        self.output = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pi() -> Pi {
        Pi::new(Config {
            kp: 100.0,
            ki: 300.0,
            integral_limit: 10_000.0,
            output_min: 0.0,
            output_max: 64_536.0,
        })
    }

    #[test]
    fn no_error_no_output() {
        let mut pi = test_pi();
        assert_eq!(pi.update(0.0, 0.0), 0.0);
        assert_eq!(pi.i, 0.0);
    }

    #[test]
    fn single_step_output() {
        let mut pi = test_pi();
        // error 1.5 from a zeroed integral: kp*1.5 + ki*1.5
        let out = pi.update(0.0, 1.5);
        assert_eq!(pi.error, 1.5);
        assert_eq!(pi.i, 1.5);
        assert_eq!(out, (100.0 + 300.0) * 1.5);
    }

    #[test]
    fn integral_clamps() {
        let mut pi = test_pi();
        for _ in 0..10_000 {
            pi.update(0.0, 1.5);
        }
        assert_eq!(pi.i, 10_000.0);

        for _ in 0..20_000 {
            pi.update(1.5, 0.0);
        }
        assert_eq!(pi.i, -10_000.0);
    }

    #[test]
    fn output_saturates_at_bounds() {
        let mut pi = test_pi();
        assert_eq!(pi.update(0.0, 1_000.0), 64_536.0);

        let mut pi = test_pi();
        assert_eq!(pi.update(1_000.0, 0.0), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut pi = test_pi();
        pi.update(0.0, 1.5);
        pi.reset();
        assert_eq!(pi.target, 0.0);
        assert_eq!(pi.error, 0.0);
        assert_eq!(pi.i, 0.0);
        assert_eq!(pi.output, 0.0);
    }
}
