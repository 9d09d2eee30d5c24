#![no_std]
#![no_main]

use core::cell::RefCell;

use critical_section::Mutex;
use esp_backtrace as _;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::{handler, main};
use esp_hal::ledc::channel::{self, ChannelIFace};
use esp_hal::ledc::timer::{self, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::time::{Duration, Rate};
use esp_hal::timer::timg::TimerGroup;
use esp_hal::timer::PeriodicTimer;
use esp_hal::Blocking;
use esp_println::println;
use zerocopy::IntoBytes;

use shared::control::{self, Config, Inputs};
use shared::state::State;
use shared::tick::TickFlag;

mod analog;
mod ina219;
mod pwm;

use analog::Analog;
use pwm::Pwm;

const LOOP_RATE_HZ: u32 = 1_000;
const SWITCHING_FREQ_KHZ: u32 = 100;

static LOOP_TIMER: Mutex<RefCell<Option<PeriodicTimer<'static, Blocking>>>> =
    Mutex::new(RefCell::new(None));
static LOOP_TICK: TickFlag = TickFlag::new();

// Runs in interrupt context at the loop rate. Clears the timer and raises the
// pending-tick flag, nothing else.
#[handler]
fn on_tick() {
    critical_section::with(|cs| {
        if let Some(timer) = LOOP_TIMER.borrow_ref_mut(cs).as_mut() {
            timer.clear_interrupt();
        }
    });
    LOOP_TICK.raise();
}

#[main]
fn main() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());

    // a broken configuration must never reach the converter
    let cfg = Config::default();
    cfg.validate().unwrap();

    let mut analog = Analog::new(
        peripherals.ADC1,
        peripherals.GPIO0,
        peripherals.GPIO1,
        peripherals.GPIO2,
    );

    let cl_pin = Input::new(peripherals.GPIO20, InputConfig::default().with_pull(Pull::Up));
    let bu_pin = Input::new(peripherals.GPIO21, InputConfig::default().with_pull(Pull::Up));

    let mut i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO10)
    .with_scl(peripherals.GPIO8);

    ina219::configure(&mut i2c).unwrap();
    match ina219::bus_voltage(&mut i2c) {
        Ok(v) => println!("ina219 up, bus = {} V", v),
        Err(_) => println!("ina219 bus voltage read failed"),
    }

    let mut ledc = Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

    let mut pwm_timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    pwm_timer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty8Bit,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_khz(SWITCHING_FREQ_KHZ),
        })
        .unwrap();

    let mut pwm_channel = ledc.channel::<LowSpeed>(channel::Number::Channel0, peripherals.GPIO9);
    pwm_channel
        .configure(channel::config::Config {
            timer: &pwm_timer,
            duty_pct: 0,
            pin_config: channel::config::PinConfig::PushPull,
        })
        .unwrap();
    let mut pwm = Pwm::new(pwm_channel);

    let mut state = State::new(&cfg);
    pwm.write_duty(control::hardware_duty(&cfg, state.duty));

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let mut loop_timer = PeriodicTimer::new(timg0.timer0);
    loop_timer.set_interrupt_handler(on_tick);
    loop_timer
        .start(Duration::from_micros(1_000_000 / LOOP_RATE_HZ as u64))
        .unwrap();
    loop_timer.enable_interrupt(true);
    critical_section::with(|cs| {
        LOOP_TIMER.borrow_ref_mut(cs).replace(loop_timer);
    });

    println!("control loop up at {} Hz", LOOP_RATE_HZ);

    let mut v_shunt = 0.0f32;
    loop {
        if !LOOP_TICK.take() {
            continue;
        }

        // hold the last good reading across a failed bus transaction
        if let Ok(v) = ina219::shunt_voltage(&mut i2c) {
            v_shunt = v;
        }

        let inputs = Inputs {
            va_raw: analog.read_va(),
            vb_raw: analog.read_vb(),
            vpot_raw: analog.read_vpot(),
            cl: cl_pin.is_high(),
            bu: bu_pin.is_high(),
            v_shunt,
        };

        let was_over_current = state.over_current;
        let was_mode = state.mode;

        let telemetry = control::run(&mut state, &cfg, &inputs);
        pwm.write_duty(telemetry.hardware_duty);

        if telemetry.over_current && !was_over_current {
            println!("over current: iL = {} A", telemetry.i_l);
        }
        if state.mode != was_mode {
            println!("mode: {:?}", state.mode);
        }

        esp_println::Printer::write_bytes(telemetry.as_bytes());
    }
}
