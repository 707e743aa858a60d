//! Axle - single-axis stepper controller firmware
//!
//! RP2040 firmware binary. Brings up the peripherals, loads the persisted
//! configuration, and spawns the task set: safety, motion, sync, sensor,
//! host communication, and the LED heartbeat.
//!
//! Board wiring (reference layout):
//! - GPIO10: STEP (PWM slice 5 channel A)
//! - GPIO11: DIR
//! - GPIO12: ENABLE (active-low)
//! - GPIO13: manual-step test point
//! - GPIO14: E-STOP input (active-low, pulled up)
//! - GPIO15: limit switch input (active-low, pulled up)
//! - GPIO0/1: host UART (115200 8N1)
//! - GPIO25: status LED

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::watchdog::Watchdog;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use axle_core::traits::{DriverConfig, StepGenerator};
use axle_drivers::{PwmStepper, StepDirDriver};
use axle_hal_rp2040::flash::ConfigFlash;
use axle_hal_rp2040::RpPwmTimer;

mod channels;
mod config_store;
mod tasks;

use config_store::ConfigStore;
use tasks::motion::motion_config_from;
use tasks::AxisController;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// UART buffers must live forever
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Step pulse width for the PWM generator (µs)
const STEP_PULSE_WIDTH_US: u16 = 3;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Axle firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Configuration from the last flash sector, defaults if blank
    let mut store = ConfigStore::new(ConfigFlash::new(p.FLASH));
    let axis_config = store.load_or_default();
    info!(
        "Axis config: {} steps/rev x{}, vmax={} steps/s",
        axis_config.steps_per_rev, axis_config.microsteps, axis_config.max_velocity
    );

    // Host UART
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("Host UART initialized");

    // Step generator: PWM slice 5 channel A on GPIO10
    let mut pwm_config = PwmConfig::default();
    pwm_config.enable = false;
    let pwm = Pwm::new_output_a(p.PWM_SLICE5, p.PIN_10, pwm_config);
    let mut stepper = PwmStepper::new(RpPwmTimer::new(pwm), STEP_PULSE_WIDTH_US);
    stepper.init();

    // Motor driver: dir/enable under driver control, step pin owned by the
    // PWM slice; GPIO13 serves as the manual-step test point
    let driver = StepDirDriver::new(
        Output::new(p.PIN_13, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_12, Level::High),
        Delay,
        DriverConfig::default(),
    );
    info!("Driver and pulse generator initialized");

    let mut controller = AxisController::new(motion_config_from(&axis_config));
    controller.attach_driver(driver);
    controller.attach_stepper(stepper);

    // Safety inputs and watchdog
    let watchdog = Watchdog::new(p.WATCHDOG);
    let estop = Input::new(p.PIN_14, Pull::Up);
    let limit = Input::new(p.PIN_15, Pull::Up);

    // On-die temperature sensor
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let temp_channel = AdcChannel::new_temp_sensor(p.ADC_TEMP_SENSOR);

    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(tasks::safety_task(watchdog, estop, limit)).unwrap();
    spawner.spawn(tasks::motion_task(controller, axis_config)).unwrap();
    spawner.spawn(tasks::sync_task()).unwrap();
    spawner.spawn(tasks::sensor_task(adc, temp_channel)).unwrap();
    spawner.spawn(tasks::comm_rx_task(rx)).unwrap();
    spawner.spawn(tasks::comm_tx_task(tx, store)).unwrap();
    spawner.spawn(tasks::led_task(led)).unwrap();

    info!("All tasks spawned, controller running");
}
