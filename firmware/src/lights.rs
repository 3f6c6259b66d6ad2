//! Lamp outputs.
//!
//! The three lamps hang off push-pull GPIOs through active-high drivers.

use controller_core::lights::LightChannel;

/// Board pin assignment, red first.
pub const LIGHT_PINS: [(LightChannel, &str); 3] = [
    (LightChannel::Red, "PA6"),
    (LightChannel::Yellow, "PA7"),
    (LightChannel::Green, "PA8"),
];

#[cfg(target_os = "none")]
pub use hardware::GpioLights;

#[cfg(target_os = "none")]
mod hardware {
    use controller_core::lights::{LightChannel, LightDriver};
    use embassy_stm32::gpio::{Level, Output};

    pub struct GpioLights<'d> {
        red: Output<'d>,
        yellow: Output<'d>,
        green: Output<'d>,
    }

    impl<'d> GpioLights<'d> {
        pub fn new(red: Output<'d>, yellow: Output<'d>, green: Output<'d>) -> Self {
            Self { red, yellow, green }
        }

        fn output_mut(&mut self, channel: LightChannel) -> &mut Output<'d> {
            match channel {
                LightChannel::Red => &mut self.red,
                LightChannel::Yellow => &mut self.yellow,
                LightChannel::Green => &mut self.green,
            }
        }
    }

    impl LightDriver for GpioLights<'_> {
        fn set(&mut self, channel: LightChannel, active: bool) {
            let level = if active { Level::High } else { Level::Low };
            self.output_mut(channel).set_level(level);
        }
    }
}

/// Logs the pin map once at start-up.
#[cfg(target_os = "none")]
pub fn log_pin_map() {
    for (channel, pin) in LIGHT_PINS {
        defmt::info!("lights: {} on {}", channel.label(), pin);
    }
}

#[cfg(not(target_os = "none"))]
pub fn log_pin_map() {
    for (channel, pin) in LIGHT_PINS {
        println!("lights: {channel} on {pin}");
    }
}
