use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_sync::channel::Channel;
use static_cell::StaticCell;

use crate::lights::{self, GpioLights};
use crate::signal::SignalQueue;
use crate::usb;
use controller_core::debounce::Button;

mod button_task;
mod signal_task;
mod usb_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static SIGNAL_QUEUE: SignalQueue = Channel::new();
pub(super) static USB_STORAGE: StaticCell<usb::UsbDeviceStorage> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA6,
        PA7,
        PA8,
        PB4,
        PB5,
        EXTI4,
        EXTI5,
        USB,
        PA11,
        PA12,
        ..
    } = hal::init(config);

    let lights = GpioLights::new(
        Output::new(PA6, Level::Low, Speed::Low),
        Output::new(PA7, Level::Low, Speed::Low),
        Output::new(PA8, Level::Low, Speed::Low),
    );
    lights::log_pin_map();

    spawner
        .spawn(signal_task::run(lights))
        .expect("failed to spawn signal task");

    spawner
        .spawn(button_task::run(
            ExtiInput::new(PB4, EXTI4, Pull::Down),
            Button::Toggle,
        ))
        .expect("failed to spawn toggle button task");
    spawner
        .spawn(button_task::run(
            ExtiInput::new(PB5, EXTI5, Pull::Down),
            Button::Pedestrian,
        ))
        .expect("failed to spawn pedestrian button task");

    spawner
        .spawn(usb_task::run(USB, PA12, PA11))
        .expect("failed to spawn USB task");

    core::future::pending::<()>().await;
}
