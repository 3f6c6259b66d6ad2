use super::SIGNAL_QUEUE;
use crate::signal::{self, SignalEvent};
use crate::time::FirmwareInstant;
use controller_core::debounce::Button;
use embassy_stm32::exti::ExtiInput;

/// Posts every rising edge with its timestamp; debouncing happens in the signal task.
#[embassy_executor::task(pool_size = 2)]
pub async fn run(mut input: ExtiInput<'static>, button: Button) -> ! {
    let sender = SIGNAL_QUEUE.sender();
    loop {
        input.wait_for_rising_edge().await;
        signal::post(&sender, SignalEvent::Edge(button, FirmwareInstant::now()));
    }
}
