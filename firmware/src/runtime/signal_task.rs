use super::SIGNAL_QUEUE;
use crate::lights::GpioLights;
use crate::signal;
use crate::time::FirmwareInstant;
use controller_core::config::ControllerConfig;
use controller_core::runtime::SignalRuntime;

#[embassy_executor::task]
pub async fn run(lights: GpioLights<'static>) -> ! {
    let runtime = SignalRuntime::start(ControllerConfig::new(), lights, FirmwareInstant::now());
    defmt::info!("signal: controller started");
    signal::drive(runtime, SIGNAL_QUEUE.receiver()).await
}
