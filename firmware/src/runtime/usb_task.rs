use super::{SIGNAL_QUEUE, USB_STORAGE};
use crate::console::{ChannelControl, ConsoleSession, Reply};
use crate::usb::{self, ConsolePort, UsbDeviceStrings};
use embassy_futures::join::join;
use embassy_futures::select::{Either, select};
use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_usb::class::cdc_acm::{ControlChanged, Sender};
use embassy_usb::driver::{Driver, EndpointError};

embassy_stm32::bind_interrupts!(struct UsbIrqs {
    USB_UCPD1_2 => embassy_stm32::usb::InterruptHandler<hal::peripherals::USB>;
});

#[embassy_executor::task]
pub async fn run(
    usb: Peri<'static, hal::peripherals::USB>,
    dp: Peri<'static, hal::peripherals::PA12>,
    dm: Peri<'static, hal::peripherals::PA11>,
) -> ! {
    let storage = USB_STORAGE.init(usb::UsbDeviceStorage::new());
    let driver = embassy_stm32::usb::Driver::new(usb, UsbIrqs, dp, dm);
    let (mut device, port) = usb::build(driver, storage, UsbDeviceStrings::default());

    join(device.run(), run_console(port)).await;
    loop {
        core::future::pending::<()>().await;
    }
}

async fn run_console<D>(port: ConsolePort<D>) -> !
where
    D: Driver<'static>,
{
    let ConsolePort {
        mut sender,
        mut receiver,
        control,
    } = port;
    let mut session = ConsoleSession::new(ChannelControl::new(SIGNAL_QUEUE.sender()));
    let mut ingress = [0u8; usb::MAX_PACKET_SIZE as usize];
    let mut reply = Reply::new();

    loop {
        join(receiver.wait_connection(), sender.wait_connection()).await;
        wait_for_dtr(&control, &sender).await;
        session.reset();

        defmt::info!("usb: console connected");

        loop {
            match select(receiver.read_packet(&mut ingress), control.control_changed()).await {
                Either::First(Ok(count)) => {
                    reply.clear();
                    for byte in &ingress[..count] {
                        session.ingest(*byte, &mut reply);
                    }
                    if reply.is_empty() {
                        continue;
                    }
                    match write_reply(&mut sender, reply.as_bytes()).await {
                        Ok(()) => {}
                        Err(EndpointError::Disabled) => {
                            defmt::warn!("usb: console write disabled");
                            break;
                        }
                        Err(_) => defmt::warn!("usb: console write error"),
                    }
                }
                Either::First(Err(EndpointError::Disabled)) => {
                    defmt::warn!("usb: console interface disabled");
                    break;
                }
                Either::First(Err(_)) => {
                    defmt::warn!("usb: console read error");
                }
                Either::Second(()) => {
                    if !sender.dtr() {
                        defmt::warn!("usb: console host dropped DTR");
                        break;
                    }
                }
            }
        }
    }
}

/// Sends `bytes` as full packets, closing with a short or empty packet.
async fn write_reply<D>(sender: &mut Sender<'static, D>, bytes: &[u8]) -> Result<(), EndpointError>
where
    D: Driver<'static>,
{
    let packet_len = usb::MAX_PACKET_SIZE as usize;
    for chunk in bytes.chunks(packet_len) {
        sender.write_packet(chunk).await?;
    }
    if bytes.len() % packet_len == 0 {
        sender.write_packet(&[]).await?;
    }
    Ok(())
}

async fn wait_for_dtr<D>(control: &ControlChanged<'static>, sender: &Sender<'static, D>)
where
    D: Driver<'static>,
{
    while !sender.dtr() {
        control.control_changed().await;
    }
}
