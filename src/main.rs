//! WSPR Beacon Main Application
//!
//! Entry point for the STM32G474-based beacon firmware.
//! Brings up the peripherals, spawns the USB console tasks and runs the
//! beacon loop.

#![no_std]
#![no_main]

use core::fmt::Write as _;

use embassy_executor::Spawner;
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::peripherals::USB;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::usb::{self as stm32_usb, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::with_timeout;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wspr_beacon::beacon::{Beacon, CommandAction, TickOutcome};
use wspr_beacon::drivers::display::Display;
use wspr_beacon::drivers::ds3231::Ds3231;
use wspr_beacon::drivers::si5351::{CrystalLoad, Si5351};
use wspr_beacon::hal::flash::SettingsStore;
use wspr_beacon::hal::gpio::StatusLed;
use wspr_beacon::hal::timer::{SymbolTicker, TxTimer};
use wspr_beacon::hal::uart::GpsUart;
use wspr_beacon::prelude::*;
use wspr_beacon::protocol::{self, ConsoleCommand, ConsoleError, LineParser, Response};
use wspr_beacon::ui::{ScreenInput, StatusScreen};
use wspr_beacon::usb::cdc::{Packets, UsbDeviceInfo, UsbStrings};

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
    I2C2_EV => i2c::EventInterruptHandler<peripherals::I2C2>;
    I2C2_ER => i2c::ErrorInterruptHandler<peripherals::I2C2>;
    I2C3_EV => i2c::EventInterruptHandler<peripherals::I2C3>;
    I2C3_ER => i2c::ErrorInterruptHandler<peripherals::I2C3>;
    USART3 => usart::BufferedInterruptHandler<peripherals::USART3>;
    USB_LP => stm32_usb::InterruptHandler<peripherals::USB>;
});

type UsbDriver = Driver<'static, USB>;

/// Seconds the console waits for the beacon loop to answer
const CONSOLE_REPLY_TIMEOUT_SECS: u64 = 2;

/// Console commands for the beacon loop
static COMMANDS: Channel<CriticalSectionRawMutex, ConsoleCommand, 4> = Channel::new();

/// Replies from the beacon loop
static REPLIES: Channel<CriticalSectionRawMutex, Response, 2> = Channel::new();

/// Raised by the console to cut a transmission short
static ABORT: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static GPS_TX_BUF: StaticCell<[u8; GPS_TX_BUFFER_SIZE]> = StaticCell::new();
static GPS_RX_BUF: StaticCell<[u8; GPS_RX_BUFFER_SIZE]> = StaticCell::new();
static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESC: StaticCell<[u8; 64]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

fn fatal(what: &str) -> ! {
    error!("boot: {=str} failed, resetting", what);
    cortex_m::peripheral::SCB::sys_reset()
}

fn clock_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::{
        mux, Hsi48Config, Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk,
    };

    let mut config = embassy_stm32::Config::default();
    // 16 MHz HSI / 4 * 85 / 2 = 170 MHz; USB from the recovered HSI48
    config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true });
    config.rcc.pll = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL85,
        divp: None,
        divq: None,
        divr: Some(PllRDiv::DIV2),
    });
    config.rcc.sys = Sysclk::PLL1_R;
    config.rcc.mux.clk48sel = mux::Clk48sel::HSI48;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("WSPR beacon v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(clock_config());
    info!("Peripherals initialized ({} Hz)", SYSTEM_CLOCK_HZ);

    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));

    let mut store = SettingsStore::new(Flash::new_blocking(p.FLASH));
    let config = store.load();
    info!(
        "settings: {=str} {=str} {} dBm {}",
        config.callsign(),
        config.grid(),
        config.power_dbm(),
        config.frequency()
    );

    // I2C1: Si5351A (PB8 SCL, PB9 SDA)
    let i2c1 = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut synth = Si5351::new(i2c1);
    if let Err(e) = synth.init(CrystalLoad::default()).await {
        error!("si5351: {}", e);
        fatal("si5351");
    }

    // I2C2: DS3231 (PA9 SCL, PA8 SDA)
    let i2c2 = I2c::new(
        p.I2C2,
        p.PA9,
        p.PA8,
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH4,
        Hertz(RTC_I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut rtc = Ds3231::new(i2c2);
    let clock_lost = match rtc.init().await {
        Ok(lost) => lost,
        Err(e) => {
            error!("ds3231: {}", e);
            fatal("ds3231");
        }
    };
    if clock_lost {
        warn!("ds3231: oscillator stopped, time lost");
    }

    // I2C3: SSD1306 (PC8 SCL, PC9 SDA)
    let i2c3 = I2c::new(
        p.I2C3,
        p.PC8,
        p.PC9,
        Irqs,
        p.DMA1_CH5,
        p.DMA1_CH6,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut display = Display::new(i2c3);
    if let Err(e) = display.init().await {
        error!("display: {}", e);
        fatal("display");
    }
    info!("I2C peripherals initialized");

    // USART3: GPS receiver (PB11 RX, PB10 TX)
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = GPS_BAUD_RATE;
    let gps_uart = match BufferedUart::new(
        p.USART3,
        Irqs,
        p.PB11,
        p.PB10,
        GPS_TX_BUF.init([0; GPS_TX_BUFFER_SIZE]),
        GPS_RX_BUF.init([0; GPS_RX_BUFFER_SIZE]),
        uart_config,
    ) {
        Ok(uart) => uart,
        Err(e) => {
            error!("gps uart: {}", e);
            fatal("gps uart");
        }
    };
    let (_gps_tx, gps_rx) = gps_uart.split();

    // USB CDC console (PA12 D+, PA11 D-)
    let (usb, class) = usb_console(Driver::new(p.USB, Irqs, p.PA12, p.PA11));
    spawner.must_spawn(usb_task(usb));
    spawner.must_spawn(console_task(class));
    info!("{} console started", UsbDeviceInfo::default());

    let mut beacon = Beacon::new(config, rtc, synth, led, GpsUart::new(gps_rx), SymbolTicker::new());
    match beacon.start(clock_lost).await {
        Ok(now) => info!("clock: {}", now),
        Err(e) => {
            error!("ds3231: {}", e);
            fatal("clock read");
        }
    }

    run(&mut beacon, &mut store, &mut display).await
}

type BoardBeacon = Beacon<Ds3231<'static>, Si5351<'static>, StatusLed<Output<'static>>, GpsUart<'static>, SymbolTicker>;

/// The beacon loop: console commands, then one tick, then the status screen
async fn run(beacon: &mut BoardBeacon, store: &mut SettingsStore<'static>, display: &mut Display<'static>) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut screen = StatusScreen::default();
    let mut tx_timer = TxTimer::new();

    loop {
        while let Ok(command) = COMMANDS.try_receive() {
            let reply = beacon.handle_command(command).await;
            let text = match reply.action {
                CommandAction::Persist => match store.save(beacon.config()) {
                    Ok(()) => reply.text,
                    Err(e) => {
                        error!("settings: save failed {}", e);
                        protocol::error_response(ConsoleError::StorageError)
                    }
                },
                CommandAction::None | CommandAction::Reboot => reply.text,
            };
            if REPLIES.try_send(text).is_err() {
                warn!("console: reply dropped");
            }
            if reply.action == CommandAction::Reboot {
                info!("reboot requested");
                Timer::after(Duration::from_millis(200)).await;
                cortex_m::peripheral::SCB::sys_reset();
            }
        }

        ABORT.reset();
        tx_timer.start();
        let outcome = beacon.tick(|| ABORT.try_take().is_some()).await;

        match outcome {
            TickOutcome::Idle(now) => {
                let next = StatusScreen::from_input(&ScreenInput {
                    frequency: beacon.config().frequency(),
                    callsign: beacon.config().callsign(),
                    transmitter: beacon.state().transmitter(),
                    gps_lock: beacon.state().gps_lock(),
                    locator: beacon.state().locator(),
                    utc: Some(now),
                    tz_offset: beacon.config().tz_offset(),
                });
                if screen.update(next) {
                    if let Err(e) = display.show(&screen).await {
                        warn!("display: {}", e);
                    }
                }
            }
            TickOutcome::Transmitted { symbols } => {
                let (elapsed, on_time) = tx_timer.finish(symbols);
                if on_time {
                    info!("tx: took {} ms", elapsed.as_millis());
                } else {
                    warn!("tx: took {} ms, expected {} ms", elapsed.as_millis(), TxTimer::nominal(symbols).as_millis());
                }
            }
            TickOutcome::Failed(_) | TickOutcome::ClockUnavailable => {}
        }

        ticker.next().await;
    }
}

fn usb_console(driver: UsbDriver) -> (UsbDevice<'static, UsbDriver>, CdcAcmClass<'static, UsbDriver>) {
    let info = UsbDeviceInfo::default();
    let strings = UsbStrings::default();

    let mut config = embassy_usb::Config::new(info.vid, info.pid);
    config.manufacturer = Some(strings.manufacturer);
    config.product = Some(strings.product);
    config.serial_number = Some(strings.serial);
    config.device_release = info.device_release;
    config.max_power = 100;
    config.max_packet_size_0 = 64;
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;

    let mut builder = embassy_usb::Builder::new(
        driver,
        config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        MSOS_DESC.init([0; 64]),
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), USB_CDC_PACKET_SIZE);
    (builder.build(), class)
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

/// Reads console lines, forwards commands to the beacon loop and prints replies
#[embassy_executor::task]
async fn console_task(mut class: CdcAcmClass<'static, UsbDriver>) -> ! {
    let mut parser = LineParser::new();
    let mut packet = [0u8; USB_CDC_PACKET_SIZE as usize];

    loop {
        class.wait_connection().await;
        info!("console: connected");
        parser.clear();
        let _ = write_text(&mut class, "wspr-beacon console, 'help' for commands\r\n> ").await;

        'session: loop {
            let n = match class.read_packet(&mut packet).await {
                Ok(n) => n,
                Err(_) => break 'session,
            };
            for &byte in &packet[..n] {
                let Some(parsed) = parser.feed(byte) else {
                    continue;
                };
                let reply = match parsed {
                    Ok(command) => dispatch(command).await,
                    Err(err) => protocol::error_response(err),
                };
                if write_text(&mut class, &reply).await.is_err() || write_text(&mut class, "> ").await.is_err() {
                    break 'session;
                }
            }
        }
        info!("console: disconnected");
    }
}

async fn dispatch(command: ConsoleCommand) -> Response {
    if command == ConsoleCommand::Stop {
        ABORT.signal(());
    }
    // Answers to commands that timed out earlier
    while REPLIES.try_receive().is_ok() {}

    if COMMANDS.try_send(command).is_err() {
        return protocol::respond(|out| out.write_str("busy, try again\r\n"));
    }
    match with_timeout(Duration::from_secs(CONSOLE_REPLY_TIMEOUT_SECS), REPLIES.receive()).await {
        Ok(reply) => reply,
        Err(_) => protocol::respond(|out| out.write_str("busy, command queued\r\n")),
    }
}

async fn write_text(class: &mut CdcAcmClass<'static, UsbDriver>, text: &str) -> Result<(), EndpointError> {
    for packet in Packets::console(text.as_bytes()) {
        class.write_packet(packet).await?;
    }
    Ok(())
}
