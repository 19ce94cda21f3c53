//! `Si5351A` Clock Synthesizer Driver
//!
//! Generates the transmit carrier. Divider values come from
//! [`crate::synthesis`]; this driver only turns a plan into register writes.
//!
//! CLK0 runs from PLL A and CLK1/CLK2 share PLL B. Each output remembers its
//! multisynth divider: while successive frequencies fit the same divider only
//! the PLL fraction is rewritten and the PLL is not reset, so the carrier
//! stays phase-continuous across WSPR tone changes.

use embassy_stm32::i2c::{Error as I2cError, I2c};
use embassy_stm32::mode::Async;

use crate::beacon::io::Synthesizer;
use crate::config::SI5351_XTAL_FREQ;
use crate::hal::i2c::{I2cAddress, I2cBus, I2cResult, RegisterMap};
use crate::synthesis::{self, MsParams, PllParams, SynthesisPlan};
use crate::types::{ClockOutput, Frequency};

/// `Si5351A` register addresses
mod reg {
    pub const DEVICE_STATUS: u8 = 0;
    pub const OUTPUT_ENABLE: u8 = 3;
    pub const CLK0_CONTROL: u8 = 16;
    pub const CLK1_CONTROL: u8 = 17;
    pub const CLK2_CONTROL: u8 = 18;
    pub const PLLA_PARAMS: u8 = 26;
    pub const PLLB_PARAMS: u8 = 34;
    pub const MS0_PARAMS: u8 = 42;
    pub const MS1_PARAMS: u8 = 50;
    pub const MS2_PARAMS: u8 = 58;
    pub const PLL_RESET: u8 = 177;
    pub const CRYSTAL_LOAD: u8 = 183;
}

/// Control register bits
mod ctrl {
    pub const POWER_DOWN: u8 = 0x80;
    pub const MS_INT: u8 = 0x40;
    pub const PLL_B: u8 = 0x20;
    pub const SRC_MULTISYNTH: u8 = 0x0C;
}

const fn control_reg(output: ClockOutput) -> u8 {
    match output {
        ClockOutput::Clk0 => reg::CLK0_CONTROL,
        ClockOutput::Clk1 => reg::CLK1_CONTROL,
        ClockOutput::Clk2 => reg::CLK2_CONTROL,
    }
}

const fn ms_reg(output: ClockOutput) -> u8 {
    match output {
        ClockOutput::Clk0 => reg::MS0_PARAMS,
        ClockOutput::Clk1 => reg::MS1_PARAMS,
        ClockOutput::Clk2 => reg::MS2_PARAMS,
    }
}

const fn index(output: ClockOutput) -> usize {
    match output {
        ClockOutput::Clk0 => 0,
        ClockOutput::Clk1 => 1,
        ClockOutput::Clk2 => 2,
    }
}

const fn pll_for(output: ClockOutput) -> PllSource {
    match output {
        ClockOutput::Clk0 => PllSource::PllA,
        ClockOutput::Clk1 | ClockOutput::Clk2 => PllSource::PllB,
    }
}

/// Drive strength setting
#[derive(Clone, Copy, Debug, Default)]
pub enum DriveStrength {
    /// 2mA drive
    Drive2mA,
    /// 4mA drive
    Drive4mA,
    /// 6mA drive
    Drive6mA,
    /// 8mA drive (maximum)
    #[default]
    Drive8mA,
}

impl DriveStrength {
    const fn as_reg(self) -> u8 {
        match self {
            Self::Drive2mA => 0,
            Self::Drive4mA => 1,
            Self::Drive6mA => 2,
            Self::Drive8mA => 3,
        }
    }
}

/// PLL source selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PllSource {
    PllA,
    PllB,
}

impl PllSource {
    const fn params_reg(self) -> u8 {
        match self {
            Self::PllA => reg::PLLA_PARAMS,
            Self::PllB => reg::PLLB_PARAMS,
        }
    }

    const fn reset_bit(self) -> u8 {
        match self {
            Self::PllA => 0x20,
            Self::PllB => 0x80,
        }
    }

    const fn control_bit(self) -> u8 {
        match self {
            Self::PllA => 0,
            Self::PllB => ctrl::PLL_B,
        }
    }
}

/// Crystal load capacitance
#[derive(Clone, Copy, Debug, Default)]
pub enum CrystalLoad {
    /// 6 pF load
    Load6pF,
    /// 8 pF load
    Load8pF,
    /// 10 pF load
    #[default]
    Load10pF,
}

impl CrystalLoad {
    const fn as_reg(self) -> u8 {
        match self {
            Self::Load6pF => 0b0101_0010,
            Self::Load8pF => 0b1001_0010,
            Self::Load10pF => 0b1101_0010,
        }
    }
}

/// `Si5351A` driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Si5351Error {
    /// I2C transaction failed
    Bus(I2cError),
    /// No divider plan reaches the frequency
    OutOfRange(Frequency),
}

impl From<I2cError> for Si5351Error {
    fn from(err: I2cError) -> Self {
        Self::Bus(err)
    }
}

impl defmt::Format for Si5351Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(e) => defmt::write!(f, "Bus({})", e),
            Self::OutOfRange(freq) => defmt::write!(f, "OutOfRange({})", freq),
        }
    }
}

/// Eight-byte parameter block shared by the PLL and multisynth registers
fn parameter_block((p1, p2, p3): (u32, u32, u32), r_div_bits: u8) -> [u8; 8] {
    [
        ((p3 >> 8) & 0xFF) as u8,
        (p3 & 0xFF) as u8,
        r_div_bits | ((p1 >> 16) & 0x03) as u8,
        ((p1 >> 8) & 0xFF) as u8,
        (p1 & 0xFF) as u8,
        (((p3 >> 12) & 0xF0) | ((p2 >> 16) & 0x0F)) as u8,
        ((p2 >> 8) & 0xFF) as u8,
        (p2 & 0xFF) as u8,
    ]
}

/// `Si5351A` driver
pub struct Si5351<'d> {
    bus: I2cBus<'d>,
    xtal_hz: u64,
    drive: DriveStrength,
    output_enable: u8,
    multisynth: [Option<MsParams>; 3],
    shadow: RegisterMap<256>,
}

impl<'d> Si5351<'d> {
    /// Create a new `Si5351A` driver
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self {
            bus: I2cBus::new(i2c),
            xtal_hz: u64::from(SI5351_XTAL_FREQ),
            drive: DriveStrength::default(),
            output_enable: 0xFF, // All outputs disabled
            multisynth: [None; 3],
            shadow: RegisterMap::new(),
        }
    }

    /// Correct the reference for a measured crystal frequency
    pub fn set_xtal_hz(&mut self, xtal_hz: u32) {
        self.xtal_hz = u64::from(xtal_hz);
        self.multisynth = [None; 3];
    }

    /// Initialize the `Si5351A`
    pub async fn init(&mut self, load: CrystalLoad) -> I2cResult<()> {
        self.wait_ready().await?;
        self.shadow.invalidate();
        self.multisynth = [None; 3];

        // Disable all outputs during configuration
        self.output_enable = 0xFF;
        self.bus
            .write_reg(I2cAddress::SI5351, reg::OUTPUT_ENABLE, self.output_enable)
            .await?;

        self.bus
            .write_reg(I2cAddress::SI5351, reg::CRYSTAL_LOAD, load.as_reg())
            .await?;

        for clk in [ClockOutput::Clk0, ClockOutput::Clk1, ClockOutput::Clk2] {
            self.bus
                .write_reg(I2cAddress::SI5351, control_reg(clk), ctrl::POWER_DOWN)
                .await?;
        }

        Ok(())
    }

    /// Wait for device to be ready (`SYS_INIT` cleared)
    async fn wait_ready(&mut self) -> I2cResult<()> {
        for _ in 0..100 {
            let status = self.bus.read_reg(I2cAddress::SI5351, reg::DEVICE_STATUS).await?;
            if status & 0x80 == 0 {
                return Ok(());
            }
            embassy_time::Timer::after(embassy_time::Duration::from_millis(1)).await;
        }
        warn!("si5351: SYS_INIT still set");
        Ok(())
    }

    /// Tune `output` to `freq`
    ///
    /// # Errors
    ///
    /// [`Si5351Error::OutOfRange`] if no divider plan exists, otherwise bus errors.
    pub async fn tune(&mut self, output: ClockOutput, freq: Frequency) -> Result<SynthesisPlan, Si5351Error> {
        let slot = index(output);
        let previous = self.multisynth[slot];
        let plan = previous
            .and_then(|ms| synthesis::plan_with_multisynth(self.xtal_hz, freq, ms))
            .or_else(|| synthesis::calculate_frequency(self.xtal_hz, freq))
            .ok_or(Si5351Error::OutOfRange(freq))?;

        let pll = pll_for(output);
        self.program_pll(pll, &plan.pll).await?;

        if previous != Some(plan.ms) {
            self.program_multisynth(output, &plan.ms).await?;
            let control = ctrl::MS_INT | pll.control_bit() | ctrl::SRC_MULTISYNTH | self.drive.as_reg();
            self.bus
                .write_reg(I2cAddress::SI5351, control_reg(output), control)
                .await?;
            self.bus
                .write_reg(I2cAddress::SI5351, reg::PLL_RESET, pll.reset_bit())
                .await?;
            self.multisynth[slot] = Some(plan.ms);
            debug!("si5351: {} divider {} r{}", output, plan.ms.a, plan.ms.r_div);
        }

        Ok(plan)
    }

    /// Enable a clock output
    pub async fn enable(&mut self, output: ClockOutput) -> I2cResult<()> {
        self.output_enable &= !(1 << index(output));
        self.bus
            .write_reg(I2cAddress::SI5351, reg::OUTPUT_ENABLE, self.output_enable)
            .await
    }

    /// Disable a clock output
    pub async fn disable(&mut self, output: ClockOutput) -> I2cResult<()> {
        self.output_enable |= 1 << index(output);
        self.bus
            .write_reg(I2cAddress::SI5351, reg::OUTPUT_ENABLE, self.output_enable)
            .await
    }

    async fn program_pll(&mut self, pll: PllSource, params: &PllParams) -> I2cResult<()> {
        let base = pll.params_reg();
        let regs = parameter_block(params.to_registers(), 0);
        if self.shadow.update_block(usize::from(base), &regs) {
            self.bus.write_regs(I2cAddress::SI5351, base, &regs).await?;
        }
        Ok(())
    }

    async fn program_multisynth(&mut self, output: ClockOutput, params: &MsParams) -> I2cResult<()> {
        let base = ms_reg(output);
        let divby4 = if params.a == MsParams::MIN_A { 0x0C } else { 0 };
        let regs = parameter_block(params.to_registers(), (params.r_div << 4) | divby4);
        if self.shadow.update_block(usize::from(base), &regs) {
            self.bus.write_regs(I2cAddress::SI5351, base, &regs).await?;
        }
        Ok(())
    }
}

impl Synthesizer for Si5351<'_> {
    type Error = Si5351Error;

    async fn set_frequency(&mut self, output: ClockOutput, frequency: Frequency) -> Result<(), Self::Error> {
        self.tune(output, frequency).await.map(|_| ())
    }

    async fn set_output(&mut self, output: ClockOutput, enabled: bool) -> Result<(), Self::Error> {
        if enabled {
            self.enable(output).await?;
        } else {
            self.disable(output).await?;
        }
        Ok(())
    }
}
