//! Tabla de atributos.
//!
//! Asocia las claves de atributo del manifiesto con los códigos de
//! parámetro (`pinPrm`) que entiende el firmware. La tabla es fija y
//! de solo lectura.

use std::fmt::{self, Display};

/// Marcador de las dos posiciones que el firmware llena en tiempo de ejecución.
pub const RESERVED: &str = "PIN_RV";

/// Claves estructurales de un pin. No son parámetros y nunca se reportan
/// como atributos desconocidos.
pub const STRUCTURAL_KEYS: &[&str] = &["name", "addr", "bank", "group", "device", "driver"];

/// Código de parámetro de pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    PullUp,
    PullDown,
    Touch,
    Frequency,
    FrequencyKhz,
    Resolution,
    Init,
    Hpoint,
    InterruptEnabled,
    TimerSelect,
    TimerGroupSelect,
    Miso,
    Mosi,
    Sclk,
    Cs,
    Dc,
    Rx,
    Tx,
    TransmitterCtrl,
    Speed,
    PinA,
    PinB,
    PinC,
    PinD,
    PinE,
    BankA,
    BankB,
    BankC,
    BankD,
    BankE,
    Min,
    Max,
}

/// Tabla de atributos conocidos, en el orden del firmware.
fn attributes() -> &'static [(&'static str, Opcode)] {
    use Opcode::*;

    const ATTRIBUTES: &[(&str, Opcode)] = &[
        ("pull-up",       PullUp),
        ("pull-down",     PullDown),
        ("touch",         Touch),
        ("frequency",     Frequency),
        ("frequency-kHz", FrequencyKhz),
        ("resolution",    Resolution),
        ("init",          Init),
        ("hpoint",        Hpoint),
        ("interrupt",     InterruptEnabled),
        ("timer",         TimerSelect),
        ("tgroup",        TimerGroupSelect),
        ("miso",          Miso),
        ("mosi",          Mosi),
        ("sclk",          Sclk),
        ("cs",            Cs),
        ("dc",            Dc),
        ("rx",            Rx),
        ("tx",            Tx),
        ("tc",            TransmitterCtrl),
        ("speed",         Speed),
        ("pin-a",         PinA),
        ("pin-b",         PinB),
        ("pin-c",         PinC),
        ("pin-d",         PinD),
        ("pin-e",         PinE),
        ("bank-a",        BankA),
        ("bank-b",        BankB),
        ("bank-c",        BankC),
        ("bank-d",        BankD),
        ("bank-e",        BankE),
        ("min",           Min),
        ("max",           Max),
    ];

    ATTRIBUTES
}

impl Opcode {
    /// Busca el código asociado a una clave de atributo.
    pub fn lookup(key: &str) -> Option<Opcode> {
        attributes()
            .iter()
            .find(|&&(name, _)| name == key)
            .map(|&(_, opcode)| opcode)
    }

    /// Nombre del enumerador en C.
    pub fn c_name(self) -> &'static str {
        use Opcode::*;

        match self {
            PullUp           => "PIN_PULL_UP",
            PullDown         => "PIN_PULL_DOWN",
            Touch            => "PIN_TOUCH",
            // Así está escrito en pins_basics.h
            Frequency        => "PIN_FREQENCY",
            FrequencyKhz     => "PIN_FREQENCY_KHZ",
            Resolution       => "PIN_RESOLUTION",
            Init             => "PIN_INIT",
            Hpoint           => "PIN_HPOINT",
            InterruptEnabled => "PIN_INTERRUPT_ENABLED",
            TimerSelect      => "PIN_TIMER_SELECT",
            TimerGroupSelect => "PIN_TIMER_GROUP_SELECT",
            Miso             => "PIN_MISO",
            Mosi             => "PIN_MOSI",
            Sclk             => "PIN_SCLK",
            Cs               => "PIN_CS",
            Dc               => "PIN_DC",
            Rx               => "PIN_RX",
            Tx               => "PIN_TX",
            TransmitterCtrl  => "PIN_TRANSMITTER_CTRL",
            Speed            => "PIN_SPEED",
            PinA             => "PIN_A",
            PinB             => "PIN_B",
            PinC             => "PIN_C",
            PinD             => "PIN_D",
            PinE             => "PIN_E",
            BankA            => "PIN_A_BANK",
            BankB            => "PIN_B_BANK",
            BankC            => "PIN_C_BANK",
            BankD            => "PIN_D_BANK",
            BankE            => "PIN_E_BANK",
            Min              => "PIN_MIN",
            Max              => "PIN_MAX",
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.c_name())
    }
}

/// Determina si una clave es estructural en vez de un parámetro.
pub fn is_structural(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
}
