//! Grafo de buses SPI e I2C.
//!
//! Cada pin que declara un `driver` es un chip conectado a un bus. Los
//! buses se identifican por el tipo de grupo del pin y la dirección de
//! su línea de reloj (`sclk`). Los dispositivos de un mismo bus se
//! encadenan por inserción al frente, igual que los grupos de
//! aplicación en [`crate::link`], y los buses mismos forman otra lista
//! del mismo tipo cuya cabeza es la estructura principal del
//! dispositivo.

use crate::{
    ir::{PinPath, NULL},
    manifest::PinKind,
};

use std::{
    collections::HashMap,
    fmt::{self, Display},
    rc::Rc,
};

/// Estructura principal del bus de dispositivos, definida por el firmware.
pub const DEVICEBUS: &str = "pins_devicebus";

/// Rutina que inicializa todos los buses, drivers y dispositivos.
pub const INITIALIZER: &str = "pins_initialize_bus_devices";

/// Tipo de bus. Un bus es de exactamente uno de estos tipos.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusKind {
    Spi,
    I2c,
}

impl BusKind {
    /// Un bus es SPI si y solo si su grupo de pines es `spi`.
    pub fn of(kind: PinKind) -> Self {
        match kind {
            PinKind::Spi => BusKind::Spi,
            _ => BusKind::I2c,
        }
    }

    pub fn c_name(self) -> &'static str {
        match self {
            BusKind::Spi => "PINS_SPI_BUS",
            BusKind::I2c => "PINS_I2C_BUS",
        }
    }
}

/// Llave derivada de un bus.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BusKey {
    pub prefix: Rc<str>,
    pub kind: PinKind,
    pub clock: i64,
}

impl Display for BusKey {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}_bus_{}_{}", self.prefix, self.kind, self.clock)
    }
}

/// Un bus, con la cabeza de su cadena de dispositivos.
#[derive(Debug)]
pub struct Bus {
    pub key: BusKey,
    pub kind: BusKind,
    head: usize,
}

/// Un chip conectado a un bus.
#[derive(Debug)]
pub struct BusDevice {
    pub pin: PinPath,
    pub driver: Rc<str>,
    bus: usize,
    next: Option<usize>,
}

/// Buses, dispositivos y drivers de todos los dispositivos de E/S.
#[derive(Debug, Default)]
pub struct BusGraph {
    buses: Vec<Bus>,
    by_key: HashMap<BusKey, usize>,
    devices: Vec<BusDevice>,
    drivers: Vec<Rc<str>>,
}

impl BusGraph {
    /// Conecta un chip a su bus, creando el bus si es la primera vez que se observa.
    ///
    /// Retorna el índice del nuevo dispositivo.
    pub fn attach(&mut self, pin: PinPath, driver: &str, clock: i64) -> usize {
        let key = BusKey {
            prefix: Rc::clone(pin.prefix()),
            kind: pin.kind(),
            clock,
        };

        let device = self.devices.len();
        let (bus, next) = match self.by_key.get(&key).copied() {
            Some(index) => {
                let bus = &mut self.buses[index];
                let previous = bus.head;
                bus.head = device;

                (index, Some(previous))
            }

            None => {
                let index = self.buses.len();
                self.by_key.insert(key.clone(), index);
                self.buses.push(Bus {
                    kind: BusKind::of(key.kind),
                    key,
                    head: device,
                });

                (index, None)
            }
        };

        let driver = match self.drivers.iter().find(|known| &***known == driver) {
            Some(known) => Rc::clone(known),
            None => {
                let driver: Rc<str> = driver.into();
                self.drivers.push(Rc::clone(&driver));
                driver
            }
        };

        self.devices.push(BusDevice {
            pin,
            driver,
            bus,
            next,
        });

        device
    }

    /// Buses en orden de primera aparición.
    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    /// Dispositivos en orden de declaración.
    pub fn devices(&self) -> &[BusDevice] {
        &self.devices
    }

    /// Drivers distintos, en orden de primer uso.
    pub fn drivers(&self) -> impl Iterator<Item = &str> + '_ {
        self.drivers.iter().map(|driver| &**driver)
    }

    /// Símbolo de un bus, como `pins_bus_spi_18`.
    pub fn bus_symbol(&self, bus: &Bus) -> String {
        bus.key.to_string()
    }

    /// Símbolo de un dispositivo, como `pins_device_spi_adc1`.
    pub fn device_symbol(&self, device: &BusDevice) -> String {
        let pin = &device.pin;
        format!("{}_device_{}_{}", pin.prefix(), pin.kind(), pin.name())
    }

    /// Bus al que está conectado un dispositivo.
    pub fn bus_of(&self, device: &BusDevice) -> &Bus {
        &self.buses[device.bus]
    }

    /// Dispositivo más reciente de un bus.
    pub fn head_of(&self, bus: &Bus) -> &BusDevice {
        &self.devices[bus.head]
    }

    /// Referencia C al dispositivo anterior en el mismo bus.
    pub fn next_reference(&self, device: &BusDevice) -> String {
        device.next.map_or_else(
            || NULL.to_owned(),
            |index| format!("&{}", self.device_symbol(&self.devices[index])),
        )
    }

    /// Referencia C al bus emitido antes que este.
    pub fn previous_bus_reference(&self, index: usize) -> String {
        match index.checked_sub(1) {
            Some(previous) => format!("&{}", self.bus_symbol(&self.buses[previous])),
            None => NULL.to_owned(),
        }
    }

    /// Referencia C al último bus, que es la cabeza de la lista de buses.
    pub fn last_bus_reference(&self) -> String {
        self.previous_bus_reference(self.buses.len())
    }
}

/// Símbolo de dispositivo a partir de una referencia `"kind.name"` de manifiesto.
pub fn device_symbol(prefix: &str, reference: &str) -> String {
    format!("{}_device_{}", prefix, reference.replace('.', "_"))
}
