//! Emisión del bus de dispositivos.
//!
//! Este bloque se emite una sola vez, al cerrar la compilación, con los
//! buses y chips de todos los dispositivos. La estructura principal y la
//! rutina de inicialización tienen los nombres fijos que espera el firmware.

use super::Artifacts;
use crate::bus::{BusGraph, DEVICEBUS, INITIALIZER};

use log::trace;
use std::io::{self, Write};

pub(super) fn emit<W: Write>(buses: &BusGraph, output: &mut Artifacts<W>) -> io::Result<()> {
    trace!(
        "{} buses, {} bus devices",
        buses.buses().len(),
        buses.devices().len()
    );

    source(buses, &mut output.source)?;
    header(buses, &mut output.header)
}

fn source<W: Write>(buses: &BusGraph, source: &mut W) -> io::Result<()> {
    write!(source, "\n#if PINS_SPI || PINS_I2C\n")?;

    section!(source, "SPI and I2C bus structures")?;
    for (index, bus) in buses.buses().iter().enumerate() {
        writeln!(
            source,
            "PinsBus {} = {{{}, &{}, {}}};",
            buses.bus_symbol(bus),
            bus.kind.c_name(),
            buses.device_symbol(buses.head_of(bus)),
            buses.previous_bus_reference(index)
        )?;
    }

    section!(source, "Device bus main structure")?;
    writeln!(source, "PinsDeviceBus {} = {{{}}};", DEVICEBUS, buses.last_bus_reference())?;

    section!(source, "SPI and I2C device structures")?;
    for device in buses.devices() {
        let driver = &device.driver;
        writeln!(
            source,
            "PinsBusDevice {} = {{{}, &{}, {}, &{d}_gen_req, &{d}_proc_resp, &{d}_set, &{d}_get}};",
            buses.device_symbol(device),
            device.pin.address(),
            buses.bus_symbol(buses.bus_of(device)),
            buses.next_reference(device),
            d = driver
        )?;
    }

    section!(source, "Initialize all SPI and I2C bus devices")?;
    writeln!(source, "void {}(void)\n{{", INITIALIZER)?;

    // Buses, luego drivers, luego dispositivos
    for bus in buses.buses() {
        emit!(source, "pins_init_bus(&{});", buses.bus_symbol(bus))?;
    }

    for driver in buses.drivers() {
        emit!(source, "{}_initialize_driver();", driver)?;
    }

    for device in buses.devices() {
        emit!(source, "{}_initialize(&{});", device.driver, buses.device_symbol(device))?;
    }

    writeln!(source, "}}")?;
    writeln!(source, "#endif")
}

fn header<W: Write>(buses: &BusGraph, header: &mut W) -> io::Result<()> {
    section!(header, "SPI and I2C initialization")?;
    writeln!(header, "#if PINS_SPI || PINS_I2C")?;

    section!(header, "SPI and I2C bus structures")?;
    for bus in buses.buses() {
        writeln!(header, "extern PinsBus {};", buses.bus_symbol(bus))?;
    }

    section!(header, "Device bus main structure")?;
    writeln!(header, "extern PinsDeviceBus {};", DEVICEBUS)?;

    section!(header, "SPI and I2C device structures")?;
    for device in buses.devices() {
        writeln!(header, "extern PinsBusDevice {};", buses.device_symbol(device))?;
    }

    for driver in buses.drivers() {
        section!(header, "{} driver functions", driver)?;
        writeln!(header, "void {}_initialize_driver(void);", driver)?;
        writeln!(header, "void {}_initialize(struct PinsBusDevice *device);", driver)?;
        writeln!(header, "void {}_gen_req(struct PinsBusDevice *device);", driver)?;
        writeln!(header, "osalStatus {}_proc_resp(struct PinsBusDevice *device);", driver)?;
        writeln!(
            header,
            "void {}_set(struct PinsBusDevice *device, os_short addr, os_int value);",
            driver
        )?;
        writeln!(header, "os_int {}_get(struct PinsBusDevice *device, os_short addr);", driver)?;
    }

    section!(header, "Initialize all SPI and I2C bus devices")?;
    writeln!(header, "void {}(void);", INITIALIZER)?;
    writeln!(header, "#endif")
}
