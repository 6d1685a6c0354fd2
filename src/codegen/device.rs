//! Emisión de un dispositivo de E/S.
//!
//! El estado de enlazado propio del dispositivo (listas de grupos y
//! constantes de nombre) vive en un [`DeviceContext`] que se crea al
//! entrar a cada dispositivo y se descarta al terminarlo. Los chips con
//! `driver` se agregan al [`BusGraph`] de la compilación completa.

use super::Artifacts;
use crate::{
    bus::{self, BusGraph},
    error::Diagnostics,
    ir::{self, Define, PinPath, NULL},
    link::GroupLinker,
    manifest::{Device, Pin, PinGroup},
    params::{self, Parameters},
    signal::SignalTable,
};

use log::{debug, trace};
use std::{
    io::{self, Write},
    rc::Rc,
};

struct DeviceContext<'a> {
    device: &'a Device,
    prefix: Rc<str>,
    signals: &'a SignalTable,
    linker: GroupLinker,
    buses: &'a mut BusGraph,
    defines: Vec<Define>,

    /// Miembros `prefix.kind` de los grupos emitidos, en orden.
    groups: Vec<String>,

    /// Inicializador de la estructura principal. Se acumula aparte porque
    /// los arreglos de parámetros deben definirse antes que él.
    table: Vec<u8>,
}

/// Emite ambos artefactos para un dispositivo.
pub(super) fn emit<W: Write>(
    device: &Device,
    signals: &SignalTable,
    buses: &mut BusGraph,
    output: &mut Artifacts<W>,
    diagnostics: &mut Diagnostics,
) -> io::Result<()> {
    debug!("Emitting device '{}' with prefix '{}'", device.name, device.prefix);

    let mut context = DeviceContext::new(device, signals, buses);
    context.begin(&mut output.header)?;

    let count = device.groups.len();
    for (index, group) in device.groups.iter().enumerate() {
        let last = index + 1 == count;
        context.group(group, last, output, diagnostics)?;
    }

    context.end(output)?;
    context.heads(output)?;
    context.defines(&mut output.header)
}

impl<'a> DeviceContext<'a> {
    fn new(device: &'a Device, signals: &'a SignalTable, buses: &'a mut BusGraph) -> Self {
        DeviceContext {
            device,
            signals,
            linker: GroupLinker::default(),
            buses,
            prefix: device.prefix.as_str().into(),
            defines: Vec::new(),
            groups: Vec::new(),
            table: Vec::new(),
        }
    }

    fn title(&self) -> String {
        self.device.name.to_uppercase()
    }

    fn begin<W: Write>(&mut self, header: &mut W) -> io::Result<()> {
        let title = self.title();

        section!(header, "{} IO configuration structure", title)?;
        write!(header, "typedef struct\n{{")?;

        section!(self.table, "{} IO configuration structure", title)?;
        write!(self.table, "OS_FLASH_MEM {0}_t {0} =\n{{", self.prefix)
    }

    fn group<W: Write>(
        &mut self,
        group: &PinGroup,
        last: bool,
        output: &mut Artifacts<W>,
        diagnostics: &mut Diagnostics,
    ) -> io::Result<()> {
        let kind = group.kind;
        trace!("Group {} with {} pins", kind, group.pins.len());

        write!(output.header, "\n  struct\n  {{\n")?;
        writeln!(output.header, "    PinGroupHdr hdr;")?;

        let paths: Vec<_> = group
            .pins
            .iter()
            .map(|pin| PinPath::new(&self.prefix, kind, &pin.name))
            .collect();

        write!(self.table, "\n  {{{{{}, ", group.pins.len())?;
        writeln!(self.table, "{}}}, /* {} */", ir::reference(paths.first()), kind)?;

        // Toda secuencia lleva al menos las posiciones reservadas
        if !group.pins.is_empty() {
            section!(output.source, "Parameters for {}", kind)?;
        }

        let count = group.pins.len();
        for (index, (pin, path)) in group.pins.iter().zip(paths).enumerate() {
            writeln!(output.header, "    Pin {};", pin.name)?;

            let parameters = Parameters::build(kind, pin, diagnostics);

            let last_pin = index + 1 == count;
            self.pin(pin, path, &parameters, last_pin, &mut output.source)?;
        }

        write!(self.table, "  }}")?;
        if !last {
            write!(self.table, ",")?;
        }

        writeln!(self.table)?;
        write!(output.header, "  }}\n  {};\n", kind)?;

        self.groups.push(format!("{}.{}", self.prefix, kind));
        Ok(())
    }

    fn pin<W: Write>(
        &mut self,
        pin: &Pin,
        path: PinPath,
        parameters: &Parameters,
        last: bool,
        source: &mut W,
    ) -> io::Result<()> {
        let array = path.parameter_array();
        writeln!(source, "static os_ushort {}[]= {{{}}};", array, parameters)?;
        let length = format!("sizeof({})/sizeof(os_ushort)", array);

        self.defines.push(Define::pin(&path));

        let link = match &pin.group {
            None => NULL.to_owned(),
            Some(tag) => {
                let linked = self.linker.link(tag, path.clone());
                let (next, first) = (ir::reference(linked.next), linked.first);

                if first {
                    self.defines.push(Define::group(&self.prefix, tag));
                }

                next
            }
        };

        let signal = self.signals.resolve(&pin.name).unwrap_or(NULL);

        let devconf = match &pin.device {
            Some(device) => format!("PINS_DEVCONF_PTR({})", bus::device_symbol(&self.prefix, device)),
            None => "PINS_DEVCONF_NULL".to_owned(),
        };

        if let Some(driver) = &pin.driver {
            let clock = pin.attribute("sclk").and_then(params::integer).unwrap_or(0);
            self.buses.attach(path.clone(), driver, clock);
        }

        let intconf = if parameters.has_interrupt() {
            let name = format!("{}_{}_intconf", self.prefix, pin.name);
            writeln!(source, "PINS_INTCONF_STRUCT({})", name)?;

            format!("PINS_INTCONF_PTR({})", name)
        } else {
            "PINS_INTCONF_NULL".to_owned()
        };

        write!(
            self.table,
            "    {{{}, {}, {}, {}, {}, {}, {} {} {}}}",
            path.kind().c_type(),
            pin.bank,
            pin.addr,
            array,
            length,
            link,
            signal,
            devconf,
            intconf
        )?;

        if !last {
            write!(self.table, ",")?;
        }

        writeln!(self.table, " /* {} */", pin.name)
    }

    fn end<W: Write>(&mut self, output: &mut Artifacts<W>) -> io::Result<()> {
        let title = self.title();
        let list = format!("{}_group_list", self.prefix);

        writeln!(self.table, "}};")?;
        output.source.write_all(&self.table)?;

        section!(output.source, "List of pin type groups")?;
        writeln!(
            output.source,
            "static OS_FLASH_MEM PinGroupHdr * OS_FLASH_MEM {}[] =\n{{",
            list
        )?;

        for (index, group) in self.groups.iter().enumerate() {
            if index > 0 {
                writeln!(output.source, ",")?;
            }

            write!(output.source, "  &{}.hdr", group)?;
        }

        writeln!(output.source, "\n}};")?;

        section!(output.source, "{} IO configuration top header structure", title)?;
        writeln!(
            output.source,
            "OS_FLASH_MEM IoPinsHdr {}_hdr = {{{1}, sizeof({1})/sizeof(PinGroupHdr*)}};",
            self.prefix, list
        )?;

        writeln!(output.header, "}}\n{}_t;", self.prefix)?;

        section!(output.header, "{} IO configuration top header structure", title)?;
        writeln!(output.header, "extern OS_FLASH_MEM_H IoPinsHdr {}_hdr;", self.prefix)?;

        section!(output.header, "Global {} IO configuration structure", title)?;
        writeln!(output.header, "extern OS_FLASH_MEM_H {0}_t {0};", self.prefix)
    }

    fn heads<W: Write>(&self, output: &mut Artifacts<W>) -> io::Result<()> {
        if self.linker.is_empty() {
            return Ok(());
        }

        section!(output.source, "Application's pin groups (linked list heads)")?;
        section!(output.header, "Application's pin groups (linked list heads)")?;

        for (tag, pin) in self.linker.heads() {
            let head = ir::group_head(&self.prefix, tag);

            writeln!(output.source, "OS_FLASH_MEM Pin *{} = {};", head, pin.address())?;
            writeln!(output.header, "extern OS_FLASH_MEM_H Pin *{};", head)?;
        }

        Ok(())
    }

    fn defines<W: Write>(&self, header: &mut W) -> io::Result<()> {
        section!(
            header,
            "Name defines for pins and application pin groups (use ifdef to check if HW has pin)"
        )?;

        for define in &self.defines {
            writeln!(header, "{}", define)?;
        }

        Ok(())
    }
}
