//! Emisión de artefactos C.
//!
//! El emisor recorre el árbol de manifiestos una única vez, en orden de
//! declaración, y produce simultáneamente el layout (`.h`) y la tabla
//! inicializada (`.c`). Cada declaración en el layout tiene una
//! definición correspondiente en la tabla, en el mismo orden.
//!
//! # Estados
//! [`Emitter::start()`] escribe los preámbulos, [`Emitter::device()`]
//! se invoca una vez por dispositivo y [`Emitter::finish()`] consume
//! el emisor, emite el bus de dispositivos y cierra el include guard.
//! No es posible emitir un dispositivo luego de finalizar.

use crate::{
    bus::BusGraph,
    error::Diagnostics,
    manifest::{Device, Manifest},
    signal::SignalTable,
};

use log::debug;
use std::io::{self, Write};

mod device;
mod devicebus;

/// Marca con la que inician ambos artefactos.
pub const GENERATED_MARKER: &str = "/* This file is generated by pinsc, do not modify. */";

/// Par de flujos de salida.
#[derive(Debug, Default)]
pub struct Artifacts<W> {
    /// Layout: declaraciones de tipos, símbolos y constantes.
    pub header: W,

    /// Tabla: definiciones inicializadas.
    pub source: W,
}

/// Emisor de artefactos en curso.
pub struct Emitter<'a, W: Write> {
    output: &'a mut Artifacts<W>,
    signals: &'a SignalTable,
    buses: BusGraph,
}

impl<'a, W: Write> Emitter<'a, W> {
    /// Escribe los preámbulos de ambos artefactos.
    pub fn start(
        output: &'a mut Artifacts<W>,
        signals: &'a SignalTable,
        guard: &str,
    ) -> io::Result<Self> {
        writeln!(output.source, "{}", GENERATED_MARKER)?;
        writeln!(output.source, "#include \"pins.h\"")?;

        writeln!(output.header, "{}", GENERATED_MARKER)?;
        writeln!(output.header, "#ifndef {}", guard)?;
        writeln!(output.header, "#define {}", guard)?;
        writeln!(output.header, "OSAL_C_HEADER_BEGINS")?;

        Ok(Emitter {
            output,
            signals,
            buses: BusGraph::default(),
        })
    }

    /// Emite un dispositivo completo.
    ///
    /// Las listas de grupos no se comparten entre dispositivos; los buses sí.
    pub fn device(&mut self, device: &Device, diagnostics: &mut Diagnostics) -> io::Result<()> {
        device::emit(device, self.signals, &mut self.buses, self.output, diagnostics)
    }

    /// Emite el bus de dispositivos y cierra el layout.
    pub fn finish(self) -> io::Result<()> {
        devicebus::emit(&self.buses, self.output)?;

        writeln!(self.output.header, "\nOSAL_C_HEADER_ENDS")?;
        writeln!(self.output.header, "#endif")
    }
}

/// Emite todos los dispositivos de todos los manifiestos.
pub fn emit<W: Write>(
    manifests: &[Manifest],
    signals: &SignalTable,
    guard: &str,
    output: &mut Artifacts<W>,
    diagnostics: &mut Diagnostics,
) -> io::Result<()> {
    let mut emitter = Emitter::start(output, signals, guard)?;

    for device in manifests.iter().flat_map(|manifest| &manifest.devices) {
        emitter.device(device, diagnostics)?;
    }

    debug!("All devices emitted");
    emitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Warning, source::Location};
    use serde_json::{json, Value};

    const TINY_HEADER: &str = r#"/* This file is generated by pinsc, do not modify. */
#ifndef IOC_TEST_INCLUDED
#define IOC_TEST_INCLUDED
OSAL_C_HEADER_BEGINS

/* TINY IO configuration structure */
typedef struct
{
  struct
  {
    PinGroupHdr hdr;
    Pin led;
  }
  outputs;
}
pins_t;

/* TINY IO configuration top header structure */
extern OS_FLASH_MEM_H IoPinsHdr pins_hdr;

/* Global TINY IO configuration structure */
extern OS_FLASH_MEM_H pins_t pins;

/* Name defines for pins and application pin groups (use ifdef to check if HW has pin) */
#define PINS_OUTPUTS_LED "led"

/* SPI and I2C initialization */
#if PINS_SPI || PINS_I2C

/* SPI and I2C bus structures */

/* Device bus main structure */
extern PinsDeviceBus pins_devicebus;

/* SPI and I2C device structures */

/* Initialize all SPI and I2C bus devices */
void pins_initialize_bus_devices(void);
#endif

OSAL_C_HEADER_ENDS
#endif
"#;

    const TINY_SOURCE: &str = r#"/* This file is generated by pinsc, do not modify. */
#include "pins.h"

/* Parameters for outputs */
static os_ushort pins_outputs_led_prm[]= {PIN_RV, PIN_RV};

/* TINY IO configuration structure */
OS_FLASH_MEM pins_t pins =
{
  {{1, &pins.outputs.led}, /* outputs */
    {PIN_OUTPUT, 0, 2, pins_outputs_led_prm, sizeof(pins_outputs_led_prm)/sizeof(os_ushort), OS_NULL, OS_NULL PINS_DEVCONF_NULL PINS_INTCONF_NULL} /* led */
  }
};

/* List of pin type groups */
static OS_FLASH_MEM PinGroupHdr * OS_FLASH_MEM pins_group_list[] =
{
  &pins.outputs.hdr
};

/* TINY IO configuration top header structure */
OS_FLASH_MEM IoPinsHdr pins_hdr = {pins_group_list, sizeof(pins_group_list)/sizeof(PinGroupHdr*)};

#if PINS_SPI || PINS_I2C

/* SPI and I2C bus structures */

/* Device bus main structure */
PinsDeviceBus pins_devicebus = {OS_NULL};

/* SPI and I2C device structures */

/* Initialize all SPI and I2C bus devices */
void pins_initialize_bus_devices(void)
{
}
#endif
"#;

    struct Compiled {
        header: String,
        source: String,
        warnings: Vec<Warning>,
    }

    fn compile_with(value: Value, signals: &SignalTable) -> Compiled {
        let mut diagnostics = Diagnostics::default();
        let manifest = Manifest::decode(&value, Location::root("test.json"), &mut diagnostics).unwrap();

        let mut output = Artifacts::<Vec<u8>>::default();
        emit(&[manifest], signals, "IOC_TEST_INCLUDED", &mut output, &mut diagnostics).unwrap();

        Compiled {
            header: String::from_utf8(output.header).unwrap(),
            source: String::from_utf8(output.source).unwrap(),
            warnings: diagnostics.into_warnings(),
        }
    }

    fn compile(value: Value) -> Compiled {
        compile_with(value, &SignalTable::default())
    }

    /// Posición de una línea que debe existir en el texto.
    fn line_of(text: &str, line: &str) -> usize {
        text.lines()
            .position(|candidate| candidate == line)
            .unwrap_or_else(|| panic!("line not found: {}\n{}", line, text))
    }

    #[test]
    fn single_pin_device() {
        let compiled = compile(json!({
            "io": [{"name": "tiny", "groups": [
                {"name": "outputs", "pins": [{"name": "led", "addr": 2}]}
            ]}]
        }));

        assert_eq!(compiled.header, TINY_HEADER);
        assert_eq!(compiled.source, TINY_SOURCE);
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn pins_keep_declaration_order() {
        let compiled = compile(json!({
            "io": [{"groups": [
                {"name": "inputs", "pins": [
                    {"name": "p3", "addr": 3},
                    {"name": "p1", "addr": 1},
                    {"name": "p2", "addr": 2}
                ]}
            ]}]
        }));

        let source = &compiled.source;
        assert!(source.contains("  {{3, &pins.inputs.p3}, /* inputs */\n"));

        let positions: Vec<_> = ["p3", "p1", "p2"]
            .iter()
            .map(|name| source.find(&format!("/* {} */", name)).unwrap())
            .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        // Solo el último registro del grupo carece de coma
        assert!(source.contains("PINS_INTCONF_NULL}, /* p1 */"));
        assert!(source.contains("PINS_INTCONF_NULL} /* p2 */"));
    }

    #[test]
    fn group_links_are_push_front() {
        let compiled = compile(json!({
            "io": [{"groups": [
                {"name": "inputs", "pins": [{"name": "a", "group": "g"}]},
                {"name": "outputs", "pins": [
                    {"name": "b", "group": "g"},
                    {"name": "c", "group": "g"}
                ]}
            ]}]
        }));

        let (header, source) = (&compiled.header, &compiled.source);

        assert!(source.contains("sizeof(os_ushort), OS_NULL, OS_NULL PINS_DEVCONF_NULL PINS_INTCONF_NULL} /* a */"));
        assert!(source.contains("sizeof(os_ushort), &pins.inputs.a, OS_NULL PINS_DEVCONF_NULL PINS_INTCONF_NULL}, /* b */"));
        assert!(source.contains("sizeof(os_ushort), &pins.outputs.b, OS_NULL PINS_DEVCONF_NULL PINS_INTCONF_NULL} /* c */"));
        assert!(source.contains("OS_FLASH_MEM Pin *pins_g_group = &pins.outputs.c;\n"));
        assert!(header.contains("extern OS_FLASH_MEM_H Pin *pins_g_group;\n"));

        // Cada etiqueta produce su constante al aparecer por primera vez
        let a = line_of(header, "#define PINS_INPUTS_A \"a\"");
        let tag = line_of(header, "#define PINS_G_GROUP \"g\"");
        let b = line_of(header, "#define PINS_OUTPUTS_B \"b\"");
        assert!(a < tag && tag < b);
        assert_eq!(header.matches("_GROUP \"g\"").count(), 1);
    }

    #[test]
    fn bus_devices_chain_and_drivers_dedup() {
        let compiled = compile(json!({
            "io": [{"groups": [
                {"name": "spi", "pins": [
                    {"name": "adc1", "driver": "mcp3208", "sclk": 18, "cs": 5},
                    {"name": "adc2", "driver": "mcp3208", "sclk": 18, "cs": 4}
                ]},
                {"name": "analog_inputs", "pins": [
                    {"name": "ch0", "device": "spi.adc1", "addr": 0}
                ]}
            ]}]
        }));

        let (header, source) = (&compiled.header, &compiled.source);

        assert_eq!(source.matches("PinsBus pins_bus_").count(), 1);
        assert!(source.contains(
            "PinsBus pins_bus_spi_18 = {PINS_SPI_BUS, &pins_device_spi_adc2, OS_NULL};\n"
        ));
        assert!(source.contains("PinsDeviceBus pins_devicebus = {&pins_bus_spi_18};\n"));
        assert!(source.contains(
            "PinsBusDevice pins_device_spi_adc1 = {&pins.spi.adc1, &pins_bus_spi_18, OS_NULL, \
             &mcp3208_gen_req, &mcp3208_proc_resp, &mcp3208_set, &mcp3208_get};\n"
        ));
        assert!(source.contains(
            "PinsBusDevice pins_device_spi_adc2 = {&pins.spi.adc2, &pins_bus_spi_18, \
             &pins_device_spi_adc1, &mcp3208_gen_req, &mcp3208_proc_resp, &mcp3208_set, &mcp3208_get};\n"
        ));
        assert!(source.contains("PINS_DEVCONF_PTR(pins_device_spi_adc1) PINS_INTCONF_NULL} /* ch0 */"));

        assert_eq!(header.matches("/* mcp3208 driver functions */").count(), 1);
        assert_eq!(header.matches("void mcp3208_initialize_driver(void);").count(), 1);
        assert!(header.contains("osalStatus mcp3208_proc_resp(struct PinsBusDevice *device);\n"));
        assert!(header.contains("extern PinsBus pins_bus_spi_18;\n"));
        assert!(header.contains("extern PinsBusDevice pins_device_spi_adc2;\n"));

        // Buses, luego drivers, luego dispositivos
        let bus = line_of(source, "    pins_init_bus(&pins_bus_spi_18);");
        let driver = line_of(source, "    mcp3208_initialize_driver();");
        let first = line_of(source, "    mcp3208_initialize(&pins_device_spi_adc1);");
        let second = line_of(source, "    mcp3208_initialize(&pins_device_spi_adc2);");
        assert!(bus < driver && driver < first && first < second);
        assert_eq!(source.matches("_initialize_driver();").count(), 1);
    }

    #[test]
    fn buses_form_a_list() {
        let compiled = compile(json!({
            "io": [{"groups": [
                {"name": "spi", "pins": [{"name": "adc", "driver": "mcp3208", "sclk": 18}]},
                {"name": "uart", "pins": [{"name": "oled", "driver": "ssd1306", "sclk": 22}]}
            ]}]
        }));

        let source = &compiled.source;
        assert!(source.contains("PinsBus pins_bus_spi_18 = {PINS_SPI_BUS, &pins_device_spi_adc, OS_NULL};\n"));
        assert!(source.contains(
            "PinsBus pins_bus_uart_22 = {PINS_I2C_BUS, &pins_device_uart_oled, &pins_bus_spi_18};\n"
        ));
        assert!(source.contains("PinsDeviceBus pins_devicebus = {&pins_bus_uart_22};\n"));
    }

    #[test]
    fn timers_get_interrupt_configuration() {
        let compiled = compile(json!({
            "io": [{"groups": [
                {"name": "timers", "pins": [{"name": "blink", "frequency": 2, "timer": 0}]}
            ]}]
        }));

        let source = &compiled.source;
        let array = line_of(
            source,
            "static os_ushort pins_timers_blink_prm[]= {PIN_RV, PIN_RV, PIN_FREQENCY, 2, \
             PIN_TIMER_SELECT, 0, PIN_INTERRUPT_ENABLED, 1};",
        );

        let intconf = line_of(source, "PINS_INTCONF_STRUCT(pins_blink_intconf)");
        assert_eq!(array + 1, intconf);
        assert!(source.contains("PINS_DEVCONF_NULL PINS_INTCONF_PTR(pins_blink_intconf)} /* blink */"));
    }

    #[test]
    fn signals_are_referenced() {
        let mut diagnostics = Diagnostics::default();
        let signals = SignalTable::from_value(
            json!({"name": "gina", "mblk": [
                {"name": "exp", "groups": [{"signals": [{"name": "led_builtin"}]}]}
            ]}),
            "signals.json",
            &mut diagnostics,
        )
        .unwrap();

        let compiled = compile_with(
            json!({
                "io": [{"groups": [
                    {"name": "outputs", "pins": [{"name": "led_builtin"}, {"name": "other"}]}
                ]}]
            }),
            &signals,
        );

        let source = &compiled.source;
        assert!(source.contains("OS_NULL, &gina.exp.led_builtin PINS_DEVCONF_NULL PINS_INTCONF_NULL}, /* led_builtin */"));
        assert!(source.contains("OS_NULL, OS_NULL PINS_DEVCONF_NULL PINS_INTCONF_NULL} /* other */"));
    }

    #[test]
    fn unknown_and_empty_groups() {
        let compiled = compile(json!({
            "io": [{"name": "carol", "groups": [
                {"name": "outputs", "pins": []},
                {"name": "leds", "pins": [{"name": "ghost"}]},
                {"name": "inputs", "pins": [{"name": "x", "bogus": 1, "frequency": 50}]}
            ]}]
        }));

        let (header, source) = (&compiled.header, &compiled.source);

        assert!(source.contains("  {{0, OS_NULL}, /* outputs */\n  },\n"));
        assert!(!source.contains("ghost"));
        assert!(!header.contains("ghost"));
        assert!(source.contains("{PIN_RV, PIN_RV, PIN_FREQENCY, 50}"));
        assert!(source.contains("  &pins.outputs.hdr,\n  &pins.inputs.hdr\n};\n"));

        assert_eq!(
            compiled.warnings,
            [
                Warning::UnknownGroup {
                    device: "carol".into(),
                    kind: "leds".into()
                },
                Warning::UnknownAttribute {
                    pin: "x".into(),
                    attribute: "bogus".into()
                }
            ]
        );
    }

    #[test]
    fn devices_have_independent_state() {
        let compiled = compile(json!({
            "io": [
                {"name": "first", "prefix": "one", "groups": [
                    {"name": "outputs", "pins": [{"name": "a", "group": "g"}]}
                ]},
                {"name": "second", "prefix": "two", "groups": [
                    {"name": "outputs", "pins": [{"name": "b", "group": "g"}]}
                ]}
            ]
        }));

        let (header, source) = (&compiled.header, &compiled.source);

        // La etiqueta "g" del segundo dispositivo inicia una lista nueva
        assert!(source.contains("OS_NULL, OS_NULL PINS_DEVCONF_NULL PINS_INTCONF_NULL} /* b */"));
        assert!(source.contains("OS_FLASH_MEM Pin *one_g_group = &one.outputs.a;\n"));
        assert!(source.contains("OS_FLASH_MEM Pin *two_g_group = &two.outputs.b;\n"));
        assert!(source.contains("OS_FLASH_MEM IoPinsHdr two_hdr = {two_group_list,"));
        assert!(header.contains("extern OS_FLASH_MEM_H one_t one;\n"));
        assert!(header.contains("/* SECOND IO configuration structure */\n"));
        assert_eq!(header.matches("#ifndef IOC_TEST_INCLUDED").count(), 1);
        assert!(header.ends_with("\nOSAL_C_HEADER_ENDS\n#endif\n"));
    }

    #[test]
    fn device_bus_keeps_firmware_names() {
        let compiled = compile(json!({
            "io": [
                {"name": "gina", "prefix": "gina", "groups": [
                    {"name": "spi", "pins": [{"name": "adc", "driver": "mcp3208", "sclk": 18}]}
                ]},
                {"name": "extra", "prefix": "extra", "groups": [
                    {"name": "spi", "pins": [{"name": "adc", "driver": "mcp3208", "sclk": 18}]},
                    {"name": "uart", "pins": [{"name": "oled", "driver": "ssd1306", "sclk": 22}]}
                ]}
            ]
        }));

        let (header, source) = (&compiled.header, &compiled.source);

        // Una sola estructura principal para todos los dispositivos
        assert_eq!(source.matches("PinsDeviceBus ").count(), 1);
        assert_eq!(source.matches("void pins_initialize_bus_devices(void)").count(), 1);
        assert_eq!(header.matches("extern PinsDeviceBus pins_devicebus;").count(), 1);
        assert_eq!(header.matches("void pins_initialize_bus_devices(void);").count(), 1);
        assert!(!source.contains("gina_devicebus"));

        assert!(source.contains("PinsBus gina_bus_spi_18 = {PINS_SPI_BUS, &gina_device_spi_adc, OS_NULL};\n"));
        assert!(source.contains(
            "PinsBus extra_bus_spi_18 = {PINS_SPI_BUS, &extra_device_spi_adc, &gina_bus_spi_18};\n"
        ));
        assert!(source.contains("PinsDeviceBus pins_devicebus = {&extra_bus_uart_22};\n"));
        assert!(source.contains(
            "PinsBusDevice gina_device_spi_adc = {&gina.spi.adc, &gina_bus_spi_18, OS_NULL, \
             &mcp3208_gen_req, &mcp3208_proc_resp, &mcp3208_set, &mcp3208_get};\n"
        ));

        // Buses de todos los dispositivos, luego drivers, luego chips
        let gina = line_of(source, "    pins_init_bus(&gina_bus_spi_18);");
        let uart = line_of(source, "    pins_init_bus(&extra_bus_uart_22);");
        let driver = line_of(source, "    ssd1306_initialize_driver();");
        let chip = line_of(source, "    mcp3208_initialize(&gina_device_spi_adc);");
        assert!(gina < uart && uart < driver && driver < chip);
        assert_eq!(source.matches("mcp3208_initialize_driver();").count(), 1);
        assert_eq!(header.matches("/* mcp3208 driver functions */").count(), 1);

        // El bloque de buses va después de ambos dispositivos
        let extra = line_of(source, "OS_FLASH_MEM IoPinsHdr extra_hdr = {extra_group_list, sizeof(extra_group_list)/sizeof(PinGroupHdr*)};");
        assert!(extra < line_of(source, "#if PINS_SPI || PINS_I2C"));
    }

    #[test]
    fn every_pin_has_a_parameter_array() {
        let compiled = compile(json!({
            "io": [{"groups": [
                {"name": "outputs", "pins": []},
                {"name": "inputs", "pins": [{"name": "bare"}, {"name": "odd", "bogus": 1}]}
            ]}]
        }));

        let source = &compiled.source;
        assert!(source.contains("static os_ushort pins_inputs_bare_prm[]= {PIN_RV, PIN_RV};\n"));
        assert!(source.contains("static os_ushort pins_inputs_odd_prm[]= {PIN_RV, PIN_RV};\n"));
        assert!(source.contains(
            "{PIN_INPUT, 0, 0, pins_inputs_odd_prm, sizeof(pins_inputs_odd_prm)/sizeof(os_ushort), OS_NULL,"
        ));

        // El comentario de sección aparece una vez por grupo con pines
        assert_eq!(source.matches("/* Parameters for inputs */").count(), 1);
        assert!(!source.contains("/* Parameters for outputs */"));
    }

    #[test]
    fn output_is_deterministic() {
        let manifest = json!({
            "io": [{"groups": [
                {"name": "inputs", "pins": [{"name": "k1", "group": "keys"}, {"name": "k0", "group": "keys"}]},
                {"name": "spi", "pins": [{"name": "adc", "driver": "mcp3208", "sclk": 18}]}
            ]}]
        });

        let first = compile(manifest.clone());
        let second = compile(manifest);

        assert_eq!(first.header, second.header);
        assert_eq!(first.source, second.source);
    }
}
