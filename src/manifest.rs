//! Decodificación validada de manifiestos.
//!
//! Un manifiesto es un árbol JSON con una colección raíz `io` de
//! dispositivos, cada uno con grupos de pines tipados. Este módulo
//! lo reduce a registros fuertemente tipados ([`Device`], [`PinGroup`],
//! [`Pin`]) en una única pasada, de forma que la distinción entre
//! errores fatales y recuperables se resuelve aquí y no en cada
//! función de emisión.
//!
//! # Errores
//! Cualquier campo requerido faltante aborta la decodificación con un
//! [`ManifestError`] ubicado. Un grupo de tipo desconocido se omite,
//! junto a todos sus pines, con una advertencia.

use crate::{
    attr,
    error::{Diagnostics, Warning},
    source::{Located, Location},
};

use serde_json::{Map, Value};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use thiserror::Error;

/// Clave de la colección raíz de dispositivos.
pub const ROOT_KEY: &str = "io";

/// Prefijo de identificadores generados cuando el dispositivo no define uno.
pub const DEFAULT_PREFIX: &str = "pins";

/// Nombre de dispositivo cuando el manifiesto no define uno.
pub const DEFAULT_DEVICE_NAME: &str = "ioblock";

/// Error de decodificación.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("'io' not found")]
    MissingRoot,

    #[error("'groups' not found for {0}")]
    MissingGroups(String),

    #[error("'name' not found for group in {0}")]
    MissingGroupName(String),

    #[error("'pins' not found for {0} {1}")]
    MissingPins(String, PinKind),

    #[error("'name' not found for pin in {0} {1}")]
    MissingPinName(String, PinKind),

    #[error("Type mismatch: expected {0}, found {1}")]
    ExpectedType(&'static str, &'static str),

    #[error("Integer {0} out of range")]
    OutOfRange(u64),
}

pub type Decode<T> = Result<T, Located<ManifestError>>;

/// Tipo estructural de un grupo de pines.
///
/// Este es un conjunto cerrado: el firmware conoce exactamente
/// estas categorías.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PinKind {
    Inputs,
    Outputs,
    AnalogInputs,
    AnalogOutputs,
    Pwm,
    Spi,
    Timers,
    Cameras,
    Uart,
}

impl PinKind {
    /// Nombre del grupo tal como aparece en el manifiesto y en la estructura C.
    pub fn name(self) -> &'static str {
        use PinKind::*;

        match self {
            Inputs        => "inputs",
            Outputs       => "outputs",
            AnalogInputs  => "analog_inputs",
            AnalogOutputs => "analog_outputs",
            Pwm           => "pwm",
            Spi           => "spi",
            Timers        => "timers",
            Cameras       => "cameras",
            Uart          => "uart",
        }
    }

    /// Enumerador `pinType` en C.
    pub fn c_type(self) -> &'static str {
        use PinKind::*;

        match self {
            Inputs        => "PIN_INPUT",
            Outputs       => "PIN_OUTPUT",
            AnalogInputs  => "PIN_ANALOG_INPUT",
            AnalogOutputs => "PIN_ANALOG_OUTPUT",
            Pwm           => "PIN_PWM",
            Spi           => "PIN_SPI",
            Timers        => "PIN_TIMER",
            Cameras       => "PIN_CAMERA",
            Uart          => "PIN_UART",
        }
    }
}

impl Display for PinKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for PinKind {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use PinKind::*;

        const KINDS: &[PinKind] = &[
            Inputs,
            Outputs,
            AnalogInputs,
            AnalogOutputs,
            Pwm,
            Spi,
            Timers,
            Cameras,
            Uart,
        ];

        KINDS
            .iter()
            .copied()
            .find(|kind| kind.name() == string)
            .ok_or(())
    }
}

/// Un manifiesto decodificado.
#[derive(Debug)]
pub struct Manifest {
    pub devices: Vec<Device>,
}

/// Unidad de E/S de nivel superior.
#[derive(Debug)]
pub struct Device {
    pub name: String,
    pub prefix: String,
    pub groups: Vec<PinGroup>,
    pub location: Location,
}

/// Grupo de pines de un tipo reconocido.
#[derive(Debug)]
pub struct PinGroup {
    pub kind: PinKind,
    pub pins: Vec<Pin>,
    pub location: Location,
}

/// Una línea de E/S direccionable.
#[derive(Debug)]
pub struct Pin {
    pub name: String,
    pub bank: i64,
    pub addr: i64,

    /// Etiqueta de grupo de aplicación, independiente de [`PinKind`].
    pub group: Option<String>,

    /// Driver de chip en bus SPI/I2C.
    pub driver: Option<String>,

    /// Dispositivo de bus al que pertenece este pin, como `"spi.adc1"`.
    pub device: Option<String>,

    /// Atributos no estructurales, en orden de declaración.
    pub attributes: Vec<Attribute>,

    pub location: Location,
}

/// Un atributo libre de pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

impl Pin {
    /// Busca un atributo no estructural por clave.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|attribute| attribute.key == key)
            .map(|attribute| &attribute.value)
    }
}

impl Manifest {
    /// Decodifica la raíz de un documento.
    ///
    /// Los dispositivos, grupos y pines conservan el orden en que
    /// fueron declarados, que es parte del contrato con el firmware.
    pub fn decode(root: &Value, location: Location, diagnostics: &mut Diagnostics) -> Decode<Self> {
        let object = object(root, &location)?;

        let io_location = location.key(ROOT_KEY);
        let io = object
            .get(ROOT_KEY)
            .ok_or_else(|| Located::at(ManifestError::MissingRoot, location.clone()))?;

        let devices = array(io, &io_location)?
            .iter()
            .enumerate()
            .map(|(index, device)| Device::decode(device, io_location.index(index), diagnostics))
            .collect::<Decode<Vec<_>>>()?;

        Ok(Manifest { devices })
    }
}

impl Device {
    fn decode(value: &Value, location: Location, diagnostics: &mut Diagnostics) -> Decode<Self> {
        let object = object(value, &location)?;

        let name = optional_string(object, "name", &location)?
            .unwrap_or(DEFAULT_DEVICE_NAME)
            .to_owned();

        let prefix = optional_string(object, "prefix", &location)?
            .unwrap_or(DEFAULT_PREFIX)
            .to_owned();

        let groups_location = location.key("groups");
        let groups = object.get("groups").ok_or_else(|| {
            Located::at(ManifestError::MissingGroups(name.clone()), location.clone())
        })?;

        let mut decoded = Vec::new();
        for (index, group) in array(groups, &groups_location)?.iter().enumerate() {
            let group_location = groups_location.index(index);
            if let Some(group) = PinGroup::decode(group, &name, group_location, diagnostics)? {
                decoded.push(group);
            }
        }

        Ok(Device {
            name,
            prefix,
            groups: decoded,
            location,
        })
    }
}

impl PinGroup {
    /// Decodifica un grupo, o `None` si su tipo es desconocido.
    fn decode(
        value: &Value,
        device: &str,
        location: Location,
        diagnostics: &mut Diagnostics,
    ) -> Decode<Option<Self>> {
        let object = object(value, &location)?;

        let kind_name = optional_string(object, "name", &location)?.ok_or_else(|| {
            Located::at(
                ManifestError::MissingGroupName(device.to_owned()),
                location.clone(),
            )
        })?;

        // Un tipo desconocido no es fatal y no se revisa su contenido
        let kind = match PinKind::from_str(kind_name) {
            Ok(kind) => kind,
            Err(()) => {
                diagnostics.warn(Warning::UnknownGroup {
                    device: device.to_owned(),
                    kind: kind_name.to_owned(),
                });

                return Ok(None);
            }
        };

        let pins_location = location.key("pins");
        let pins = object.get("pins").ok_or_else(|| {
            Located::at(
                ManifestError::MissingPins(device.to_owned(), kind),
                location.clone(),
            )
        })?;

        let pins = array(pins, &pins_location)?
            .iter()
            .enumerate()
            .map(|(index, pin)| Pin::decode(pin, device, kind, pins_location.index(index)))
            .collect::<Decode<Vec<_>>>()?;

        Ok(Some(PinGroup {
            kind,
            pins,
            location,
        }))
    }
}

impl Pin {
    fn decode(value: &Value, device: &str, kind: PinKind, location: Location) -> Decode<Self> {
        let object = object(value, &location)?;

        let name = optional_string(object, "name", &location)?
            .ok_or_else(|| {
                Located::at(
                    ManifestError::MissingPinName(device.to_owned(), kind),
                    location.clone(),
                )
            })?
            .to_owned();

        let owned = |key: &str| -> Decode<Option<String>> {
            Ok(optional_string(object, key, &location)?.map(str::to_owned))
        };

        let group = owned("group")?;
        let driver = owned("driver")?;
        let device_ref = owned("device")?;

        let bank = optional_integer(object, "bank", &location)?.unwrap_or(0);
        let addr = optional_integer(object, "addr", &location)?.unwrap_or(0);

        let attributes = object
            .iter()
            .filter(|(key, _)| !attr::is_structural(key))
            .map(|(key, value)| Attribute {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();

        Ok(Pin {
            name,
            bank,
            addr,
            group,
            driver,
            device: device_ref,
            attributes,
            location,
        })
    }
}

/// Nombre del tipo JSON de un valor, para diagnósticos.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &'static str, found: &Value, location: &Location) -> Located<ManifestError> {
    Located::at(
        ManifestError::ExpectedType(expected, type_name(found)),
        location.clone(),
    )
}

fn object<'a>(value: &'a Value, location: &Location) -> Decode<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| mismatch("object", value, location))
}

fn array<'a>(value: &'a Value, location: &Location) -> Decode<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch("array", value, location))
}

fn optional_string<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    location: &Location,
) -> Decode<Option<&'a str>> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::String(string)) => Ok(Some(string.as_str())),
        Some(other) => Err(mismatch("string", other, &location.key(key))),
    }
}

fn optional_integer(object: &Map<String, Value>, key: &str, location: &Location) -> Decode<Option<i64>> {
    let value = match object.get(key) {
        None => return Ok(None),
        Some(value) => value,
    };

    match (value.as_i64(), value.as_u64()) {
        (Some(integer), _) => Ok(Some(integer)),
        (None, Some(huge)) => Err(Located::at(ManifestError::OutOfRange(huge), location.key(key))),
        (None, None) => Err(mismatch("integer", value, &location.key(key))),
    }
}
