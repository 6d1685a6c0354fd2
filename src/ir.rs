//! Registros intermedios compartidos entre componentes.
//!
//! Las fases de construcción de parámetros, enlazado y grafos de bus
//! no manipulan texto C directamente, sino estos registros. La
//! traducción a símbolos y referencias C ocurre en un solo lugar.

use crate::{
    attr::{Opcode, RESERVED},
    manifest::PinKind,
};

use std::{
    fmt::{self, Display},
    rc::Rc,
};

/// Puntero nulo en C.
pub const NULL: &str = "OS_NULL";

/// Identidad calificada de un pin dentro de la estructura generada.
///
/// Un pin se identifica por el prefijo de su dispositivo, el tipo de
/// su grupo y su nombre. Esta terna determina tanto el miembro de la
/// estructura (`pins.inputs.x`) como los demás símbolos derivados.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PinPath {
    prefix: Rc<str>,
    kind: PinKind,
    name: Rc<str>,
}

impl PinPath {
    pub fn new(prefix: &Rc<str>, kind: PinKind, name: &str) -> Self {
        PinPath {
            prefix: Rc::clone(prefix),
            kind,
            name: name.into(),
        }
    }

    pub fn prefix(&self) -> &Rc<str> {
        &self.prefix
    }

    pub fn kind(&self) -> PinKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dirección del miembro, como `&pins.inputs.x`.
    pub fn address(&self) -> String {
        format!("&{}", self)
    }

    /// Arreglo de parámetros, como `pins_inputs_x_prm`.
    pub fn parameter_array(&self) -> String {
        format!("{}_{}_{}_prm", self.prefix, self.kind, self.name)
    }

    /// Nombre de la constante de introspección, como `PINS_INPUTS_X`.
    pub fn define(&self) -> String {
        format!("{}_{}_{}", self.prefix, self.kind, self.name).to_uppercase()
    }
}

impl Display for PinPath {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}.{}.{}", self.prefix, self.kind, self.name)
    }
}

/// Referencia C a un pin opcional: su dirección o [`NULL`].
pub fn reference(pin: Option<&PinPath>) -> String {
    pin.map_or_else(|| NULL.to_owned(), PinPath::address)
}

/// Una entrada del arreglo de parámetros de un pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parameter {
    /// Posición que el firmware calcula en tiempo de ejecución.
    Reserved,

    /// Par código-valor derivado de un atributo.
    Set(Opcode, i64),
}

impl Display for Parameter {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Reserved => fmt.write_str(RESERVED),
            Parameter::Set(opcode, value) => write!(fmt, "{}, {}", opcode, value),
        }
    }
}

/// Constante de introspección `#define NAME "value"` en el layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: String,
}

impl Define {
    /// Constante para un pin.
    pub fn pin(path: &PinPath) -> Self {
        Define {
            name: path.define(),
            value: path.name().to_owned(),
        }
    }

    /// Constante para una etiqueta de grupo de aplicación.
    pub fn group(prefix: &str, tag: &str) -> Self {
        Define {
            name: format!("{}_{}_GROUP", prefix, tag).to_uppercase(),
            value: tag.to_owned(),
        }
    }
}

impl Display for Define {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "#define {} \"{}\"", self.name, self.value)
    }
}

/// Variable exportada que apunta a la cabeza de un grupo de aplicación.
pub fn group_head(prefix: &str, tag: &str) -> String {
    format!("{}_{}_group", prefix, tag)
}
