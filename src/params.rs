//! Construcción de parámetros de pin.
//!
//! Convierte el conjunto libre de atributos de un pin en la secuencia
//! ordenada de pares código-valor que el firmware lee al iniciar.
//! Cada secuencia comienza con dos posiciones reservadas que el firmware
//! llena en tiempo de ejecución.

use crate::{
    attr::Opcode,
    error::{Diagnostics, Warning},
    ir::Parameter,
    manifest::{Pin, PinKind},
};

use serde_json::Value;
use std::fmt::{self, Display};

/// Divisor de `speed`: el manifiesto usa unidades 100 veces más finas que el firmware.
const SPEED_DIVISOR: i64 = 100;

/// Secuencia de parámetros de un pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    list: Vec<Parameter>,
}

impl Parameters {
    /// Construye la secuencia de parámetros de un pin.
    ///
    /// Los atributos desconocidos y los valores no enteros se descartan
    /// con una advertencia. Los pines de tipo `timers` sin atributo
    /// `interrupt` explícito reciben uno al final, habilitado.
    pub fn build(kind: PinKind, pin: &Pin, diagnostics: &mut Diagnostics) -> Self {
        let mut list = vec![Parameter::Reserved, Parameter::Reserved];

        for attribute in &pin.attributes {
            let opcode = match Opcode::lookup(&attribute.key) {
                Some(opcode) => opcode,
                None => {
                    diagnostics.warn(Warning::UnknownAttribute {
                        pin: pin.name.clone(),
                        attribute: attribute.key.clone(),
                    });

                    continue;
                }
            };

            let value = match integer(&attribute.value) {
                Some(value) if opcode == Opcode::Speed => value.div_euclid(SPEED_DIVISOR),
                Some(value) => value,
                None => {
                    diagnostics.warn(Warning::BadValue {
                        pin: pin.name.clone(),
                        attribute: attribute.key.clone(),
                    });

                    continue;
                }
            };

            list.push(Parameter::Set(opcode, value));
        }

        let mut parameters = Parameters { list };
        if kind == PinKind::Timers && !parameters.has_interrupt() {
            parameters
                .list
                .push(Parameter::Set(Opcode::InterruptEnabled, 1));
        }

        parameters
    }

    /// Pares código-valor, sin las posiciones reservadas.
    pub fn pairs(&self) -> impl Iterator<Item = (Opcode, i64)> + '_ {
        self.list.iter().filter_map(|parameter| match parameter {
            Parameter::Set(opcode, value) => Some((*opcode, *value)),
            Parameter::Reserved => None,
        })
    }

    /// Determina si el pin atiende interrupciones.
    pub fn has_interrupt(&self) -> bool {
        self.pairs()
            .any(|(opcode, _)| opcode == Opcode::InterruptEnabled)
    }
}

impl Display for Parameters {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, parameter) in self.list.iter().enumerate() {
            if index > 0 {
                fmt.write_str(", ")?;
            }

            write!(fmt, "{}", parameter)?;
        }

        Ok(())
    }
}

/// Interpreta un valor de atributo como entero.
///
/// Los reales se truncan, los booleanos valen 1 o 0 y las cadenas
/// se aceptan si contienen un entero decimal.
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|real| real.trunc() as i64)),

        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }
}
