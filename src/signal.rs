//! Resolución de señales.
//!
//! Un manifiesto secundario opcional describe los bloques de memoria
//! (`mblk`) de un dispositivo y las señales que contienen. Un pin cuyo
//! nombre coincide con el de una señal lleva en su registro un puntero
//! a esa señal, de la forma `&device.mblk.signal`.

use crate::{
    error::{Diagnostics, Warning},
    source::{self, SourceError},
};

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, path::Path};

#[derive(Deserialize)]
struct SignalManifest {
    name: Option<String>,
    mblk: Option<Vec<MemoryBlock>>,
}

#[derive(Deserialize)]
struct MemoryBlock {
    name: Option<String>,

    #[serde(default)]
    groups: Vec<SignalGroup>,
}

#[derive(Deserialize)]
struct SignalGroup {
    #[serde(default)]
    signals: Vec<Signal>,
}

#[derive(Deserialize)]
struct Signal {
    name: Option<String>,
}

/// Tabla nombre de señal → referencia C.
#[derive(Debug, Default)]
pub struct SignalTable {
    references: HashMap<String, String>,
}

impl SignalTable {
    /// Carga un manifiesto de señales desde disco.
    ///
    /// Un archivo que no puede abrirse o que no es JSON con la forma de un
    /// manifiesto de señales es fatal. La ausencia de `name` o `mblk` solo
    /// deshabilita la resolución.
    pub fn load<P: AsRef<Path>>(path: P, diagnostics: &mut Diagnostics) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let document = path.display().to_string();

        let value = source::load(path)?;
        let table = SignalTable::from_value(value, &document, diagnostics)?;

        debug!("Loaded {} signals from {}", table.len(), document);
        Ok(table)
    }

    /// Construye la tabla a partir de un documento ya analizado.
    pub fn from_value(
        value: Value,
        document: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, SourceError> {
        let manifest: SignalManifest = serde_json::from_value(value)
            .map_err(|error| SourceError::Shape(document.to_owned(), error))?;

        let missing = |key: &'static str| Warning::SignalsMissingKey {
            document: document.to_owned(),
            key,
        };

        let device = match manifest.name {
            Some(device) => device,
            None => {
                diagnostics.warn(missing("name"));
                return Ok(SignalTable::default());
            }
        };

        let blocks = match manifest.mblk {
            Some(blocks) => blocks,
            None => {
                diagnostics.warn(missing("mblk"));
                return Ok(SignalTable::default());
            }
        };

        let mut references = HashMap::new();
        for block in blocks {
            let block_name = match block.name {
                Some(name) => name,
                None => {
                    diagnostics.warn(Warning::UnnamedBlock {
                        document: document.to_owned(),
                    });

                    continue;
                }
            };

            let signals = block
                .groups
                .into_iter()
                .flat_map(|group| group.signals)
                .filter_map(|signal| signal.name);

            // Una señal repetida reemplaza a la anterior
            for signal in signals {
                let reference = format!("&{}.{}.{}", device, block_name, signal);
                references.insert(signal, reference);
            }
        }

        Ok(SignalTable { references })
    }

    /// Referencia C de la señal homónima a un pin, si existe.
    pub fn resolve(&self, pin: &str) -> Option<&str> {
        self.references.get(pin).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.references.len()
    }
}
