//! Errores fatales y diagnósticos recuperables.
//!
//! Una condición fatal aborta la compilación completa: los índices y
//! contadores que se emiten en la tabla dejarían de ser consistentes
//! si se omitiera solo el objeto defectuoso. Las condiciones
//! recuperables se reportan como [`Warning`] y la compilación continúa.

use crate::{manifest::ManifestError, source::Located, source::SourceError};
use log::warn;
use std::io;
use thiserror::Error;

/// Error fatal de compilación.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CompileError {
    /// No se indicó ningún manifiesto de entrada.
    #[error("No source files")]
    NoInputs,

    /// Un manifiesto no pudo cargarse.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Un manifiesto carece de un campo requerido o tiene un tipo incorrecto.
    #[error(transparent)]
    Manifest(#[from] Located<ManifestError>),

    /// Falló la emisión de los artefactos en memoria.
    #[error("Failed to emit artifacts")]
    Emit(#[source] io::Error),

    /// No fue posible escribir un artefacto a disco.
    #[error("Failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Condición recuperable.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// El grupo de pines no es de un tipo conocido; se omite junto a sus pines.
    #[error("Pin group '{kind}' in {device} ignored")]
    UnknownGroup { device: String, kind: String },

    /// El atributo no existe en la tabla de atributos.
    #[error("Pin '{pin}' has unknown attribute '{attribute}', ignored")]
    UnknownAttribute { pin: String, attribute: String },

    /// El atributo existe pero su valor no es entero.
    #[error("Pin '{pin}' attribute '{attribute}' is not an integer, ignored")]
    BadValue { pin: String, attribute: String },

    /// El manifiesto de señales carece de una clave necesaria.
    #[error("'{key}' not found in {document}, signals disabled")]
    SignalsMissingKey { document: String, key: &'static str },

    /// Un bloque de memoria del manifiesto de señales no tiene nombre.
    #[error("Memory block without 'name' in {document} skipped")]
    UnnamedBlock { document: String },
}

/// Receptor de diagnósticos.
///
/// Cada advertencia se registra en el log en cuanto ocurre y además
/// se acumula, de forma que el llamador pueda inspeccionarlas.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Reporta una condición recuperable.
    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Advertencias reportadas hasta el momento.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Toma ownership de las advertencias acumuladas.
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
