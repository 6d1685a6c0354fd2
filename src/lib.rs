//! Compilador de manifiestos de pines a C.
//!
//! # Front end
//! Cada compilación deriva de uno o más manifiestos JSON que describen
//! dispositivos de E/S, sus grupos de pines y los atributos de cada pin.
//! Los documentos se cargan en [`source`] preservando el orden de
//! declaración y se decodifican por completo en [`manifest`], donde se
//! resuelve qué condiciones son fatales y cuáles son advertencias. Un
//! manifiesto secundario opcional de señales se resuelve en [`signal`].
//!
//! # Back end
//! El emisor en [`target`] recorre los dispositivos una sola vez y
//! produce dos artefactos: un layout (`.h`) y una tabla inicializada
//! (`.c`). Por cada pin, la tabla de atributos en [`attr`] y el
//! constructor de parámetros en [`params`] producen su arreglo de
//! parámetros, [`link`] encadena los grupos de aplicación y [`bus`]
//! construye el grafo de buses SPI/I2C. Los registros compartidos entre
//! estas fases se describen en [`ir`]. Finalmente, [`artifact`] escribe
//! ambos artefactos a disco únicamente si la compilación tuvo éxito.

#[macro_use]
mod macros;

pub mod artifact;
pub mod attr;
pub mod bus;
pub mod error;
pub mod ir;
pub mod link;
pub mod manifest;
pub mod params;
pub mod signal;
pub mod source;

mod codegen;

/// Emisión de código.
///
/// Este módulo reexporta suficientes ítems internos relacionados a generación de código para
/// emitir artefactos a flujos arbitrarios, sin pasar por disco.
pub mod target {
    pub use crate::codegen::{emit, Artifacts, Emitter, GENERATED_MARKER};
}
