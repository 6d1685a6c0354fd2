//! Construcción de artefactos en disco.
//!
//! Este es el punto de entrada de la biblioteca: carga el manifiesto de
//! señales y todos los manifiestos de entrada, los decodifica por
//! completo, emite ambos artefactos en memoria y solo entonces los
//! escribe. Una compilación abortada no deja archivos nuevos.

use crate::{
    codegen::{self, Artifacts},
    error::{CompileError, Diagnostics, Warning},
    manifest::Manifest,
    signal::SignalTable,
    source::{self, Location},
};

use log::{debug, info};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Parámetros de una invocación.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Manifiestos de entrada, en orden.
    pub inputs: Vec<PathBuf>,

    /// Manifiesto de señales opcional.
    pub signals: Option<PathBuf>,

    /// Raíz de las rutas de salida. Si no se indica, se usa el primer manifiesto.
    pub output: Option<PathBuf>,
}

/// Rutas de ambos artefactos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub source: PathBuf,
    pub header: PathBuf,
}

impl OutputPaths {
    /// Reemplaza la extensión de `stem` por `.c` y `.h`.
    pub fn from_stem<P: AsRef<Path>>(stem: P) -> Self {
        let stem = stem.as_ref();

        OutputPaths {
            source: stem.with_extension("c"),
            header: stem.with_extension("h"),
        }
    }

    /// Macro del include guard, como `IOC_PINS_IO_INCLUDED`.
    pub fn include_guard(&self) -> String {
        let stem = self
            .header
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();

        let stem: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        format!("IOC_{}_INCLUDED", stem)
    }
}

/// Resultado de una compilación exitosa.
#[derive(Debug)]
pub struct Report {
    pub paths: OutputPaths,
    pub warnings: Vec<Warning>,
}

/// Compila todos los manifiestos y escribe ambos artefactos.
pub fn build(options: &Options) -> Result<Report, CompileError> {
    let stem = options
        .output
        .as_deref()
        .or_else(|| options.inputs.first().map(PathBuf::as_path))
        .ok_or(CompileError::NoInputs)?;

    let paths = OutputPaths::from_stem(stem);
    let mut diagnostics = Diagnostics::default();

    // Las señales se cargan una sola vez, antes de cualquier dispositivo
    let signals = match &options.signals {
        Some(path) => SignalTable::load(path, &mut diagnostics)?,
        None => SignalTable::default(),
    };

    let mut manifests = Vec::with_capacity(options.inputs.len());
    for input in &options.inputs {
        debug!("Decoding {}", input.display());

        let value = source::load(input)?;
        let location = Location::root(input.display().to_string());
        manifests.push(Manifest::decode(&value, location, &mut diagnostics)?);
    }

    let mut output = Artifacts::<Vec<u8>>::default();
    codegen::emit(
        &manifests,
        &signals,
        &paths.include_guard(),
        &mut output,
        &mut diagnostics,
    )
    .map_err(CompileError::Emit)?;

    info!(
        "Writing files {} and {}",
        paths.source.display(),
        paths.header.display()
    );

    write(&paths.source, &output.source)?;
    write(&paths.header, &output.header)?;

    Ok(Report {
        paths,
        warnings: diagnostics.into_warnings(),
    })
}

fn write(path: &Path, contents: &[u8]) -> Result<(), CompileError> {
    fs::write(path, contents).map_err(|source| CompileError::Write {
        path: path.display().to_string(),
        source,
    })
}
