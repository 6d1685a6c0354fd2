//! Rastreo de ubicaciones originales en manifiestos.
//!
//! Los distintos objetos que el decodificador construye a partir
//! de un manifiesto deben llevar cuenta de dónde fueron declarados,
//! lo cual permite señalar con exactitud el objeto JSON que provocó
//! un error. Una ubicación se compone del nombre del documento y de
//! la ruta de claves e índices que conduce hasta el objeto.
//!
//! # Orden de declaración
//! El orden de los objetos y de sus claves es significativo: de él
//! dependen el orden de las listas enlazadas que consume el firmware.
//! Por eso los documentos se cargan con `serde_json` compilado con
//! `preserve_order`, de forma que [`Value::Object`] itera sus claves
//! en el mismo orden en que aparecen en el archivo.

use serde_json::Value;
use std::{
    fmt::{self, Debug, Display, Formatter},
    fs::File,
    io::{self, BufReader},
    path::Path,
    sync::Arc,
};

use thiserror::Error;

/// Error de carga de un documento.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    /// No fue posible abrir el archivo.
    #[error("Opening file {0} failed")]
    Open(String, #[source] io::Error),

    /// El archivo no contiene JSON válido.
    #[error("Malformed JSON in {0}")]
    Syntax(String, #[source] serde_json::Error),

    /// El JSON es válido pero no tiene la forma esperada.
    #[error("Unexpected document layout in {0}")]
    Shape(String, #[source] serde_json::Error),
}

/// Un objeto cualquiera con una ubicación original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.location, self.value)
    }
}

impl<T: Debug + Display> std::error::Error for Located<T> {}

/// Una ubicación está conformada por un documento y una ruta dentro de él.
#[derive(Clone, PartialEq, Eq)]
pub struct Location {
    from: Arc<str>,
    path: Vec<Step>,
}

/// Un paso en la ruta hacia un objeto.
#[derive(Clone, PartialEq, Eq)]
enum Step {
    Key(Arc<str>),
    Index(usize),
}

impl Location {
    /// Ubicación de la raíz de un documento.
    pub fn root<S: Into<Arc<str>>>(from: S) -> Self {
        Location {
            from: from.into(),
            path: Vec::new(),
        }
    }

    /// Desciende a una clave de objeto.
    pub fn key(&self, key: &str) -> Self {
        self.push(Step::Key(key.into()))
    }

    /// Desciende a un elemento de arreglo.
    pub fn index(&self, index: usize) -> Self {
        self.push(Step::Index(index))
    }

    fn push(&self, step: Step) -> Self {
        let mut path = self.path.clone();
        path.push(step);

        Location {
            from: Arc::clone(&self.from),
            path,
        }
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.from)?;
        if self.path.is_empty() {
            return Ok(());
        }

        formatter.write_str(":")?;
        for (index, step) in self.path.iter().enumerate() {
            match step {
                Step::Key(key) if index == 0 => write!(formatter, "{}", key)?,
                Step::Key(key) => write!(formatter, ".{}", key)?,
                Step::Index(position) => write!(formatter, "[{}]", position)?,
            }
        }

        Ok(())
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Lee y analiza completamente un documento JSON.
///
/// El documento completo queda en memoria; los manifiestos son
/// pequeños y todas las fases posteriores los recorren varias veces.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Value, SourceError> {
    let path = path.as_ref();
    let name = path.display().to_string();

    let file = File::open(path).map_err(|error| SourceError::Open(name.clone(), error))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|error| SourceError::Syntax(name, error))
}
