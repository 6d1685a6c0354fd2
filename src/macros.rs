/// Emite un comentario de sección precedido por una línea en blanco.
macro_rules! section {
    ($output:expr, $($format:tt)*) => {{
        write!($output, "\n/* ")?;
        write!($output, $($format)*)?;
        writeln!($output, " */")
    }};
}

/// Emite una sentencia dentro del cuerpo de una función C.
macro_rules! emit {
    ($output:expr, $($format:tt)*) => {{
        write!($output, "    ")?;
        writeln!($output, $($format)*)
    }};
}
