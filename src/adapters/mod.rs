// Adapters layer: concrete implementations for external collaborators.
// The pipeline itself performs no I/O; file reading lives here.

pub mod csv_reader;
