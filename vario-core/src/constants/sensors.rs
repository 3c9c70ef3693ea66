//! Barometric Sensor Constants

/// Hectopascals per kilopascal.
///
/// Barometer APIs commonly report kPa; weather convention displays hPa.
pub const HPA_PER_KPA: f64 = 10.0;

