//! Interpretation of slot status strings reported by the reservation service.

/// A slot counts as available only when the service reports exactly `"true"`.
/// Anything else (`"false"`, empty, unexpected casing) is unavailable.
pub fn is_available(reported: &str) -> bool {
    reported == "true"
}
