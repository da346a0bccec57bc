//! Generic register abstractions for type-safe MSR programming

/// Trait for register layouts that can be converted to/from raw MSR values
///
/// This trait provides type-safe conversion between structured register
/// layouts and the raw 64-bit values that are written to/read from MSRs.
///
/// `to_msr_value` only produces the bits the layout describes; reserved bits
/// come back as zero. Callers that write back to hardware must merge the
/// produced bits into a freshly read raw value rather than writing the
/// layout's value wholesale.
///
/// # Example
///
/// ```ignore
/// use vidflow_raw::register::RegisterLayout;
///
/// #[derive(Debug, Default)]
/// struct MyStatus {
///     enable: bool,
///     level: u8,
/// }
///
/// impl RegisterLayout for MyStatus {
///     fn to_msr_value(&self) -> u64 {
///         (if self.enable { 1 } else { 0 })
///             | ((self.level as u64) << 8)
///     }
///
///     fn from_msr_value(value: u64) -> Self {
///         Self {
///             enable: (value & 1) != 0,
///             level: ((value >> 8) & 0xFF) as u8,
///         }
///     }
/// }
/// ```
pub trait RegisterLayout: Sized {
    /// Convert this register layout to a raw MSR value
    fn to_msr_value(&self) -> u64;

    /// Parse a raw MSR value into this register layout
    fn from_msr_value(value: u64) -> Self;

    /// Validate that the register values are within acceptable ranges
    ///
    /// Returns `Ok(())` if valid, or an error message if invalid.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}
