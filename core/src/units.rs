//! Linear unit conversion.
//!
//! A unit relates to its MKS base by `mks = value * factor + offset`.

/// Factor and offset of a unit relative to its MKS base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub factor: f64,
    pub offset: f64,
}

impl Conversion {
    /// The conversion of an MKS base unit to itself.
    pub const IDENTITY: Conversion = Conversion {
        factor: 1.0,
        offset: 0.0,
    };

    pub fn new(factor: f64, offset: f64) -> Self {
        Self { factor, offset }
    }

    /// A usable conversion must be finite and invertible.
    pub fn is_usable(&self) -> bool {
        self.factor.is_finite() && self.offset.is_finite() && self.factor != 0.0
    }

    pub fn to_mks(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    pub fn from_mks(&self, mks: f64) -> f64 {
        (mks - self.offset) / self.factor
    }

    /// Convert `value` expressed with `self` into the unit described by `to`.
    ///
    /// Both conversions must refer to the same MKS base.
    pub fn convert(&self, value: f64, to: &Conversion) -> Option<f64> {
        if !self.is_usable() || !to.is_usable() {
            return None;
        }
        Some(to.from_mks(self.to_mks(value)))
    }
}

impl Default for Conversion {
    fn default() -> Self {
        Self::IDENTITY
    }
}
