//! The encoding rules.

//------------ Mode ----------------------------------------------------------

/// The encoding rules in effect for a reader.
///
/// X.690 defines three functionally equivalent sets of rules for encoding
/// values into octets. All three share the same tag-length-value structure
/// but differ in how much freedom the sender has when choosing between
/// alternative representations of the same value. The reader needs to know
/// the rules a value claims to conform to in order to reject the encoding
/// freedoms the stricter rule sets take away.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Basic Encoding Rules.
    ///
    /// These are the most flexible rules, allowing alternative encodings for
    /// some types as well as indefinite length values.
    Ber,

    /// Canonical Encoding Rules.
    ///
    /// These rules always employ indefinite length encoding for constructed
    /// values and break long strings into segments of 1000 octets. There
    /// are additional restrictions for certain types.
    Cer,

    /// Distinguished Encoding Rules.
    ///
    /// These rules always employ definite length values and require the
    /// shortest possible encoding. Additional rules apply to some types.
    Der,
}

impl Mode {
    /// Returns whether the mode is CER or DER.
    ///
    /// Both canonical rule sets demand minimal length encodings and take
    /// away a number of freedoms BER grants, so several checks apply to
    /// either of them.
    pub fn is_restricted(self) -> bool {
        !matches!(self, Mode::Ber)
    }

    /// Returns whether the mode allows indefinite length constructed values.
    pub fn allows_indefinite(self) -> bool {
        !matches!(self, Mode::Der)
    }

    /// Returns whether the mode allows definite length constructed values.
    pub fn allows_definite_constructed(self) -> bool {
        !matches!(self, Mode::Cer)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Ber
    }
}
