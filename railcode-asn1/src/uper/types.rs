//! UPER constraint descriptors
//!
//! Descriptors are immutable value types, usually declared as `const` items
//! next to the schema type that uses them. Each one knows how many bits its
//! shape requires; the decoder and encoder only ever read them.

use railcode_core::{RailcodeError, RailcodeResult};

/// Number of bits needed to represent the unsigned value `value`
///
/// `bits_needed(0)` is 0, which matches a single-valued range taking no bits.
pub const fn bits_needed(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// INTEGER constraint `(min..max, ...)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerConstraint {
    pub min: i64,
    pub max: i64,
    pub has_extension_marker: bool,
}

impl IntegerConstraint {
    pub const fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            has_extension_marker: false,
        }
    }

    /// Constraint carrying an extension marker, `(min..max, ...)`
    pub const fn extensible(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            has_extension_marker: true,
        }
    }

    fn check_order(&self) -> RailcodeResult<()> {
        if self.min > self.max {
            return Err(RailcodeError::ConstraintViolation(format!(
                "Integer constraint min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// `max - min`, the largest offset a value can have from `min`
    pub fn span(&self) -> RailcodeResult<u64> {
        self.check_order()?;
        Ok(self.max.wrapping_sub(self.min) as u64)
    }

    /// Number of values in the constraint, `max - min + 1`
    pub fn range(&self) -> RailcodeResult<u128> {
        Ok(u128::from(self.span()?) + 1)
    }

    /// Bits used for each value; zero when the range holds a single value
    pub fn bit_width(&self) -> RailcodeResult<u32> {
        Ok(bits_needed(self.span()?))
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Character string types supported by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// IA5String, code points 0-127
    Ia5,
    /// UTF8String, length-prefixed octets
    Utf8,
    /// VisibleString, code points 32-126
    Visible,
    /// NumericString, space and the digits
    Numeric,
}

/// Alphabet of NumericString, already in canonical order
pub const NUMERIC_ALPHABET: &str = " 0123456789";

/// How the characters of a known-multiplier string are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterSet {
    /// Each character is its code point, constrained to `first..=last`
    Range { first: u32, last: u32 },
    /// Each character is its index in this sorted alphabet
    Alphabet(Vec<char>),
}

impl CharacterSet {
    /// Constraint for a single encoded character
    pub fn constraint(&self) -> IntegerConstraint {
        match self {
            CharacterSet::Range { first, last } => IntegerConstraint::new(*first as i64, *last as i64),
            CharacterSet::Alphabet(chars) => IntegerConstraint::new(0, chars.len() as i64 - 1),
        }
    }

    /// Encoded value of `c`, if it belongs to the set
    pub fn value_of(&self, c: char) -> Option<i64> {
        match self {
            CharacterSet::Range { first, last } => {
                let code = c as u32;
                (*first <= code && code <= *last).then_some(code as i64)
            }
            CharacterSet::Alphabet(chars) => chars.binary_search(&c).ok().map(|index| index as i64),
        }
    }

    /// Character for an encoded value
    pub fn char_of(&self, value: i64) -> Option<char> {
        match self {
            CharacterSet::Range { .. } => u32::try_from(value).ok().and_then(char::from_u32),
            CharacterSet::Alphabet(chars) => usize::try_from(value).ok().and_then(|index| chars.get(index).copied()),
        }
    }
}

/// SIZE constraint of a string, OCTET STRING, BIT STRING or SEQUENCE OF
///
/// # Length Resolution
/// - `min == max`: fixed size, no length is written
/// - `max` set: the length is a constrained integer over `min..=max`, with a
///   missing `min` read as 0
/// - no `max`: the length is a length determinant, checked against `min`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeConstraint {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub has_extension_marker: bool,
}

/// Resolved form of a SIZE constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthForm {
    Fixed { length: usize, extensible: bool },
    Constrained(IntegerConstraint),
    Unbounded { min: usize },
}

impl SizeConstraint {
    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
            has_extension_marker: false,
        }
    }

    pub const fn fixed(length: usize) -> Self {
        Self {
            min: Some(length),
            max: Some(length),
            has_extension_marker: false,
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            has_extension_marker: false,
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
            has_extension_marker: false,
        }
    }

    /// Same bounds with an extension marker, `SIZE(min..max, ...)`
    pub const fn extensible(mut self) -> Self {
        self.has_extension_marker = true;
        self
    }

    /// Resolve the bounds into the form used on the wire
    pub fn form(&self) -> RailcodeResult<LengthForm> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(RailcodeError::ConstraintViolation(format!(
                "Size constraint min {} exceeds max {}",
                min, max
            ))),
            (Some(min), Some(max)) if min == max => Ok(LengthForm::Fixed {
                length: min,
                extensible: self.has_extension_marker,
            }),
            (Some(min), Some(max)) => Ok(LengthForm::Constrained(IntegerConstraint {
                min: min as i64,
                max: max as i64,
                has_extension_marker: self.has_extension_marker,
            })),
            (None, Some(0)) => Ok(LengthForm::Fixed {
                length: 0,
                extensible: self.has_extension_marker,
            }),
            (None, Some(max)) => Ok(LengthForm::Constrained(IntegerConstraint {
                min: 0,
                max: max as i64,
                has_extension_marker: self.has_extension_marker,
            })),
            (min, None) => Ok(LengthForm::Unbounded { min: min.unwrap_or(0) }),
        }
    }

    pub fn contains(&self, length: usize) -> bool {
        self.min.is_none_or(|min| length >= min) && self.max.is_none_or(|max| length <= max)
    }
}

impl Default for SizeConstraint {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Constraint of a character string: its kind, size and optional alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringConstraint {
    pub kind: StringKind,
    pub size: SizeConstraint,
    /// `FROM("...")` permitted alphabet, in any order
    pub alphabet: Option<&'static str>,
}

impl StringConstraint {
    pub const fn new(kind: StringKind) -> Self {
        Self {
            kind,
            size: SizeConstraint::unbounded(),
            alphabet: None,
        }
    }

    pub const fn ia5() -> Self {
        Self::new(StringKind::Ia5)
    }

    pub const fn utf8() -> Self {
        Self::new(StringKind::Utf8)
    }

    pub const fn visible() -> Self {
        Self::new(StringKind::Visible)
    }

    pub const fn numeric() -> Self {
        Self::new(StringKind::Numeric)
    }

    pub const fn with_size(mut self, size: SizeConstraint) -> Self {
        self.size = size;
        self
    }

    pub const fn with_alphabet(mut self, alphabet: &'static str) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Character set used for each character
    ///
    /// A permitted alphabet is sorted by code point and deduplicated, which
    /// assigns every character a dense index. Returns `None` for UTF8String,
    /// whose content is raw octets.
    pub fn character_set(&self) -> RailcodeResult<Option<CharacterSet>> {
        if self.kind == StringKind::Utf8 {
            return Ok(None);
        }
        let source = match (self.alphabet, self.kind) {
            (Some(alphabet), _) => alphabet,
            (None, StringKind::Numeric) => NUMERIC_ALPHABET,
            (None, StringKind::Ia5) => return Ok(Some(CharacterSet::Range { first: 0, last: 127 })),
            (None, _) => return Ok(Some(CharacterSet::Range { first: 32, last: 126 })),
        };
        let mut chars: Vec<char> = source.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        if chars.is_empty() {
            return Err(RailcodeError::ConstraintViolation(
                "Permitted alphabet is empty".to_string(),
            ));
        }
        Ok(Some(CharacterSet::Alphabet(chars)))
    }
}

/// One alternative of a CHOICE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChoiceAlternative {
    pub index: usize,
    pub name: &'static str,
    pub is_extension: bool,
}

impl ChoiceAlternative {
    pub const fn root(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            is_extension: false,
        }
    }

    pub const fn extension(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            is_extension: true,
        }
    }
}

/// CHOICE descriptor: alternatives in declaration order and the extension marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChoiceDescriptor {
    pub alternatives: &'static [ChoiceAlternative],
    pub has_extension_marker: bool,
}

impl ChoiceDescriptor {
    pub const fn new(alternatives: &'static [ChoiceAlternative], has_extension_marker: bool) -> Self {
        Self {
            alternatives,
            has_extension_marker,
        }
    }

    /// Number of alternatives declared before the extension marker
    pub fn root_count(&self) -> usize {
        self.alternatives.iter().filter(|alt| !alt.is_extension).count()
    }

    pub fn alternative(&self, index: usize) -> Option<&ChoiceAlternative> {
        self.alternatives.iter().find(|alt| alt.index == index)
    }

    pub fn name_of(&self, index: usize) -> Option<&'static str> {
        self.alternative(index).map(|alt| alt.name)
    }
}

/// ENUMERATED descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    pub root_count: u64,
    pub has_extension_marker: bool,
}

impl EnumDescriptor {
    pub const fn new(root_count: u64) -> Self {
        Self {
            root_count,
            has_extension_marker: false,
        }
    }

    pub const fn extensible(root_count: u64) -> Self {
        Self {
            root_count,
            has_extension_marker: true,
        }
    }

    /// Constraint over the root values, `0..=root_count - 1`
    pub fn root_constraint(&self) -> RailcodeResult<IntegerConstraint> {
        if self.root_count == 0 {
            return Err(RailcodeError::ConstraintViolation(
                "Enumeration has no root values".to_string(),
            ));
        }
        Ok(IntegerConstraint::new(0, (self.root_count - 1) as i64))
    }
}

/// Extension bit and presence bitmap at the start of a SEQUENCE
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceHeader {
    /// Whether extension additions follow the root fields
    pub extended: bool,
    /// One entry per OPTIONAL/DEFAULT field, in declaration order
    pub presence: Vec<bool>,
}

impl SequenceHeader {
    /// Presence of the `index`-th OPTIONAL/DEFAULT field; fields beyond the
    /// bitmap are absent
    pub fn is_present(&self, index: usize) -> bool {
        self.presence.get(index).copied().unwrap_or(false)
    }
}

/// Presence bitmap of the extension additions of a SEQUENCE
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtensionAdditions {
    pub presence: Vec<bool>,
}

impl ExtensionAdditions {
    /// Presence of addition slot `index`; slots beyond the bitmap are absent
    pub fn is_present(&self, index: usize) -> bool {
        self.presence.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.presence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }

    /// Number of additions present
    pub fn present_count(&self) -> usize {
        self.presence.iter().filter(|&&present| present).count()
    }
}
