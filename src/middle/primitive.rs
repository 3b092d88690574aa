use strum::{Display, EnumIter, EnumString};

use crate::frontend::ast::BinaryOperator;

/// Types every translation unit may name without declaring them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveKind {
    I32,
    I64,
    U32,
    U64,
    #[strum(serialize = "String")]
    String,
    #[strum(serialize = "Variadic")]
    Variadic,
}

impl PrimitiveKind {
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::U32 | Self::U64)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::U32 | Self::U64)
    }

    /// Width in bits, `None` for non-integers
    pub fn bit_size(&self) -> Option<u32> {
        match self {
            PrimitiveKind::I32 | PrimitiveKind::U32 => Some(32),
            PrimitiveKind::I64 | PrimitiveKind::U64 => Some(64),
            PrimitiveKind::String | PrimitiveKind::Variadic => None,
        }
    }

    /// Only addition and multiplication of integers is currently accepted.
    pub fn supports_binary_op(&self, operator: BinaryOperator) -> bool {
        match self {
            PrimitiveKind::I32 | PrimitiveKind::I64 | PrimitiveKind::U32 | PrimitiveKind::U64 => {
                match operator {
                    BinaryOperator::Add | BinaryOperator::Multiply => true,
                    BinaryOperator::Subtract | BinaryOperator::Modulus | BinaryOperator::Equals => {
                        false
                    }
                }
            }
            PrimitiveKind::String | PrimitiveKind::Variadic => false,
        }
    }

    /// Whether the value fits in this integer type
    pub fn can_hold(&self, value: i128) -> bool {
        match self {
            PrimitiveKind::I32 => i32::try_from(value).is_ok(),
            PrimitiveKind::I64 => i64::try_from(value).is_ok(),
            PrimitiveKind::U32 => u32::try_from(value).is_ok(),
            PrimitiveKind::U64 => u64::try_from(value).is_ok(),
            PrimitiveKind::String | PrimitiveKind::Variadic => false,
        }
    }

    /// Reinterprets `value` at this type's width, wrapping like a two's
    /// complement register would.
    pub fn wrap(&self, value: i128) -> i128 {
        match self {
            PrimitiveKind::I32 => value as i32 as i128,
            PrimitiveKind::I64 => value as i64 as i128,
            PrimitiveKind::U32 => value as u32 as i128,
            PrimitiveKind::U64 => value as u64 as i128,
            PrimitiveKind::String | PrimitiveKind::Variadic => value,
        }
    }
}

/// The common type two integer operands are promoted to.
///
/// With equal signedness the wider type wins. With mixed signedness the
/// unsigned type wins unless the signed type is strictly wider. Returns `None`
/// if either side is not an integer.
pub fn biggest_type(lhs: PrimitiveKind, rhs: PrimitiveKind) -> Option<PrimitiveKind> {
    let lhs_size = lhs.bit_size()?;
    let rhs_size = rhs.bit_size()?;

    if lhs.is_unsigned() == rhs.is_unsigned() {
        return Some(if lhs_size >= rhs_size { lhs } else { rhs });
    }

    let (signed, signed_size, unsigned, unsigned_size) = if lhs.is_unsigned() {
        (rhs, rhs_size, lhs, lhs_size)
    } else {
        (lhs, lhs_size, rhs, rhs_size)
    };

    if signed_size > unsigned_size {
        Some(signed)
    } else {
        Some(unsigned)
    }
}

/// The natural type of an integer literal: negative values are signed,
/// everything else is unsigned, and 64-bit types are only used when the
/// value doesn't fit in 32 bits.
pub fn literal_type(value: i128) -> Option<PrimitiveKind> {
    let candidates = if value < 0 {
        [PrimitiveKind::I32, PrimitiveKind::I64]
    } else {
        [PrimitiveKind::U32, PrimitiveKind::U64]
    };

    candidates.into_iter().find(|kind| kind.can_hold(value))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn integers() -> impl Iterator<Item = PrimitiveKind> + Clone {
        PrimitiveKind::iter().filter(|kind| kind.is_integer())
    }

    #[test]
    fn promotion_is_symmetric() {
        for a in integers() {
            for b in integers() {
                assert_eq!(biggest_type(a, b), biggest_type(b, a), "{a} and {b}");
            }
        }
    }

    #[test]
    fn promotion_pairs() {
        use PrimitiveKind::*;

        assert_eq!(biggest_type(U32, I32), Some(U32));
        assert_eq!(biggest_type(I64, U32), Some(I64));
        assert_eq!(biggest_type(U64, I32), Some(U64));
        assert_eq!(biggest_type(U64, I64), Some(U64));
        assert_eq!(biggest_type(I32, I64), Some(I64));
        assert_eq!(biggest_type(U32, U32), Some(U32));
    }

    #[test]
    fn promotion_rejects_non_integers() {
        assert_eq!(biggest_type(PrimitiveKind::String, PrimitiveKind::I32), None);
        assert_eq!(biggest_type(PrimitiveKind::U64, PrimitiveKind::Variadic), None);
    }

    #[test]
    fn literal_types_by_range() {
        assert_eq!(literal_type(0), Some(PrimitiveKind::U32));
        assert_eq!(literal_type(u32::MAX as i128), Some(PrimitiveKind::U32));
        assert_eq!(literal_type(u32::MAX as i128 + 1), Some(PrimitiveKind::U64));
        assert_eq!(literal_type(-1), Some(PrimitiveKind::I32));
        assert_eq!(literal_type(i32::MIN as i128 - 1), Some(PrimitiveKind::I64));
        assert_eq!(literal_type(u64::MAX as i128 + 1), None);
        assert_eq!(literal_type(i64::MIN as i128 - 1), None);
    }

    #[test]
    fn names_round_trip() {
        for kind in PrimitiveKind::iter() {
            assert_eq!(kind.to_string().parse::<PrimitiveKind>(), Ok(kind));
        }

        assert_eq!(PrimitiveKind::String.to_string(), "String");
        assert!("string".parse::<PrimitiveKind>().is_err());
    }

    #[test]
    fn only_add_and_multiply_are_admissible() {
        assert!(PrimitiveKind::I32.supports_binary_op(BinaryOperator::Add));
        assert!(PrimitiveKind::U64.supports_binary_op(BinaryOperator::Multiply));
        assert!(!PrimitiveKind::I32.supports_binary_op(BinaryOperator::Subtract));
        assert!(!PrimitiveKind::I32.supports_binary_op(BinaryOperator::Equals));
        assert!(!PrimitiveKind::String.supports_binary_op(BinaryOperator::Add));
    }

    #[test]
    fn wrapping_matches_width() {
        assert_eq!(PrimitiveKind::U32.wrap(-1), u32::MAX as i128);
        assert_eq!(PrimitiveKind::I32.wrap(u32::MAX as i128), -1);
        assert_eq!(PrimitiveKind::I64.wrap(5), 5);
    }
}
