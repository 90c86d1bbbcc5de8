//! Key capabilities: domain bounds and the composite pair key.
//!
//! A tree needs two sentinel keys at construction. Key types that have a
//! natural domain minimum and maximum implement [`DomainBounds`] and can use
//! [`Tree::new`](crate::tree::Tree::new); any other `Ord` type passes its
//! bounds explicitly to [`Tree::with_sentinels`](crate::tree::Tree::with_sentinels).

use std::fmt;

/// Key types with a known smallest and largest value.
pub trait DomainBounds: Sized {
    fn domain_min() -> Self;
    fn domain_max() -> Self;
}

macro_rules! int_domain_bounds {
    ($($t:ty),*) => {
        $(
            impl DomainBounds for $t {
                #[inline]
                fn domain_min() -> Self {
                    <$t>::MIN
                }

                #[inline]
                fn domain_max() -> Self {
                    <$t>::MAX
                }
            }
        )*
    };
}

int_domain_bounds!(i32, i64, u32, u64, usize);

/// Strings are bounded by the empty string and a single `char::MAX`.
///
/// The upper bound is nominal: sentinel leaves are flagged, so a real key
/// that sorts above it is still routed correctly.
impl DomainBounds for String {
    fn domain_min() -> Self {
        String::new()
    }

    fn domain_max() -> Self {
        char::MAX.to_string()
    }
}

impl<P: DomainBounds, S: DomainBounds> DomainBounds for Pair<P, S> {
    fn domain_min() -> Self {
        Pair::new(P::domain_min(), S::domain_min())
    }

    fn domain_max() -> Self {
        Pair::new(P::domain_max(), S::domain_max())
    }
}

/// Two-component key ordered by `primary`, then by `secondary`.
///
/// The price index keys records by `Pair<price, id>` so records sharing a
/// price stay distinct and ordered.
///
/// # Example
///
/// ```
/// use stockbook::tree::Pair;
///
/// let a = Pair::new(100, "A".to_string());
/// let b = Pair::new(100, "B".to_string());
/// let c = Pair::new(50, "C".to_string());
///
/// assert!(c < a);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pair<P, S> {
    pub primary: P,
    pub secondary: S,
}

impl<P, S> Pair<P, S> {
    #[inline]
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: fmt::Display, S: fmt::Display> fmt::Display for Pair<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.primary, self.secondary)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_orders_by_primary_first() {
        let cheap = Pair::new(50, "Z".to_string());
        let dear = Pair::new(100, "A".to_string());

        assert!(cheap < dear);
    }

    #[test]
    fn test_pair_ties_break_on_secondary() {
        let a = Pair::new(100, "A".to_string());
        let b = Pair::new(100, "B".to_string());

        assert!(a < b);
        assert_eq!(a, Pair::new(100, "A".to_string()));
    }

    #[test]
    fn test_domain_bounds_enclose_values() {
        assert!(i64::domain_min() < -1_000);
        assert!(u64::domain_max() > 1_000);
        assert!(String::domain_min() < "a".to_string());
        assert!(String::domain_max() > "zzzz".to_string());

        let low = Pair::<i64, String>::domain_min();
        let high = Pair::<i64, String>::domain_max();
        let mid = Pair::new(0, "MSFT".to_string());
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_pair_display() {
        assert_eq!(Pair::new(5, "X").to_string(), "(5, X)");
    }
}
