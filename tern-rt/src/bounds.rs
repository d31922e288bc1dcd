#![forbid(unsafe_code)]

use crate::fault::Fault;

/// Validates `index` against the current length of a sequence.
///
/// Every element access goes through here; there is no unchecked path.
pub fn check_index(index: i128, len: usize) -> Result<usize, Fault> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(Fault::BoundsError { index, len }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_element_is_in_bounds() {
        assert_eq!(check_index(2, 3), Ok(2));
    }

    #[test]
    fn length_and_negative_indices_fault() {
        assert_eq!(
            check_index(3, 3),
            Err(Fault::BoundsError { index: 3, len: 3 })
        );
        assert!(check_index(-1, 3).is_err());
        assert!(check_index(0, 0).is_err());
    }
}
