//! Tree-offset estimate: whole trees whose yearly absorption covers a total.

use gx_core::model::CO2_PER_TREE_PER_YEAR;
use gx_core::EmissionModel;

/// `ceil(total_kg / model.co2_per_tree_per_year)`; a partial tree still needs a whole tree.
///
/// Zero, negative and NaN totals need no trees.
pub fn trees_needed(total_kg: f64, model: &EmissionModel) -> u64 {
    ceil_trees(total_kg, model.co2_per_tree_per_year)
}

/// Same as [`trees_needed`] with the built-in 22 kg/year constant.
pub fn trees_needed_default(total_kg: f64) -> u64 {
    ceil_trees(total_kg, CO2_PER_TREE_PER_YEAR)
}

#[inline]
fn ceil_trees(total_kg: f64, per_tree: f64) -> u64 {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(per_tree) || total_kg.is_nan() || total_kg <= 0.0 {
        return 0;
    }
    // `as` saturates for out-of-range floats.
    (total_kg / per_tree).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounding_boundaries() {
        assert_eq!(trees_needed_default(0.0), 0);
        assert_eq!(trees_needed_default(22.0), 1);
        assert_eq!(trees_needed_default(22.0001), 2);
        assert_eq!(trees_needed_default(22.01), 2);
        assert_eq!(trees_needed_default(0.5), 1);
        assert_eq!(trees_needed_default(44.0), 2);
    }

    #[test]
    fn degenerate_totals_need_no_trees() {
        assert_eq!(trees_needed_default(-5.0), 0);
        assert_eq!(trees_needed_default(f64::NAN), 0);
    }

    #[test]
    fn follows_the_model_constant() {
        let mut m = EmissionModel::v1();
        m.co2_per_tree_per_year = 10.0;
        assert_eq!(trees_needed(25.0, &m), 3);
    }

    proptest! {
        #[test]
        fn trees_cover_the_total(total in 0.0f64..1.0e7) {
            let n = trees_needed_default(total) as f64;
            let eps = total * 1e-12;
            prop_assert!(n * CO2_PER_TREE_PER_YEAR + eps >= total);
            prop_assert!(n == 0.0 || (n - 1.0) * CO2_PER_TREE_PER_YEAR < total + eps);
        }
    }
}
