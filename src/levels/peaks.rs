//! Prominence-based peak detection over a 1-D price series.
//!
//! A sample qualifies as a peak when it is a local maximum (plateaus resolve
//! to their midpoint), survives the minimum-spacing filter (taller peaks claim
//! their neighborhood first), and its prominence — the vertical drop to the
//! lower saddle before a higher sample is reached on either side — meets the
//! requested threshold.
//!
//! Minima are detected by running the same pass over the negated series, see
//! [`find_troughs`].

use crate::Decimal;

/// Finds indices of peaks that satisfy the spacing and prominence filters.
///
/// Spacing is applied before the prominence cut: all local maxima compete for
/// their neighborhood by height, then the survivors are measured for
/// prominence. Peaks separated by exactly `min_spacing` samples are both kept.
///
/// # Arguments
///
/// * `values` - The series to scan
/// * `prominence` - Minimum prominence a peak must exhibit
/// * `min_spacing` - Minimum distance in samples between accepted peaks
///
/// # Example
///
/// ```rust
/// use level_maker_rs::levels::find_peaks;
/// use level_maker_rs::dec;
///
/// let series = vec![
///     dec!(1), dec!(5), dec!(1), dec!(1), dec!(4), dec!(1),
/// ];
/// let peaks = find_peaks(&series, dec!(2), 2);
/// assert_eq!(peaks, vec![1, 4]);
/// ```
#[must_use]
pub fn find_peaks(values: &[Decimal], prominence: Decimal, min_spacing: usize) -> Vec<usize> {
    let candidates = local_maxima(values);
    let spaced = select_by_spacing(&candidates, values, min_spacing);

    spaced
        .into_iter()
        .filter(|&peak| peak_prominence(values, peak) >= prominence)
        .collect()
}

/// Finds indices of troughs (local minima) via the negated series.
#[must_use]
pub fn find_troughs(values: &[Decimal], prominence: Decimal, min_spacing: usize) -> Vec<usize> {
    let negated: Vec<Decimal> = values.iter().map(|v| -*v).collect();
    find_peaks(&negated, prominence, min_spacing)
}

/// Finds all local maxima, resolving flat tops to their midpoint.
///
/// Boundary samples can never be maxima; a plateau that runs into the series
/// edge is discarded.
fn local_maxima(values: &[Decimal]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if values.len() < 3 {
        return maxima;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            // Scan past a potential plateau of equal samples.
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }

            if values[ahead] < values[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    maxima
}

/// Computes the prominence of the peak at `peak`.
///
/// Walks outward on each side until a sample higher than the peak (or the
/// series border) is reached, recording the lowest saddle seen; prominence is
/// the drop from the peak to the higher of the two saddles.
fn peak_prominence(values: &[Decimal], peak: usize) -> Decimal {
    let height = values[peak];

    let mut left_min = height;
    let mut i = peak;
    while i > 0 && values[i - 1] <= height {
        i -= 1;
        if values[i] < left_min {
            left_min = values[i];
        }
    }

    let mut right_min = height;
    let mut i = peak;
    while i + 1 < values.len() && values[i + 1] <= height {
        i += 1;
        if values[i] < right_min {
            right_min = values[i];
        }
    }

    height - left_min.max(right_min)
}

/// Keeps peaks at least `min_spacing` samples apart, by height priority.
///
/// Peaks are visited from tallest to shortest (index-ascending among equal
/// heights, so the outcome is deterministic); each surviving peak removes all
/// strictly closer, not-yet-kept neighbors.
fn select_by_spacing(peaks: &[usize], values: &[Decimal], min_spacing: usize) -> Vec<usize> {
    if min_spacing <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let mut priority: Vec<usize> = (0..peaks.len()).collect();
    priority.sort_by(|&a, &b| {
        values[peaks[a]]
            .cmp(&values[peaks[b]])
            .then_with(|| a.cmp(&b))
    });

    let mut keep = vec![true; peaks.len()];
    for &j in priority.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < min_spacing {
            k -= 1;
            keep[k] = false;
        }

        let mut k = j;
        while k + 1 < peaks.len() && peaks[k + 1] - peaks[j] < min_spacing {
            k += 1;
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    #[test]
    fn test_simple_maxima() {
        let values = series(&[1, 3, 1, 4, 1]);
        assert_eq!(local_maxima(&values), vec![1, 3]);
    }

    #[test]
    fn test_borders_are_not_maxima() {
        let values = series(&[5, 1, 2, 1, 5]);
        assert_eq!(local_maxima(&values), vec![2]);
    }

    #[test]
    fn test_plateau_resolves_to_midpoint() {
        let values = series(&[1, 4, 4, 4, 1]);
        assert_eq!(local_maxima(&values), vec![2]);
    }

    #[test]
    fn test_plateau_into_border_discarded() {
        let values = series(&[1, 4, 4]);
        assert_eq!(local_maxima(&values), Vec::<usize>::new());
    }

    #[test]
    fn test_flat_series_has_no_maxima() {
        let values = series(&[3, 3, 3, 3, 3]);
        assert_eq!(local_maxima(&values), Vec::<usize>::new());
    }

    #[test]
    fn test_prominence_isolated_peak() {
        let values = series(&[0, 5, 0]);
        assert_eq!(peak_prominence(&values, 1), dec!(5));
    }

    #[test]
    fn test_prominence_uses_higher_saddle() {
        // Peak at 3 (height 4): the left walk reaches the border (min 0),
        // the right saddle bottoms at 2 before the higher peak at 7.
        // Prominence = 4 - max(0, 2) = 2.
        let values = series(&[0, 1, 1, 4, 2, 2, 3, 6, 0]);
        assert_eq!(peak_prominence(&values, 3), dec!(2));
    }

    #[test]
    fn test_prominence_filter() {
        let values = series(&[0, 5, 3, 4, 0]);
        // Peak at 1 has prominence 5, peak at 3 has prominence 1.
        assert_eq!(find_peaks(&values, dec!(2), 1), vec![1]);
        assert_eq!(find_peaks(&values, dec!(1), 1), vec![1, 3]);
    }

    #[test]
    fn test_spacing_keeps_taller_peak() {
        // Two close peaks: the taller one (index 3) wins the neighborhood.
        let values = series(&[0, 4, 1, 6, 0, 0, 0, 5, 0]);
        let peaks = find_peaks(&values, dec!(1), 3);
        assert_eq!(peaks, vec![3, 7]);
    }

    #[test]
    fn test_spacing_exact_distance_kept() {
        let values = series(&[0, 4, 0, 5, 0]);
        // Peaks at 1 and 3 are exactly 2 apart.
        assert_eq!(find_peaks(&values, dec!(1), 2), vec![1, 3]);
        assert_eq!(find_peaks(&values, dec!(1), 3), vec![3]);
    }

    #[test]
    fn test_troughs_via_negation() {
        let values = series(&[5, 1, 5, 2, 5]);
        assert_eq!(find_troughs(&values, dec!(2), 1), vec![1, 3]);
    }

    #[test]
    fn test_short_series() {
        let values = series(&[1, 2]);
        assert!(find_peaks(&values, dec!(1), 1).is_empty());
    }

    #[test]
    fn test_determinism_on_equal_heights() {
        let values = series(&[0, 5, 0, 5, 0, 5, 0]);
        let first = find_peaks(&values, dec!(1), 3);
        let second = find_peaks(&values, dec!(1), 3);
        assert_eq!(first, second);
    }
}
