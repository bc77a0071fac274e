//! Agglomerative hierarchical clustering with Ward's minimum-variance linkage.
//!
//! Each merge step joins the pair of clusters whose union increases the total
//! within-cluster variance the least; for 1-D price data the increase is
//! `(n_a * n_b) / (n_a + n_b) * (c_a - c_b)^2`, which only needs member
//! counts and centroids. Merging stops when `k` clusters remain, the cut that
//! corresponds to slicing the dendrogram at `k`.

use crate::Decimal;

use super::PriceCluster;

/// One cluster under construction: member sum and count.
#[derive(Debug, Clone)]
struct Node {
    sum: Decimal,
    count: usize,
}

impl Node {
    fn centroid(&self) -> Decimal {
        self.sum / Decimal::from(self.count)
    }
}

/// Ward merge cost between two nodes: the increase in within-cluster
/// sum of squares caused by joining them.
fn merge_cost(a: &Node, b: &Node) -> Decimal {
    let delta = a.centroid() - b.centroid();
    let na = Decimal::from(a.count);
    let nb = Decimal::from(b.count);
    na * nb / (na + nb) * delta * delta
}

/// Partitions `prices` into at most `k` clusters using Ward linkage.
///
/// Returns the clusters sorted ascending by centroid. With fewer than `k`
/// points each point forms its own cluster, so the result may be shorter than
/// `k`; an empty input yields an empty result. Ties in merge cost break on
/// the lowest pair of positions, making the partition fully deterministic.
///
/// # Example
///
/// ```rust
/// use level_maker_rs::levels::ward_clusters;
/// use level_maker_rs::dec;
///
/// let prices = vec![dec!(110), dec!(115), dec!(108), dec!(120), dec!(112)];
/// let clusters = ward_clusters(&prices, 3);
///
/// assert_eq!(clusters.len(), 3);
/// assert!(clusters.windows(2).all(|w| w[0].centroid < w[1].centroid));
/// ```
#[must_use]
pub fn ward_clusters(prices: &[Decimal], k: usize) -> Vec<PriceCluster> {
    if prices.is_empty() || k == 0 {
        return Vec::new();
    }

    // Clustering 1-D data: sorting first keeps merge candidates adjacent in
    // value order without changing the Ward objective.
    let mut sorted = prices.to_vec();
    sorted.sort();

    let mut nodes: Vec<Node> = sorted
        .into_iter()
        .map(|price| Node {
            sum: price,
            count: 1,
        })
        .collect();

    while nodes.len() > k {
        let mut best: Option<(usize, usize, Decimal)> = None;
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let cost = merge_cost(&nodes[i], &nodes[j]);
                let better = match best {
                    None => true,
                    Some((_, _, best_cost)) => cost < best_cost,
                };
                if better {
                    best = Some((i, j, cost));
                }
            }
        }

        // nodes.len() > k >= 1 guarantees a candidate pair exists.
        let Some((i, j, _)) = best else { break };
        let merged = Node {
            sum: nodes[i].sum + nodes[j].sum,
            count: nodes[i].count + nodes[j].count,
        };
        nodes.remove(j);
        nodes[i] = merged;
    }

    let mut clusters: Vec<PriceCluster> = nodes
        .into_iter()
        .map(|node| PriceCluster {
            centroid: node.centroid(),
            member_count: node.count,
        })
        .collect();
    clusters.sort_by(|a, b| a.centroid.cmp(&b.centroid));

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;

    fn prices(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    #[test]
    fn test_five_peaks_into_three_clusters() {
        let input = prices(&[110, 115, 108, 120, 112]);
        let clusters = ward_clusters(&input, 3);

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].centroid, dec!(109));
        assert_eq!(clusters[0].member_count, 2);
        assert_eq!(clusters[1].centroid, dec!(113.5));
        assert_eq!(clusters[1].member_count, 2);
        assert_eq!(clusters[2].centroid, dec!(120));
        assert_eq!(clusters[2].member_count, 1);
    }

    #[test]
    fn test_fewer_points_than_k() {
        let input = prices(&[100, 200]);
        let clusters = ward_clusters(&input, 5);

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.member_count == 1));
    }

    #[test]
    fn test_empty_input() {
        assert!(ward_clusters(&[], 3).is_empty());
    }

    #[test]
    fn test_single_cluster_is_mean() {
        let input = prices(&[10, 20, 30]);
        let clusters = ward_clusters(&input, 1);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].centroid, dec!(20));
        assert_eq!(clusters[0].member_count, 3);
    }

    #[test]
    fn test_well_separated_groups() {
        let input = prices(&[10, 11, 12, 50, 51, 52, 90, 91, 92]);
        let clusters = ward_clusters(&input, 3);

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].centroid, dec!(11));
        assert_eq!(clusters[1].centroid, dec!(51));
        assert_eq!(clusters[2].centroid, dec!(91));
        assert!(clusters.iter().all(|c| c.member_count == 3));
    }

    #[test]
    fn test_determinism() {
        let input = prices(&[100, 102, 104, 106, 108, 110]);
        let first = ward_clusters(&input, 3);
        let second = ward_clusters(&input, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_centroids_sorted_ascending() {
        let input = prices(&[120, 90, 110, 95, 100]);
        let clusters = ward_clusters(&input, 2);
        assert!(clusters.windows(2).all(|w| w[0].centroid < w[1].centroid));
    }
}
