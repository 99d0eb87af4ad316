//! The fill-to-average distribution policy (spec §4.G).
//!
//! Pure and DB-free so it can be unit tested directly against the concrete
//! scenarios without a Postgres instance.

/// One node's id paired with its current worker count, in the order the
/// store returned them (ties broken by that order, per spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLoad {
    pub node_index: usize,
    pub worker_count: i64,
}

/// Computes `add_i` for every node given `worker_batch_size` pending
/// workers to place. Returns `vec![]` if `nodes` is empty (spec boundary:
/// "empty nodes -> scheduler is a no-op").
///
/// The upstream Go implementation does not clamp `avg - c_i` to zero; this
/// port does, matching the documented fix in spec §4.G / §9.
pub fn fill_to_average(nodes: &[NodeLoad], worker_batch_size: i64) -> Vec<i64> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let total_count: i64 = nodes.iter().map(|n| n.worker_count).sum();
    let n = nodes.len() as i64;
    let avg = ceil_div(worker_batch_size + total_count, n);

    let mut remaining = worker_batch_size;
    let mut plan = vec![0i64; nodes.len()];

    for (idx, node) in nodes.iter().enumerate() {
        let headroom = avg - node.worker_count;
        let add = remaining.min(headroom).max(0);
        plan[idx] = add;
        remaining -= add;
    }

    plan
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loads(counts: &[i64]) -> Vec<NodeLoad> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &worker_count)| NodeLoad {
                node_index: i,
                worker_count,
            })
            .collect()
    }

    #[test]
    fn empty_nodes_is_noop() {
        assert_eq!(fill_to_average(&[], 10), Vec::<i64>::new());
    }

    #[test]
    fn s3_even_distribution() {
        let nodes = loads(&[0, 0, 0]);
        assert_eq!(fill_to_average(&nodes, 6), vec![2, 2, 2]);
    }

    #[test]
    fn s4_uneven_nodes() {
        let nodes = loads(&[0, 2, 4]);
        // avg = ceil((3+0+2+4)/3) = 3
        assert_eq!(fill_to_average(&nodes, 3), vec![3, 0, 0]);
    }

    #[test]
    fn s5_saturated_cluster() {
        let nodes = loads(&[100, 100, 100]);
        // avg = ceil((3+300)/3) = 101
        assert_eq!(fill_to_average(&nodes, 3), vec![1, 1, 1]);
    }

    #[test]
    fn one_node_at_or_above_average_gets_zero() {
        let nodes = loads(&[50, 0]);
        // avg = ceil((10+50)/2) = 30
        let plan = fill_to_average(&nodes, 10);
        assert_eq!(plan[0], 0);
        assert_eq!(plan[1], 10);
    }

    #[test]
    fn sum_never_exceeds_batch_size() {
        for batch in [0, 1, 5, 10, 37] {
            for counts in [
                vec![0, 0, 0],
                vec![5, 5, 5],
                vec![1000],
                vec![0, 1000, 2000],
            ] {
                let nodes = loads(&counts);
                let plan = fill_to_average(&nodes, batch);
                let sum: i64 = plan.iter().sum();
                assert!(sum <= batch, "sum {sum} exceeded batch {batch}");
                assert!(plan.iter().all(|&a| a >= 0));
            }
        }
    }

    #[test]
    fn worker_batch_size_greater_than_pending_workers_is_capped_by_caller() {
        // The algorithm itself only knows about node headroom; capping the
        // plan to the number of *available* workers is the caller's job
        // (see scheduler::assign_workers). Demonstrated here: a plan can
        // request more additions than any particular caller has workers
        // for, and that's fine in isolation.
        let nodes = loads(&[0]);
        let plan = fill_to_average(&nodes, 100);
        assert_eq!(plan, vec![100]);
    }
}
