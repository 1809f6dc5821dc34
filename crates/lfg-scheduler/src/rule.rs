//! Party formation rule.
//!
//! Pure predicates over the queue and the pool. Callers evaluate them
//! under the coordinator lock.

use lfg_core::RoleQueue;

use crate::pool::InstancePool;

/// True iff the queue holds at least 1 tank, 1 healer and 3 DPS.
pub fn can_form_party(queue: &RoleQueue) -> bool {
    queue.has_party()
}

/// Lowest-indexed idle instance, or `None` if every slot is occupied.
pub fn find_free_instance(pool: &InstancePool) -> Option<usize> {
    pool.iter()
        .position(|instance| !instance.is_occupied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_needs_one_tank_one_healer_three_dps() {
        assert!(can_form_party(&RoleQueue::new(1, 1, 3)));
        assert!(can_form_party(&RoleQueue::new(4, 2, 10)));
        assert!(!can_form_party(&RoleQueue::new(1, 1, 2)));
        assert!(!can_form_party(&RoleQueue::new(0, 5, 5)));
        assert!(!can_form_party(&RoleQueue::new(5, 0, 5)));
    }

    #[test]
    fn can_form_party_does_not_mutate() {
        let queue = RoleQueue::new(1, 1, 3);
        assert!(can_form_party(&queue));
        assert!(can_form_party(&queue));
        assert_eq!(queue, RoleQueue::new(1, 1, 3));
    }

    #[test]
    fn leftmost_idle_instance_wins() {
        let mut pool = InstancePool::new(3);
        pool.assign(0);
        // [Occupied, Idle, Idle]
        assert_eq!(find_free_instance(&pool), Some(1));
        assert_eq!(find_free_instance(&pool), Some(1));

        pool.assign(1);
        assert_eq!(find_free_instance(&pool), Some(2));

        pool.release(0, 4);
        assert_eq!(find_free_instance(&pool), Some(0));
    }

    #[test]
    fn full_pool_has_no_free_instance() {
        let mut pool = InstancePool::new(2);
        pool.assign(0);
        pool.assign(1);
        assert_eq!(find_free_instance(&pool), None);
    }

    #[test]
    fn empty_pool_has_no_free_instance() {
        assert_eq!(find_free_instance(&InstancePool::new(0)), None);
    }
}
