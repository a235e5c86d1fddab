/// Number of workers a pool should run for the given queue depth.
///
/// One worker per `batch_size` queued tasks, rounded up, never below
/// `standby` and never above `maximum` (zero meaning no ceiling).
pub fn target_workers(depth: usize, batch_size: usize, standby: usize, maximum: usize) -> usize {
    let batch_size = batch_size.max(1);
    let target = depth.div_ceil(batch_size).max(standby);
    if maximum > 0 {
        target.min(maximum)
    } else {
        target
    }
}
