//! Fan-out of per-event detail work over a small pool of threads.

use std::thread;

use tracing::debug;

/// Runs `job` on every item on up to `workers` threads and returns the results
/// in input order. A failing item only fails its own slot.
pub fn enrich_all<T, R, E, F>(items: Vec<T>, workers: usize, job: F) -> Vec<Result<R, E>>
where
    T: Send,
    R: Send,
    E: Send,
    F: Fn(T) -> Result<R, E> + Sync,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);
    debug!(items = total, workers, "enriching");

    // Each worker owns its share of the items outright.
    let mut lanes: Vec<Vec<(usize, T)>> = (0..workers).map(|_| Vec::new()).collect();
    for (index, item) in items.into_iter().enumerate() {
        lanes[index % workers].push((index, item));
    }

    let job = &job;
    let finished: Vec<(usize, Result<R, E>)> = thread::scope(|scope| {
        let handles: Vec<_> = lanes
            .into_iter()
            .map(|lane| {
                scope.spawn(move || {
                    lane.into_iter()
                        .map(|(index, item)| (index, job(item)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut slots: Vec<Option<Result<R, E>>> = (0..total).map(|_| None).collect();
    for (index, result) in finished {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}
