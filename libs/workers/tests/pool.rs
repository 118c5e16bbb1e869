#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use workers::job::Job;
    use workers::pool::WorkerPool;

    #[tokio::test]
    async fn every_submitted_job_reports_exactly_once() {
        let mut pool: WorkerPool<u64> = WorkerPool::new(2);

        let jobs: Vec<Job<u64>> =
            (0..7u64).map(|i| Job::new(move || async move { Ok(i * 10) })).collect();

        let mut results = pool.results().unwrap();
        let submitted = pool.submit(jobs);
        let done = pool.run(CancellationToken::new());

        let mut values = Vec::new();
        while let Some(result) = results.recv().await {
            values.push(result.unwrap());
        }

        submitted.await.unwrap();
        done.await.unwrap();

        values.sort();
        assert_eq!(values, vec![0, 10, 20, 30, 40, 50, 60]);
    }

    #[tokio::test]
    async fn failing_jobs_surface_as_error_results() {
        let mut pool: WorkerPool<u64> = WorkerPool::new(3);

        let jobs = vec![
            Job::new(|| async { Ok(1) }),
            Job::new(|| async { Err(eyre::eyre!("boom")) }),
            Job::new(|| async { Ok(3) }),
        ];

        let mut results = pool.results().unwrap();
        pool.submit(jobs);
        let done = pool.run(CancellationToken::new());

        let mut oks = 0;
        let mut errs = 0;
        while let Some(result) = results.recv().await {
            match result {
                Ok(_) => oks += 1,
                Err(_) => errs += 1,
            }
        }
        done.await.unwrap();

        assert_eq!(oks, 2);
        assert_eq!(errs, 1);
    }

    #[tokio::test]
    async fn cancellation_stops_workers_with_error_results() {
        let mut pool: WorkerPool<u64> = WorkerPool::new(2);

        // jobs that never finish on their own
        let jobs: Vec<Job<u64>> = (0..2)
            .map(|_| {
                Job::new(|| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(0)
                })
            })
            .collect();

        let token = CancellationToken::new();
        let mut results = pool.results().unwrap();
        pool.submit(jobs);
        let done = pool.run(token.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let mut errs = 0;
        while let Some(result) = results.recv().await {
            assert!(result.is_err());
            errs += 1;
        }
        done.await.unwrap();

        assert_eq!(errs, 2);
    }

    #[tokio::test]
    async fn panicking_job_does_not_hang_the_pool() {
        let mut pool: WorkerPool<u64> = WorkerPool::new(2);

        let jobs: Vec<Job<u64>> = vec![
            Job::new(|| async { panic!("job blew up") }),
            Job::new(|| async { Ok(7) }),
        ];

        let mut results = pool.results().unwrap();
        pool.submit(jobs);
        let done = pool.run(CancellationToken::new());

        // the panicking job loses its result, the other one still lands
        let mut values = Vec::new();
        while let Some(result) = results.recv().await {
            if let Ok(value) = result {
                values.push(value);
            }
        }
        done.await.unwrap();

        assert_eq!(values, vec![7]);
    }

    #[tokio::test]
    async fn done_resolves_only_after_all_workers_exit() {
        let mut pool: WorkerPool<()> = WorkerPool::new(4);

        let jobs: Vec<Job<()>> = (0..4)
            .map(|_| {
                Job::new(|| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(())
                })
            })
            .collect();

        let mut results = pool.results().unwrap();
        pool.submit(jobs);
        let done = pool.run(CancellationToken::new());

        // results are still in flight, done must not have resolved yet
        assert!(!done.is_finished());

        let mut count = 0;
        while let Some(result) = results.recv().await {
            result.unwrap();
            count += 1;
        }
        done.await.unwrap();
        assert_eq!(count, 4);
    }
}
