use chrono::{DateTime, Utc};

/// Per-job duration used for the ETA.
///
/// The running mean of finished jobs wins once at least one job succeeded.
/// Before that, the mean of the caller-supplied `estimated_duration_ms`
/// values is used (zeros are ignored). `None` when neither is available.
pub fn per_job_estimate_ms(average_ms: f64, job_estimates_ms: &[u64]) -> Option<f64> {
    if average_ms > 0.0 {
        return Some(average_ms);
    }

    let (sum, count) = job_estimates_ms
        .iter()
        .filter(|&&ms| ms > 0)
        .fold((0u64, 0u64), |(sum, count), &ms| (sum + ms, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Remaining time for `remaining_jobs` jobs in milliseconds.
pub fn estimate_remaining_ms(
    remaining_jobs: usize,
    average_ms: f64,
    job_estimates_ms: &[u64],
) -> Option<f64> {
    if remaining_jobs == 0 {
        return Some(0.0);
    }
    per_job_estimate_ms(average_ms, job_estimates_ms).map(|per_job| per_job * remaining_jobs as f64)
}

/// `now + remaining_jobs * per-job estimate`.
///
/// Returns `None` when nothing is left to estimate or no timing data exists.
pub fn estimate_completion(
    now: DateTime<Utc>,
    remaining_jobs: usize,
    average_ms: f64,
    job_estimates_ms: &[u64],
) -> Option<DateTime<Utc>> {
    if remaining_jobs == 0 {
        return None;
    }
    let remaining_ms = estimate_remaining_ms(remaining_jobs, average_ms, job_estimates_ms)?;
    Some(now + chrono::Duration::milliseconds(remaining_ms.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_takes_priority() {
        assert_eq!(per_job_estimate_ms(1500.0, &[100, 200]), Some(1500.0));
    }

    #[test]
    fn test_fallback_to_job_estimates() {
        // Zero estimates are ignored
        assert_eq!(per_job_estimate_ms(0.0, &[1000, 0, 3000]), Some(2000.0));
    }

    #[test]
    fn test_no_data_returns_none() {
        assert_eq!(per_job_estimate_ms(0.0, &[]), None);
        assert_eq!(per_job_estimate_ms(0.0, &[0, 0]), None);
        assert_eq!(estimate_remaining_ms(3, 0.0, &[]), None);
    }

    #[test]
    fn test_estimate_remaining() {
        assert_eq!(estimate_remaining_ms(4, 250.0, &[]), Some(1000.0));
        assert_eq!(estimate_remaining_ms(0, 0.0, &[]), Some(0.0));
    }

    #[test]
    fn test_estimate_completion() {
        let now = Utc::now();
        let eta = estimate_completion(now, 3, 1000.0, &[]).unwrap();
        assert_eq!((eta - now).num_milliseconds(), 3000);

        assert!(estimate_completion(now, 0, 1000.0, &[]).is_none());
        assert!(estimate_completion(now, 2, 0.0, &[]).is_none());
    }
}
