//! The Subject Catalog (§4.M): the fixed namespace of pub-sub subjects the
//! rest of the data plane publishes and subscribes on, plus the queue-group
//! names consumers join for load-balanced delivery.

/// Subject name constants and helpers.
pub mod subjects {
    /// Search jobs awaiting a plain query.
    pub const SEARCH_JOBS_QUERY: &str = "search.jobs.query";
    /// Search jobs awaiting correlation.
    pub const SEARCH_JOBS_CORRELATE: &str = "search.jobs.correlate";
    /// Base subject for query results; results for a specific job are
    /// published to [`search_results_query`].
    pub const SEARCH_RESULTS_QUERY_BASE: &str = "search.results.query";
    /// Correlation results.
    pub const SEARCH_RESULTS_CORRELATE: &str = "search.results.correlate";
    /// New alerts raised by the response subsystem.
    pub const RESPOND_ALERTS_CREATED: &str = "respond.alerts.created";
    /// Alert state transitions.
    pub const RESPOND_ALERTS_UPDATED: &str = "respond.alerts.updated";
    /// New cases.
    pub const RESPOND_CASES_CREATED: &str = "respond.cases.created";
    /// Case field changes.
    pub const RESPOND_CASES_UPDATED: &str = "respond.cases.updated";
    /// Case assignment changes.
    pub const RESPOND_CASES_ASSIGNED: &str = "respond.cases.assigned";

    /// Per-job-id subject for query results, e.g. `search.results.query.<job_id>`.
    pub fn search_results_query(job_id: &str) -> String {
        format!("{SEARCH_RESULTS_QUERY_BASE}.{job_id}")
    }

    /// DLQ subject for a given failure reason, e.g. `ingest.dlq.no_normalizer`.
    pub fn dlq(reason: &str) -> String {
        format!("ingest.dlq.{reason}")
    }
}

/// Queue-group name constants.
///
/// A queue group load-balances delivery across its members: only one
/// subscriber in the group receives each message, instead of every
/// subscriber receiving every message.
pub mod queue_groups {
    /// Workers consuming search jobs.
    pub const SEARCH_WORKERS: &str = "search-workers";
    /// Workers consuming response (alert/case) events.
    pub const RESPOND_WORKERS: &str = "respond-workers";
    /// Web-tier instances sharing subscriptions across replicas.
    pub const WEB_WORKERS: &str = "web-workers";
}

#[cfg(test)]
mod tests {
    use super::subjects;

    #[test]
    fn per_job_subject_is_suffixed() {
        assert_eq!(subjects::search_results_query("abc123"), "search.results.query.abc123");
    }

    #[test]
    fn dlq_subject_is_namespaced_by_reason() {
        assert_eq!(subjects::dlq("no_normalizer"), "ingest.dlq.no_normalizer");
    }
}
