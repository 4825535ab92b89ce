//! Diesel schema for run and execution log persistence.

diesel::table! {
    /// One row per execution attempt.
    runs (id) {
        /// Run identifier.
        id -> Uuid,
        /// Workflow the run belongs to.
        workflow_id -> Uuid,
        /// Executed task.
        task_id -> Uuid,
        /// Run lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Start timestamp.
        started_at -> Timestamptz,
        /// Terminal timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Elapsed milliseconds.
        duration_ms -> Nullable<Int8>,
        /// Failure message.
        error -> Nullable<Text>,
    }
}

diesel::table! {
    /// Append-only run log.
    execution_logs (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Insertion counter used to order equal timestamps.
        sequence -> Int8,
        /// Owning run.
        run_id -> Uuid,
        /// Severity.
        #[max_length = 20]
        level -> Varchar,
        /// Human-readable message.
        message -> Text,
        /// Structured payload.
        data -> Jsonb,
        /// Creation timestamp.
        timestamp -> Timestamptz,
    }
}
