//! Diesel schema for task and workflow persistence.

diesel::table! {
    /// Task records owned by the CRUD layer.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project identifier.
        project_id -> Uuid,
        /// Task title.
        #[max_length = 500]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Task lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Attached workflow identifier.
        workflow_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Workflows lazily created for executed tasks.
    workflows (id) {
        /// Workflow identifier.
        id -> Uuid,
        /// Owning project identifier.
        project_id -> Uuid,
        /// Placeholder step definitions.
        steps -> Jsonb,
        /// Workflow status.
        #[max_length = 50]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
