//! Diesel table declarations, kept by hand in step with `migrations/`.

diesel::table! {
    workflow_snapshots (uuid) {
        uuid -> Uuid,
        name -> Text,
        service_index -> Integer,
        definition_hash -> Nullable<Text>,
        resumable -> Bool,
        saved_at -> Timestamptz,
        payload -> Jsonb,
    }
}
