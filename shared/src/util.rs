/// Current UTC timestamp in milliseconds.
///
/// All persisted timestamps (entity `created_at`/`updated_at`, ledger
/// `committed_at`, sync checkpoints) use this representation.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
