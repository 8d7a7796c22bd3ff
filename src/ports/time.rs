use time::OffsetDateTime;

/// Source of server-assigned timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}
