use crate::structs::report::ReportAction;

/// Reporting collaborator the session hands its rows to.
///
/// Implementations must return immediately and swallow their own failures,
/// the in-memory session stays the source of truth.
pub trait Reporter: Send + Sync {
    fn report(&self, action: ReportAction);
}
