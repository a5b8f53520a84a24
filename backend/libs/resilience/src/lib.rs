/// Deadlines for outbound calls
///
/// Every remote call made while serving a request is bounded. A call that
/// outlives its deadline is reported as [`TimeoutError::Elapsed`], which
/// callers treat the same as the dependency being unreachable.
///
/// # Example
///
/// ```rust,no_run
/// use resilience::{presets, with_deadline};
///
/// #[tokio::main]
/// async fn main() {
///     let deadlines = presets::Deadlines::default();
///
///     let result = with_deadline(deadlines.authz_check, async {
///         Ok::<_, String>(true)
///     })
///     .await;
/// }
/// ```
pub mod presets;
pub mod timeout;

pub use presets::Deadlines;
pub use timeout::{with_deadline, TimeoutError};
