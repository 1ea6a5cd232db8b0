//! External collaborators
//!
//! Everything this service reads but does not own goes through a trait defined here, so
//! routes and services can be exercised against in-memory implementations.
//!
//! ## Usage in Routes
//!
//! ```ignore
//! pub async fn aggregate(
//!     index: web::Data<Arc<dyn AnswerIndex>>,
//! ) -> Result<impl Responder> {
//!     services::aggregation::aggregate_by_field_code(index.as_ref().as_ref(), &query).await?;
//! }
//! ```

pub mod answer_index;
pub mod errors;

pub use answer_index::{AnswerIndex, AnswerQuery, MonthBucket, PgAnswerIndex, TermBucket};
pub use errors::ConnectorError;
