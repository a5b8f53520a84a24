//! Course-scoped authorization: the remote access checks, their cached
//! decorator, and the gatekeeper that turns a capability into a decision.

pub mod cached;
pub mod course_access;
pub mod gatekeeper;

pub use cached::CachedCourseAccess;
pub use course_access::{AccessError, CourseAccess, GrpcCourseAccess};
pub use gatekeeper::{Capability, Gatekeeper};
