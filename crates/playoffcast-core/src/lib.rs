// Library root: the league data model, boundary validation, and the live
// event plumbing shared by the probability engine and the service.

pub mod feed;
pub mod history;
pub mod model;
pub mod protocol;
pub mod validation;
