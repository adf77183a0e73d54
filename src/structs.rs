pub mod model;
pub mod quiz_type;
pub mod report;
pub mod respond;
pub mod submit;
