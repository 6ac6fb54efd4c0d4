pub mod issue;
pub mod issue_type;
pub mod status;
pub mod search;

pub use issue::*;
pub use issue_type::*;
pub use status::*;
pub use search::*;
