// Application layer
// Opens one unit of work per top-level operation

pub mod member_service;

pub use member_service::MemberService;
