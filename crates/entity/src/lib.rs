pub mod category;
pub mod criterion;
pub mod criterion_category;
pub mod product;
pub mod review;
pub mod review_rating;
pub mod role;
pub mod user;
pub mod user_role;
