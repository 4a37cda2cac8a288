pub mod restaurants_list;
pub mod reviews_list;
