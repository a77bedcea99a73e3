pub mod contour_file;
pub mod db;
pub mod session_data;
pub mod store;
