pub mod files_controller;
pub mod health_controller;
pub mod index_controller;
pub mod stats_controller;

pub use files_controller::{
    get_file_data, get_file_headers, get_file_rows, get_files_list, upload_file, UPLOAD_FIELD,
};
pub use health_controller::health_handler;
pub use index_controller::index_handler;
pub use stats_controller::get_files_stat;
