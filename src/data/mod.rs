pub mod extent;
pub mod sample;
pub mod scan_buffer;
pub mod scan_state;
pub mod z_range;
