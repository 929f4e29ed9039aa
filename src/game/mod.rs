pub mod constants;
pub mod input_buffer;
pub mod match_result;
pub mod possession;
pub mod session;
pub mod side_change;
pub mod tracked_object;
