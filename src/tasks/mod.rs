pub mod result_poll;
