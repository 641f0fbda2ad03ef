mod common;

mod lock_out;
