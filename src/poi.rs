pub mod record;
pub mod remote;
pub mod source;
