pub mod identification;
pub mod instance_list;
