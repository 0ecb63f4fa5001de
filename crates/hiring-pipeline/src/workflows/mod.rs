pub mod hiring;
