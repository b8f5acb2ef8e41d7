pub mod hash_ip;
pub mod jwt;
