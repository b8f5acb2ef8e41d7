use sha2::{Digest, Sha256};

/// Hash a visitor IP address for privacy-preserving storage
pub fn hash_ip(ip: &str, salt: &str) -> String {
    // Salted so the digest can't be reversed with a precomputed table
    let salted_ip = format!("{}{}", ip, salt);

    let mut hasher = Sha256::new();
    hasher.update(salted_ip.as_bytes());
    let result = hasher.finalize();

    format!("{:x}", result)
}
