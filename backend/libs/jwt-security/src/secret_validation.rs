//! Shared-secret strength checks
//!
//! The HS256 secret is the only thing standing between a forged token and a
//! superuser session, so services refuse to start with a weak one.

const MIN_SECRET_LENGTH: usize = 32;
const RECOMMENDED_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS: f64 = 4.0;
const STRONG_ENTROPY_BITS: f64 = 5.0;
/// Floor for hex text, whose alphabet caps entropy at 4 bits/char
const MIN_HEX_ENTROPY_BITS: f64 = 3.0;
const MAX_RUN: usize = 4;
const REPEAT_BLOCK: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    /// Refused at startup
    Weak,
    /// Accepted with a warning
    Acceptable,
    Strong,
}

/// Classify a signing secret.
///
/// Any 8-byte block that occurs twice makes a secret weak. A hex secret is
/// sized by its decoded bytes (32 minimum, 64 for strong) and only needs
/// 3 bits/char. Anything else is weak below 32 bytes or 4 bits/byte, and a
/// minimum-length secret also may not hold a run of 4 identical or
/// ascending bytes. Strong needs 64 bytes and 5 bits/byte.
pub fn validate_secret_strength(secret: &str) -> SecretStrength {
    let bytes = secret.as_bytes();

    if has_repeated_block(bytes) {
        return SecretStrength::Weak;
    }

    if let Ok(decoded) = hex::decode(secret) {
        return classify_hex(bytes, decoded.len());
    }

    if bytes.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }

    let entropy = shannon_entropy(bytes);
    if entropy < MIN_ENTROPY_BITS {
        return SecretStrength::Weak;
    }
    if bytes.len() == MIN_SECRET_LENGTH && has_runs(bytes) {
        return SecretStrength::Weak;
    }

    if bytes.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= STRONG_ENTROPY_BITS {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

fn classify_hex(text: &[u8], key_len: usize) -> SecretStrength {
    if key_len < MIN_SECRET_LENGTH || shannon_entropy(text) < MIN_HEX_ENTROPY_BITS {
        SecretStrength::Weak
    } else if key_len >= RECOMMENDED_SECRET_LENGTH {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte, 0..=8
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    for &b in data {
        freq[b as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}

fn has_runs(data: &[u8]) -> bool {
    let mut same = 1;
    let mut ascending = 1;

    for w in data.windows(2) {
        same = if w[0] == w[1] { same + 1 } else { 1 };
        ascending = if w[1] as i16 - w[0] as i16 == 1 {
            ascending + 1
        } else {
            1
        };

        if same >= MAX_RUN || ascending >= MAX_RUN {
            return true;
        }
    }

    false
}

fn has_repeated_block(data: &[u8]) -> bool {
    let mut seen = std::collections::HashSet::new();
    data.windows(REPEAT_BLOCK).any(|block| !seen.insert(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_secret_is_weak() {
        assert_eq!(validate_secret_strength("short"), SecretStrength::Weak);
    }

    #[test]
    fn test_low_entropy_is_weak() {
        assert_eq!(
            validate_secret_strength(&"ab".repeat(20)),
            SecretStrength::Weak
        );
    }

    #[test]
    fn test_alphabet_run_is_weak() {
        assert_eq!(
            validate_secret_strength("abcdefghijklmnopqrstuvwxyzabcdef"),
            SecretStrength::Weak
        );
    }

    #[test]
    fn test_medium_secret_is_acceptable() {
        assert_eq!(
            validate_secret_strength("Zq8#Lm2!Rv7pWx4$Tn9@Kd3^Hs6&Jf1*Bg5("),
            SecretStrength::Acceptable
        );
    }

    #[test]
    fn test_long_random_secret_is_strong() {
        let strong = "y9K$mP2vRx#TnZ@s4Yw!cGf7Dh&e3Xa6Wq8Lj5BtNu1Zp0MkYhVgCxFbAsSdQwEr";
        assert_eq!(validate_secret_strength(strong), SecretStrength::Strong);
    }

    #[test]
    fn test_random_hex_secret_is_accepted() {
        // openssl rand -hex 32; contains the ascending run "0123"
        let secret = "ef679855493101230998d85eeb13383d004f66ea232d7c5d1c493a14d8ab1301";
        assert_eq!(secret.len(), 64);
        assert_eq!(validate_secret_strength(secret), SecretStrength::Acceptable);
    }

    #[test]
    fn test_long_hex_secret_is_strong() {
        let secret = "5BAC5A4203FDECE9BA9D7A018AB37A5E535374F5C5DEED946635E10AC3023AF2\
                      12CF06DEF4668D154FD236526954573A62184D73282B95BD6A9027B03F0C6305";
        assert_eq!(secret.len(), 128);
        assert_eq!(validate_secret_strength(secret), SecretStrength::Strong);
    }

    #[test]
    fn test_short_or_patterned_hex_is_weak() {
        // 16 decoded bytes
        assert_eq!(
            validate_secret_strength("cd679d98e5d9451c8324180c7c48b66b"),
            SecretStrength::Weak
        );
        assert_eq!(
            validate_secret_strength(&"ab".repeat(32)),
            SecretStrength::Weak
        );
        assert_eq!(
            validate_secret_strength(&"0123456789abcdef".repeat(4)),
            SecretStrength::Weak
        );
    }

    #[test]
    fn test_runs_only_matter_at_minimum_length() {
        let secret = "Zq8#Lm2!Rv7pWx4$Tn9@Kd3^Hs6&Jf1*Bg5(6789";
        assert!(has_runs(secret.as_bytes()));
        assert_eq!(validate_secret_strength(secret), SecretStrength::Acceptable);
    }

    #[test]
    fn test_repeated_block() {
        assert!(has_repeated_block(b"Kd3^Hs6&..Kd3^Hs6&"));
        assert!(!has_repeated_block(b"Zq8#Lm2!Rv7pWx4$"));
    }

    #[test]
    fn test_entropy_bounds() {
        assert!(shannon_entropy(&[b'x'; 50]) < 0.1);
        let all: Vec<u8> = (0..=255).collect();
        assert!(shannon_entropy(&all) > 7.5);
    }

    #[test]
    fn test_runs() {
        assert!(has_runs(b"xx1111yy"));
        assert!(has_runs(b"--6789--"));
        assert!(!has_runs(b"aZ3$bY4%"));
    }
}
