/// CPF check-digit validation (Brazilian individual tax id).
///
/// Accepts the number with or without punctuation; only digits are
/// considered. Eleven digits, two mod-11 verifier digits, repdigit
/// sequences rejected.
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }

    // "111.111.111-11" and friends pass the checksum but are not CPFs
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    digits[9] == verifier_digit(&digits[..9]) && digits[10] == verifier_digit(&digits[..10])
}

fn verifier_digit(digits: &[u32]) -> u32 {
    let weight_start = (digits.len() + 1) as u32;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (weight_start - i as u32))
        .sum();
    (sum * 10) % 11 % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_valid_numbers() {
        assert!(is_valid_cpf("39053344705"));
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("529.982.247-25"));
    }

    #[test]
    fn rejects_bad_check_digits() {
        assert!(!is_valid_cpf("39053344704"));
        assert!(!is_valid_cpf("52998224726"));
    }

    #[test]
    fn rejects_repdigits_and_wrong_length() {
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("00000000000"));
        assert!(!is_valid_cpf("1234567890"));
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("not a number"));
    }
}
