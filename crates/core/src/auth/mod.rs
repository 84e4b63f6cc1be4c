//! Authentication: password hashing and credential rules.

mod password;

pub use password::{PasswordError, hash_password, verify_against_dummy, verify_password};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Canonical form of a login name: trimmed and lower-cased.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Checks registration fields, returning the first problem found.
pub fn validate_registration(
    username: &str,
    password: &str,
    name: &str,
    phone: &str,
) -> Result<(), String> {
    let username = normalize_username(username);
    if username.is_empty() || name.trim().is_empty() || phone.trim().is_empty() {
        return Err("username, password, name and phone are required".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err("username may only contain letters, digits, '.', '_' and '-'".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Demo.User "), "demo.user");
    }

    #[rstest]
    #[case("demo", "secret1", "Demo", "555", true)]
    #[case("", "secret1", "Demo", "555", false)]
    #[case("demo", "secret1", " ", "555", false)]
    #[case("demo", "secret1", "Demo", "", false)]
    #[case("demo", "short", "Demo", "555", false)]
    #[case("de mo", "secret1", "Demo", "555", false)]
    fn test_validate_registration(
        #[case] username: &str,
        #[case] password: &str,
        #[case] name: &str,
        #[case] phone: &str,
        #[case] ok: bool,
    ) {
        assert_eq!(
            validate_registration(username, password, name, phone).is_ok(),
            ok
        );
    }
}
