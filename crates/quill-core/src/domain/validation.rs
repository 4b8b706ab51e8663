//! Input policies shared by signup, credential edits and content writes.
//!
//! Each check appends to a [`ValidationErrors`] so callers can report every
//! violated field at once.

use crate::error::ValidationErrors;

/// Symbols a password may (and must, at least once) contain.
pub const PASSWORD_SYMBOLS: &str = "@$!%*#?&";

const USERNAME_EXTRA_CHARS: &str = "-_@";
const EMAIL_MAX_CHARS: usize = 255;

pub const PASSWORD_POLICY_MESSAGE: &str = "비밀번호는 8자리~32자리, 한개 이상의 숫자/알파벳/특수문자(@,$,!,%,*,#,?,&)로 이루어져야합니다.";
pub const USERNAME_POLICY_MESSAGE: &str = "길이 6자리 ~32자리, 알파벳으로 시작하고 알파벳 대소문자와 숫자, 특수기호 -,_,@ 로 이루어져야합니다.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "두 비밀번호가 일치하지 않습니다.";

/// 8–32 chars drawn from letters, digits and [`PASSWORD_SYMBOLS`], with at
/// least one of each class.
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    if !(8..=32).contains(&len) {
        return false;
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c);
    password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// 6–32 chars, leading ASCII letter, then alphanumerics or `-_@`.
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    if !(6..=32).contains(&len) {
        return false;
    }

    let mut chars = username.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || USERNAME_EXTRA_CHARS.contains(c))
}

/// Minimal structural check: one `@` with a non-empty local part and domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().count() > EMAIL_MAX_CHARS || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

pub fn check_username(errors: &mut ValidationErrors, username: &str) {
    if !is_valid_username(username) {
        errors.add("username", USERNAME_POLICY_MESSAGE);
    }
}

pub fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !is_valid_email(email) {
        errors.add("email", "유효한 이메일 주소를 입력하세요.");
    }
}

/// Confirmation must match before the policy is even considered.
pub fn check_new_password(
    errors: &mut ValidationErrors,
    field: &str,
    password: &str,
    confirmation: &str,
) {
    if password != confirmation {
        errors.add(field, PASSWORD_MISMATCH_MESSAGE);
    } else if !is_valid_password(password) {
        errors.add(field, PASSWORD_POLICY_MESSAGE);
    }
}

/// Required text bounded to `max_chars`. Oversize input is rejected, never truncated.
pub fn check_bounded_text(errors: &mut ValidationErrors, field: &str, value: &str, max_chars: usize) {
    if value.trim().is_empty() {
        errors.add(field, "이 필드는 필수 항목입니다.");
    } else if value.chars().count() > max_chars {
        errors.add(
            field,
            format!("이 필드의 글자 수가 {max_chars} 이하인지 확인하십시오."),
        );
    }
}

pub fn check_required_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "이 필드는 필수 항목입니다.");
    }
}
